//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod aabb;
pub mod ability;
pub mod behavior;
pub mod collision;
pub mod combat;
pub mod effects;
pub mod entity;
pub mod objective;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;

pub use aabb::Aabb;
pub use ability::{AbilityKind, AbilitySet, AbilitySpec, ActivationError, ResourcePool};
pub use behavior::{BehaviorController, BehaviorMode, PatrolMode, PatrolPath};
pub use combat::{DamageTable, Matchup};
pub use effects::{EffectKind, EffectSet};
pub use entity::{DamageOutcome, EnemyKind, Entity, ObstacleKind, PickupKind, Role, Team};
pub use objective::{Objective, ObjectiveKind, ObjectiveTracker};
pub use snapshot::{RenderSnapshot, snapshot};
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickInput, activate_ability, tick};
