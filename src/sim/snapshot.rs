//! Read-only view of a session for presentation layers
//!
//! A snapshot copies out what a renderer or HUD needs each frame, so the
//! outer layer never holds references into `GameState`.

use serde::Serialize;

use super::aabb::Aabb;
use super::behavior::BehaviorMode;
use super::effects::EffectKind;
use super::entity::{Entity, Role, Team};
use super::state::{GamePhase, GameState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: u32,
    pub aabb: Aabb,
    /// Category and kind, e.g. `enemy:basic` or `pickup:gem`
    pub kind: String,
    pub team: Team,
    pub alive: bool,
    pub health: f32,
    pub max_health: f32,
    pub effects: Vec<EffectKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<BehaviorMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveView {
    pub description: String,
    pub current: u32,
    pub required: u32,
    pub satisfied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AbilityView {
    pub ready: bool,
    pub active: bool,
    pub cooldown_remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub phase: GamePhase,
    pub tick: u64,
    pub time_remaining: f32,
    pub score: u64,
    /// Ability pool level, 0 without a player
    pub resource: f32,
    pub abilities: Vec<AbilityView>,
    pub entities: Vec<EntityView>,
    pub objectives: Vec<ObjectiveView>,
}

fn kind_label(e: &Entity) -> String {
    match &e.role {
        Role::Player(_) => "player".to_string(),
        Role::Enemy(enemy) => format!("enemy:{}", enemy.kind.tag()),
        Role::Projectile(_) => "projectile".to_string(),
        Role::Pickup(kind) => format!("pickup:{}", kind.tag()),
        Role::Obstacle(kind) => format!("obstacle:{}", kind.tag()),
        Role::AreaEffect(_) => "area_effect".to_string(),
    }
}

fn entity_view(e: &Entity) -> EntityView {
    let mut effects: Vec<EffectKind> = e.effects.iter().map(|fx| fx.kind).collect();
    effects.sort_by_key(|k| *k as u8);
    EntityView {
        id: e.id,
        aabb: e.aabb,
        kind: kind_label(e),
        team: e.team,
        alive: e.alive,
        health: e.health,
        max_health: e.max_health,
        effects,
        behavior: e
            .enemy_state()
            .and_then(|s| s.behavior.as_ref())
            .map(|b| b.mode()),
    }
}

/// Copy out everything a frame needs to draw
pub fn snapshot(state: &GameState) -> RenderSnapshot {
    let player = state.player().and_then(|p| p.player_state());
    RenderSnapshot {
        phase: state.phase,
        tick: state.time_ticks,
        time_remaining: state.time_remaining,
        score: state.score,
        resource: player.map_or(0.0, |p| p.abilities.pool.current),
        abilities: player
            .map(|p| {
                p.abilities
                    .slots
                    .iter()
                    .map(|s| AbilityView {
                        ready: s.is_ready(),
                        active: s.is_active(),
                        cooldown_remaining: s.cooldown_remaining(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        entities: state.entities.iter().map(entity_view).collect(),
        objectives: state
            .objectives
            .objectives()
            .iter()
            .map(|o| ObjectiveView {
                description: o.describe(),
                current: o.current(),
                required: o.required,
                satisfied: o.is_satisfied(),
            })
            .collect(),
    }
}
