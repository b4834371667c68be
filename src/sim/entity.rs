//! Simulation entities
//!
//! One parameterized `Entity` type covers every object in a level. What an
//! entity *is* lives in its `Role`, a closed tagged variant carrying the
//! per-category data; kinds coming from generated content map onto closed
//! enums with an `Unknown` fallback instead of free-form strings.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::ability::AbilitySet;
use super::behavior::BehaviorController;
use super::effects::{EffectKind, EffectSet};
use crate::sanitize_dt;

/// Which side an entity fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
    Neutral,
}

/// Normalize a kind string from generated content ("Rock_Golem " -> "rock_golem")
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Enemy archetypes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Patrols, chases when the player comes close
    Basic,
    /// Wide detection, fast chase
    Aggressive,
    /// Quick patrol, short detection
    Fast,
    /// Keeps distance and fires projectiles
    Ranged,
    /// Unrecognized kind from generated content
    Unknown(String),
}

impl EnemyKind {
    pub fn from_tag(raw: &str) -> Self {
        match normalize_tag(raw).as_str() {
            "basic" | "" => EnemyKind::Basic,
            "aggressive" | "chaser" => EnemyKind::Aggressive,
            "fast" => EnemyKind::Fast,
            "ranged" | "shooter" | "turret" => EnemyKind::Ranged,
            other => EnemyKind::Unknown(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            EnemyKind::Basic => "basic",
            EnemyKind::Aggressive => "aggressive",
            EnemyKind::Fast => "fast",
            EnemyKind::Ranged => "ranged",
            EnemyKind::Unknown(tag) => tag,
        }
    }
}

/// Static level geometry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Wall,
    Rock,
    /// Non-solid, slows whatever wades through
    Water,
    /// Non-solid, burns whatever stands in it
    Lava,
    Unknown(String),
}

impl ObstacleKind {
    pub fn from_tag(raw: &str) -> Self {
        match normalize_tag(raw).as_str() {
            "wall" | "" => ObstacleKind::Wall,
            "rock" | "boulder" => ObstacleKind::Rock,
            "water" => ObstacleKind::Water,
            "lava" => ObstacleKind::Lava,
            other => ObstacleKind::Unknown(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            ObstacleKind::Wall => "wall",
            ObstacleKind::Rock => "rock",
            ObstacleKind::Water => "water",
            ObstacleKind::Lava => "lava",
            ObstacleKind::Unknown(tag) => tag,
        }
    }

    /// Whether movers are pushed out of this obstacle
    pub fn is_solid(&self) -> bool {
        matches!(self, ObstacleKind::Wall | ObstacleKind::Rock)
    }
}

/// Pickup types (power-ups and objective collectibles)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Health,
    Speed,
    Score,
    Shield,
    Energy,
    Coin,
    Gem,
    Key,
    Star,
    Unknown(String),
}

impl PickupKind {
    pub fn from_tag(raw: &str) -> Self {
        match normalize_tag(raw).as_str() {
            "health" | "heal" => PickupKind::Health,
            "speed" => PickupKind::Speed,
            "score" | "points" => PickupKind::Score,
            "shield" => PickupKind::Shield,
            "energy" | "stamina" => PickupKind::Energy,
            "coin" | "coins" | "" => PickupKind::Coin,
            "gem" | "gems" => PickupKind::Gem,
            "key" | "keys" => PickupKind::Key,
            "star" | "stars" => PickupKind::Star,
            other => PickupKind::Unknown(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            PickupKind::Health => "health",
            PickupKind::Speed => "speed",
            PickupKind::Score => "score",
            PickupKind::Shield => "shield",
            PickupKind::Energy => "energy",
            PickupKind::Coin => "coin",
            PickupKind::Gem => "gem",
            PickupKind::Key => "key",
            PickupKind::Star => "star",
            PickupKind::Unknown(tag) => tag,
        }
    }

    /// Collectibles exist to be counted; power-ups exist to be used
    pub fn is_collectible(&self) -> bool {
        matches!(
            self,
            PickupKind::Coin
                | PickupKind::Gem
                | PickupKind::Key
                | PickupKind::Star
                | PickupKind::Unknown(_)
        )
    }
}

/// Player-only data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub abilities: AbilitySet,
    /// Last non-zero movement direction (throw direction fallback)
    pub facing: Vec2,
    /// Standing on something this frame (platformer mode)
    pub grounded: bool,
    /// Seconds until enemy contact can hurt again
    pub contact_grace: f32,
}

/// Enemy-only data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyState {
    pub kind: EnemyKind,
    /// `None` for stationary placeholders
    pub behavior: Option<BehaviorController>,
    pub contact_damage: f32,
    /// Score awarded when defeated
    pub score_value: u64,
}

/// A thrown object or enemy shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: u32,
    pub damage: f32,
    pub tag: Option<String>,
}

/// Short-lived area attack marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEffect {
    pub owner: u32,
    pub damage: f32,
    pub stun_secs: f32,
    pub tag: Option<String>,
    /// Targets already hit (each target is hit at most once)
    pub hits: Vec<u32>,
}

/// What an entity is, with the data that category needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Player(Box<PlayerState>),
    Enemy(EnemyState),
    Projectile(Projectile),
    Pickup(PickupKind),
    Obstacle(ObstacleKind),
    AreaEffect(AreaEffect),
}

/// Result of a damage attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Dead, invulnerable, indestructible, or a non-positive amount
    Ignored,
    Damaged { dealt: f32 },
    /// This hit brought health to zero; reported exactly once per entity
    Killed { dealt: f32 },
}

/// A simulated object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub aabb: Aabb,
    pub vel: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub team: Team,
    pub role: Role,
    pub effects: EffectSet,
    /// Base movement speed (pixels/s)
    pub speed: f32,
    /// Seconds until self-removal; `None` lives until killed
    pub lifetime: Option<f32>,
}

impl Entity {
    pub fn new(id: u32, aabb: Aabb, team: Team, role: Role, max_health: f32) -> Self {
        let max_health = if max_health.is_finite() {
            max_health.max(0.0)
        } else {
            0.0
        };
        Self {
            id,
            aabb,
            vel: Vec2::ZERO,
            health: max_health,
            max_health,
            alive: true,
            team,
            role,
            effects: EffectSet::new(),
            speed: 0.0,
            lifetime: None,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(0.0);
        self
    }

    pub fn with_lifetime(mut self, secs: f32) -> Self {
        self.lifetime = Some(secs);
        self
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.aabb.center()
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.effects.has(EffectKind::Invulnerable)
    }

    #[inline]
    pub fn is_cloaked(&self) -> bool {
        self.effects.has(EffectKind::Cloak)
    }

    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.effects.has(EffectKind::Stun)
    }

    /// Whether enemy AI can see this entity
    pub fn is_detectable(&self) -> bool {
        self.alive && !self.is_cloaked() && !self.is_invulnerable()
    }

    /// Movement speed after status effects
    pub fn effective_speed(&self) -> f32 {
        if self.is_stunned() {
            0.0
        } else {
            self.speed * self.effects.speed_factor()
        }
    }

    /// Subtract health unless dead or invulnerable.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.alive
            || self.max_health <= 0.0
            || self.is_invulnerable()
            || !(amount.is_finite() && amount > 0.0)
        {
            return DamageOutcome::Ignored;
        }

        let dealt = amount.min(self.health);
        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            DamageOutcome::Killed { dealt }
        } else {
            DamageOutcome::Damaged { dealt }
        }
    }

    /// Restore health up to max. The dead stay dead.
    pub fn heal(&mut self, amount: f32) {
        if self.alive && amount.is_finite() && amount > 0.0 {
            self.health = (self.health + amount).min(self.max_health);
        }
    }

    /// Count down the lifetime; true once it has run out
    pub fn tick_lifetime(&mut self, dt: f32) -> bool {
        match &mut self.lifetime {
            Some(left) => {
                *left -= sanitize_dt(dt);
                *left <= 0.0
            }
            None => false,
        }
    }

    /// Repair simulation invariants.
    ///
    /// Health is clamped to `[0, max_health]`. Returns false when the entity
    /// is too corrupt to keep (non-finite position or velocity).
    pub fn enforce_invariants(&mut self) -> bool {
        if !self.max_health.is_finite() || self.max_health < 0.0 {
            self.max_health = 0.0;
        }
        if !self.health.is_finite() {
            self.health = 0.0;
        }
        self.health = self.health.clamp(0.0, self.max_health);
        if self.health <= 0.0 && self.max_health > 0.0 {
            self.alive = false;
        }

        self.aabb.is_finite() && self.vel.is_finite()
    }

    pub fn is_player(&self) -> bool {
        matches!(self.role, Role::Player(_))
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.role, Role::Enemy(_))
    }

    /// Solid static geometry that movers get pushed out of
    pub fn is_solid(&self) -> bool {
        matches!(&self.role, Role::Obstacle(kind) if kind.is_solid())
    }

    pub fn player_state(&self) -> Option<&PlayerState> {
        match &self.role {
            Role::Player(p) => Some(&**p),
            _ => None,
        }
    }

    pub fn player_state_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.role {
            Role::Player(p) => Some(&mut **p),
            _ => None,
        }
    }

    pub fn enemy_state(&self) -> Option<&EnemyState> {
        match &self.role {
            Role::Enemy(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dummy(max_health: f32) -> Entity {
        Entity::new(
            1,
            Aabb::new(0.0, 0.0, 10.0, 10.0),
            Team::Neutral,
            Role::Obstacle(ObstacleKind::Rock),
            max_health,
        )
    }

    #[test]
    fn test_three_hits_then_death_fires_once() {
        let mut e = dummy(100.0);
        for _ in 0..3 {
            assert!(matches!(e.take_damage(30.0), DamageOutcome::Damaged { .. }));
        }
        assert_eq!(e.health, 10.0);
        assert!(e.alive);

        assert_eq!(e.take_damage(30.0), DamageOutcome::Killed { dealt: 10.0 });
        assert_eq!(e.health, 0.0);
        assert!(!e.alive);

        // Dead entities ignore further hits: no second death
        assert_eq!(e.take_damage(30.0), DamageOutcome::Ignored);
    }

    #[test]
    fn test_invulnerable_ignores_damage() {
        let mut e = dummy(50.0);
        e.effects.apply(EffectKind::Invulnerable, 1.0, 1.0);
        assert_eq!(e.take_damage(20.0), DamageOutcome::Ignored);
        assert_eq!(e.health, 50.0);
    }

    #[test]
    fn test_heal_clamps_and_skips_dead() {
        let mut e = dummy(100.0);
        e.take_damage(10.0);
        e.heal(50.0);
        assert_eq!(e.health, 100.0);

        e.take_damage(200.0);
        e.heal(50.0);
        assert_eq!(e.health, 0.0);
    }

    #[test]
    fn test_cloak_and_invulnerability_hide_from_detection() {
        let mut e = dummy(10.0);
        assert!(e.is_detectable());
        e.effects.apply(EffectKind::Cloak, 1.0, 1.0);
        assert!(!e.is_detectable());
        e.effects.clear();
        e.effects.apply(EffectKind::Invulnerable, 1.0, 1.0);
        assert!(!e.is_detectable());
    }

    #[test]
    fn test_stun_zeroes_speed() {
        let mut e = dummy(10.0).with_speed(100.0);
        e.effects.apply(EffectKind::SpeedMultiplier, 1.0, 1.5);
        assert_eq!(e.effective_speed(), 150.0);
        e.effects.apply(EffectKind::Stun, 1.0, 1.0);
        assert_eq!(e.effective_speed(), 0.0);
    }

    #[test]
    fn test_non_finite_position_is_rejected() {
        let mut e = dummy(10.0);
        e.aabb.pos.x = f32::NAN;
        assert!(!e.enforce_invariants());
    }

    #[test]
    fn test_kind_tags_round_trip_unknowns() {
        assert_eq!(EnemyKind::from_tag(" Aggressive"), EnemyKind::Aggressive);
        assert_eq!(
            EnemyKind::from_tag("Rock Golem"),
            EnemyKind::Unknown("rock_golem".into())
        );
        assert_eq!(EnemyKind::from_tag("Rock Golem").tag(), "rock_golem");
        assert!(!ObstacleKind::from_tag("water").is_solid());
        assert!(ObstacleKind::from_tag("WALL").is_solid());
        assert!(!ObstacleKind::from_tag("crystal").is_solid());
        assert_eq!(PickupKind::from_tag("coins"), PickupKind::Coin);
        assert!(PickupKind::from_tag("feather").is_collectible());
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_bounds(max in 1.0f32..500.0, ops in prop::collection::vec((any::<bool>(), -50.0f32..200.0), 0..40)) {
            let mut e = dummy(max);
            for (is_damage, amount) in ops {
                if is_damage {
                    e.take_damage(amount);
                } else {
                    e.heal(amount);
                }
                prop_assert!(e.health >= 0.0 && e.health <= e.max_health);
            }
        }
    }
}
