//! Entity factories
//!
//! Turns level records and ability specs into entities, with all numbers
//! coming from `Tuning`. Unknown kinds degrade to inert neutral entities.

use glam::Vec2;

use super::aabb::Aabb;
use super::ability::{AbilitySet, AbilitySpec, ResourcePool};
use super::behavior::{BehaviorController, PatrolPath};
use super::entity::{
    AreaEffect, EnemyKind, EnemyState, Entity, ObstacleKind, PickupKind, PlayerState, Projectile,
    Role, Team,
};
use crate::level::{EnemyData, ObstacleData, PickupData};
use crate::tuning::{EnemyTuning, Tuning};

/// Shortest lifetime of an area-attack marker, so it overlaps for at least a few frames
pub const MIN_AREA_LIFETIME: f32 = 0.1;

pub fn player(id: u32, spawn: Vec2, tuning: &Tuning, loadout: Vec<AbilitySpec>) -> Entity {
    let t = &tuning.player;
    let pool = ResourcePool::new(tuning.pool.max, tuning.pool.regen_per_sec);
    let state = PlayerState {
        abilities: AbilitySet::new(loadout, pool),
        facing: Vec2::X,
        grounded: false,
        contact_grace: 0.0,
    };
    Entity::new(
        id,
        Aabb::new(spawn.x, spawn.y, t.size, t.size),
        Team::Player,
        Role::Player(Box::new(state)),
        t.health,
    )
    .with_speed(t.speed)
}

pub fn enemy(id: u32, data: &EnemyData, tuning: &Tuning) -> Entity {
    let kind = EnemyKind::from_tag(&data.kind);
    let pos = Vec2::new(data.x, data.y);

    let Some(t) = tuning.enemies.get(&kind) else {
        log::warn!("Unknown enemy kind \"{}\"; spawning it as a stationary neutral", kind.tag());
        let t = EnemyTuning::default();
        let state = EnemyState {
            kind,
            behavior: None,
            contact_damage: 0.0,
            score_value: 0,
        };
        return Entity::new(
            id,
            Aabb::new(pos.x, pos.y, t.size, t.size),
            Team::Neutral,
            Role::Enemy(state),
            t.health,
        );
    };

    let waypoints = data.patrol_path.iter().map(|p| p.to_vec2()).collect();
    let behavior = BehaviorController::new(t.profile(), PatrolPath::new(waypoints, data.patrol_mode));
    let state = EnemyState {
        kind,
        behavior: Some(behavior),
        contact_damage: t.contact_damage,
        score_value: t.score_value,
    };
    Entity::new(
        id,
        Aabb::new(pos.x, pos.y, t.size, t.size),
        Team::Enemy,
        Role::Enemy(state),
        t.health,
    )
    .with_speed(t.speed)
}

pub fn obstacle(id: u32, data: &ObstacleData) -> Entity {
    let kind = ObstacleKind::from_tag(&data.kind);
    if let ObstacleKind::Unknown(tag) = &kind {
        log::warn!("Unknown obstacle kind \"{tag}\"; it will not block movement");
    }
    Entity::new(
        id,
        Aabb::new(data.x, data.y, data.width, data.height),
        Team::Neutral,
        Role::Obstacle(kind),
        0.0,
    )
}

pub fn pickup(id: u32, data: &PickupData, size: f32) -> Entity {
    Entity::new(
        id,
        Aabb::new(data.x, data.y, size, size),
        Team::Neutral,
        Role::Pickup(PickupKind::from_tag(&data.kind)),
        0.0,
    )
}

/// Parameters of a projectile launch
#[derive(Debug, Clone, PartialEq)]
pub struct Launch {
    pub owner: u32,
    pub team: Team,
    /// Center of the projectile at launch
    pub origin: Vec2,
    /// Unit direction of travel
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub size: f32,
    pub lifetime: f32,
    pub tag: Option<String>,
}

pub fn projectile(id: u32, launch: Launch) -> Entity {
    let mut e = Entity::new(
        id,
        Aabb::from_center(launch.origin, Vec2::splat(launch.size)),
        launch.team,
        Role::Projectile(Projectile {
            owner: launch.owner,
            damage: launch.damage,
            tag: launch.tag,
        }),
        0.0,
    )
    .with_speed(launch.speed)
    .with_lifetime(launch.lifetime);
    e.vel = launch.direction * launch.speed;
    e
}

/// Parameters of an area attack
#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub owner: u32,
    pub center: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub stun_secs: f32,
    pub lifetime: f32,
    pub tag: Option<String>,
}

/// Short-lived marker that hits every enemy inside it once
pub fn area_effect(id: u32, burst: Burst) -> Entity {
    Entity::new(
        id,
        Aabb::from_center(burst.center, Vec2::splat(burst.radius.max(0.0) * 2.0)),
        Team::Player,
        Role::AreaEffect(AreaEffect {
            owner: burst.owner,
            damage: burst.damage,
            stun_secs: burst.stun_secs,
            tag: burst.tag,
            hits: Vec::new(),
        }),
        0.0,
    )
    .with_lifetime(burst.lifetime.max(MIN_AREA_LIFETIME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Point;
    use crate::sim::behavior::{BehaviorMode, PatrolMode};

    #[test]
    fn test_known_enemy_gets_behavior_and_stats() {
        let tuning = Tuning::default();
        let data = EnemyData {
            x: 100.0,
            y: 50.0,
            kind: "Aggressive".into(),
            patrol_path: vec![Point::Pair([100.0, 50.0]), Point::Pair([150.0, 50.0])],
            patrol_mode: PatrolMode::Reverse,
        };
        let e = enemy(3, &data, &tuning);
        assert_eq!(e.team, Team::Enemy);
        assert_eq!(e.speed, 80.0);
        assert_eq!(e.aabb.size, Vec2::splat(25.0));
        let state = e.enemy_state().unwrap();
        let behavior = state.behavior.as_ref().unwrap();
        assert_eq!(behavior.mode(), BehaviorMode::Patrol);
        assert_eq!(behavior.patrol.waypoints().len(), 2);
    }

    #[test]
    fn test_unknown_enemy_is_inert_neutral() {
        let data = EnemyData {
            kind: "Shadow Wyrm".into(),
            ..EnemyData::default()
        };
        let e = enemy(4, &data, &Tuning::default());
        assert_eq!(e.team, Team::Neutral);
        assert_eq!(e.speed, 0.0);
        let state = e.enemy_state().unwrap();
        assert!(state.behavior.is_none());
        assert_eq!(state.contact_damage, 0.0);
    }

    #[test]
    fn test_unknown_obstacle_is_not_solid() {
        let data = ObstacleData {
            width: 10.0,
            height: 10.0,
            kind: "crystal".into(),
            ..ObstacleData::default()
        };
        assert!(!obstacle(5, &data).is_solid());
        let wall = ObstacleData {
            kind: "wall".into(),
            ..data
        };
        assert!(obstacle(6, &wall).is_solid());
    }

    #[test]
    fn test_projectile_moves_along_direction() {
        let p = projectile(
            9,
            Launch {
                owner: 1,
                team: Team::Player,
                origin: Vec2::new(100.0, 100.0),
                direction: Vec2::Y,
                speed: 300.0,
                damage: 10.0,
                size: 10.0,
                lifetime: 1.0,
                tag: None,
            },
        );
        assert_eq!(p.center(), Vec2::new(100.0, 100.0));
        assert_eq!(p.vel, Vec2::new(0.0, 300.0));
        assert_eq!(p.lifetime, Some(1.0));
    }

    #[test]
    fn test_area_effect_has_minimum_lifetime() {
        let a = area_effect(
            2,
            Burst {
                owner: 1,
                center: Vec2::new(50.0, 50.0),
                radius: 40.0,
                damage: 10.0,
                stun_secs: 1.0,
                lifetime: 0.0,
                tag: None,
            },
        );
        assert_eq!(a.aabb.size, Vec2::splat(80.0));
        assert_eq!(a.lifetime, Some(MIN_AREA_LIFETIME));
    }
}
