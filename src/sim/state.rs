//! Game state and session types
//!
//! A `GameState` is one level session: every live entity, the clock, the
//! score, objectives and the current game-flow phase. Nothing here is
//! global, so any number of sessions can run side by side.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ability::ActivationError;
use super::behavior::BehaviorMode;
use super::combat::DamageTable;
use super::effects::EffectKind;
use super::entity::Entity;
use super::objective::ObjectiveTracker;
use super::spawn;
use crate::level::LevelData;
use crate::tuning::Tuning;

/// Current phase of the game flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Level loaded, waiting for start
    Menu,
    /// Full simulation tick
    Playing,
    /// Frozen; only resume is accepted
    Paused,
    /// Player died or time ran out
    GameOver,
    /// Every objective met
    Victory,
}

impl GamePhase {
    /// GameOver and Victory end the attempt
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    AbilityActivated { slot: usize, name: String },
    AbilityRejected { slot: usize, reason: ActivationError },
    EffectExpired { entity: u32, kind: EffectKind },
    BehaviorChanged { entity: u32, from: BehaviorMode, to: BehaviorMode },
    ProjectileFired { owner: u32, projectile: u32 },
    Damaged { entity: u32, amount: f32, source: Option<u32> },
    /// Fires exactly once per entity
    EntityDied { entity: u32 },
    EnemyDefeated { entity: u32, kind: String },
    PickupCollected { entity: u32, kind: String },
    RegionEntered { objective: usize },
    ObjectiveCompleted { objective: usize },
    /// Lifetime ran out (projectiles, area markers)
    Expired { entity: u32 },
    /// A corrupt entity was repaired or dropped
    InvariantRepaired { entity: u32, removed: bool },
}

/// One level session
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed; the same level and seed always play out the same way
    pub seed: u64,
    /// Level as loaded, kept for restarts
    level: LevelData,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// World extent (top-left origin)
    pub world: Vec2,
    /// `Some` in platformer mode
    pub gravity: Option<f32>,
    /// Level countdown (seconds)
    pub time_remaining: f32,
    /// Seconds played
    pub elapsed: f32,
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// All live entities (sorted by id for determinism)
    pub entities: Vec<Entity>,
    pub player_id: u32,
    pub objectives: ObjectiveTracker,
    pub damage_table: DamageTable,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Build a session from a level. Starts in Menu.
    pub fn new(level: LevelData, tuning: Tuning, seed: u64) -> Self {
        let mut state = Self {
            seed,
            level,
            tuning,
            phase: GamePhase::Menu,
            world: Vec2::ZERO,
            gravity: None,
            time_remaining: 0.0,
            elapsed: 0.0,
            score: 0,
            time_ticks: 0,
            entities: Vec::new(),
            player_id: 0,
            objectives: ObjectiveTracker::default(),
            damage_table: DamageTable::default(),
            next_id: 1,
        };
        state.populate();
        state
    }

    fn populate(&mut self) {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut level = self.level.clone();
        level.ensure_collectibles(&mut rng, self.tuning.pickups.size);

        self.world = level.world_size();
        self.gravity = level.platformer_gravity();
        self.time_remaining = level.time_limit_secs();
        self.elapsed = 0.0;
        self.score = 0;
        self.time_ticks = 0;
        self.entities.clear();
        self.next_id = 1;
        self.damage_table = DamageTable::new(level.damage_table.clone());
        self.objectives = ObjectiveTracker::new(level.build_objectives());

        let loadout = level
            .abilities
            .clone()
            .unwrap_or_else(|| self.tuning.abilities.clone());
        self.player_id = self.next_entity_id();
        let player = spawn::player(self.player_id, level.player_spawn(), &self.tuning, loadout);
        self.entities.push(player);

        for data in &level.obstacles {
            let id = self.next_entity_id();
            self.entities.push(spawn::obstacle(id, data));
        }
        for data in &level.powerups {
            let id = self.next_entity_id();
            self.entities.push(spawn::pickup(id, data, self.tuning.pickups.size));
        }
        for data in &level.enemies {
            let id = self.next_entity_id();
            let enemy = spawn::enemy(id, data, &self.tuning);
            self.entities.push(enemy);
        }

        log::info!(
            "Level {} \"{}\": {} entities, {} objectives, {:.0}s limit{}",
            level.level_number,
            level.name,
            self.entities.len(),
            self.objectives.objectives().len(),
            self.time_remaining,
            if self.gravity.is_some() { ", platformer" } else { "" }
        );
    }

    /// Explicit level reset: rebuild everything from the level and return to Menu
    pub fn restart(&mut self) {
        self.populate();
        self.phase = GamePhase::Menu;
    }

    /// The level record this session was built from
    pub fn level(&self) -> &LevelData {
        &self.level
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an entity built with an id from `next_entity_id`
    pub fn spawn(&mut self, entity: Entity) -> u32 {
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn get(&self, id: u32) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Entity> {
        self.index_of(id).map(|i| &mut self.entities[i])
    }

    pub fn player(&self) -> Option<&Entity> {
        self.get(self.player_id)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.get_mut(self.player_id)
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Role, Team};

    fn level() -> LevelData {
        LevelData::from_json(
            r#"{
                "name": "Test Grounds",
                "spawn_points": [{"x": 100, "y": 100, "type": "player"}],
                "obstacles": [{"x": 300, "y": 300, "width": 40, "height": 40, "type": "rock"}],
                "powerups": [{"x": 200, "y": 100, "type": "health"}],
                "enemies": [{"x": 500, "y": 400, "type": "basic"}, {"x": 600, "y": 400, "type": "slime"}],
                "objectives": [{"type": "collect", "target": "gems", "count": 2}],
                "time_limit": 90
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_new_session_layout() {
        let state = GameState::new(level(), Tuning::default(), 7);
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(state.time_remaining, 90.0);
        // player + rock + health + 2 generated gems + 2 enemies
        assert_eq!(state.entities.len(), 7);
        assert_eq!(state.player_id, 1);
        let player = state.player().unwrap();
        assert!(player.is_player());
        assert_eq!(player.aabb.pos, Vec2::new(100.0, 100.0));
        assert!(state.entities.windows(2).all(|w| w[0].id < w[1].id));
        let gems = state
            .entities
            .iter()
            .filter(|e| matches!(&e.role, Role::Pickup(k) if k.tag() == "gem"))
            .count();
        assert_eq!(gems, 2);
        assert_eq!(
            state.entities.iter().filter(|e| e.team == Team::Enemy).count(),
            1
        );
    }

    #[test]
    fn test_restart_rebuilds_identically() {
        let mut state = GameState::new(level(), Tuning::default(), 11);
        let fresh = state.entities.clone();
        state.score = 500;
        state.phase = GamePhase::GameOver;
        state.entities.truncate(1);

        state.restart();
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(state.score, 0);
        assert_eq!(state.entities, fresh);
    }

    #[test]
    fn test_lookup_by_id() {
        let mut state = GameState::new(level(), Tuning::default(), 3);
        assert!(state.get(2).is_some());
        assert!(state.get(999).is_none());
        state.get_mut(2).unwrap().alive = false;
        assert!(!state.get(2).unwrap().alive);
    }
}
