//! Level data records
//!
//! Levels arrive as JSON produced by the content generator. Every field is
//! optional; anything missing or malformed falls back to a safe default so
//! a level always loads.

use std::path::{Path, PathBuf};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::aabb::Aabb;
use crate::sim::ability::AbilitySpec;
use crate::sim::behavior::PatrolMode;
use crate::sim::combat::Matchup;
use crate::sim::entity::{EnemyKind, ObstacleKind, PickupKind, normalize_tag};
use crate::sim::objective::{Objective, ObjectiveKind, target_kind, target_matches};

/// Default count of a collect objective that omits one
const DEFAULT_COLLECT_COUNT: u32 = 3;

/// Distance kept from the world edge when placing generated entities
const PLACEMENT_MARGIN: f32 = 50.0;

/// Placement attempts before accepting a spot inside a solid
const PLACEMENT_TRIES: usize = 20;

/// Failure reading a level file
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid level data")]
    Parse(#[from] serde_json::Error),
}

/// A 2D point written either as `[x, y]` or `{"x": .., "y": ..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Point {
    Pair([f32; 2]),
    Xy { x: f32, y: f32 },
}

impl Point {
    pub fn to_vec2(self) -> Vec2 {
        match self {
            Point::Pair([x, y]) | Point::Xy { x, y } => Vec2::new(x, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSize {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WORLD_WIDTH,
            height: DEFAULT_WORLD_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleData {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupData {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyData {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
    /// Empty or single-point paths keep the enemy in place
    pub patrol_path: Vec<Point>,
    pub patrol_mode: PatrolMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionData {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveData {
    /// collect | defeat | reach | survive
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
    pub count: Option<u32>,
    /// Target area of a reach objective
    pub region: Option<RegionData>,
    /// Seconds for a survive objective (falls back to `count`)
    pub duration: Option<f32>,
}

/// One level as produced by the content generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub level_number: u32,
    pub name: String,
    pub description: String,
    pub size: WorldSize,
    pub spawn_points: Vec<SpawnPoint>,
    pub obstacles: Vec<ObstacleData>,
    #[serde(alias = "pickups")]
    pub powerups: Vec<PickupData>,
    pub enemies: Vec<EnemyData>,
    pub objectives: Vec<ObjectiveData>,
    /// Free-form label ("easy", "hard", a number...)
    pub difficulty: Option<serde_json::Value>,
    pub time_limit: Option<f32>,
    /// Present for platformer levels (pixels/s^2, +y down)
    pub gravity: Option<f32>,
    pub damage_table: Vec<Matchup>,
    /// Replaces the default ability loadout
    pub abilities: Option<Vec<AbilitySpec>>,
}

impl Default for LevelData {
    fn default() -> Self {
        Self {
            level_number: 1,
            name: String::new(),
            description: String::new(),
            size: WorldSize::default(),
            spawn_points: Vec::new(),
            obstacles: Vec::new(),
            powerups: Vec::new(),
            enemies: Vec::new(),
            objectives: Vec::new(),
            difficulty: None,
            time_limit: None,
            gravity: None,
            damage_table: Vec::new(),
            abilities: None,
        }
    }
}

fn positive_or(value: Option<f32>, fallback: f32) -> f32 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(fallback)
}

fn random_coord(rng: &mut impl Rng, extent: f32, margin: f32) -> f32 {
    let lo = margin.min(extent / 2.0).max(0.0);
    let hi = (extent - margin).max(lo);
    rng.random_range(lo..=hi).round()
}

/// Uniform point in the world, `margin` away from the edges where it fits
pub fn random_point(rng: &mut impl Rng, world: Vec2, margin: f32) -> Vec2 {
    let x = random_coord(rng, world.x, margin);
    let y = random_coord(rng, world.y, margin);
    Vec2::new(x, y)
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let level = Self::from_json(&json)?;
        log::info!(
            "Loaded level {} \"{}\" from {}",
            level.level_number,
            level.name,
            path.display()
        );
        Ok(level)
    }

    /// World extent, defaulted when missing or degenerate
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            positive_or(Some(self.size.width), DEFAULT_WORLD_WIDTH),
            positive_or(Some(self.size.height), DEFAULT_WORLD_HEIGHT),
        )
    }

    /// Top-left of the player's spawn point
    pub fn player_spawn(&self) -> Vec2 {
        self.spawn_points
            .iter()
            .find(|sp| normalize_tag(&sp.kind) == "player")
            .map(|sp| Vec2::new(sp.x, sp.y))
            .filter(|p| p.is_finite())
            .unwrap_or(Vec2::from(DEFAULT_PLAYER_SPAWN))
    }

    /// Level countdown in seconds
    pub fn time_limit_secs(&self) -> f32 {
        positive_or(self.time_limit, DEFAULT_TIME_LIMIT)
    }

    /// Gravity if this is a platformer level
    pub fn platformer_gravity(&self) -> Option<f32> {
        self.gravity.filter(|g| g.is_finite())
    }

    /// Solid obstacle boxes, for placement checks
    fn solid_boxes(&self) -> Vec<Aabb> {
        self.obstacles
            .iter()
            .filter(|o| ObstacleKind::from_tag(&o.kind).is_solid())
            .map(|o| Aabb::new(o.x, o.y, o.width, o.height))
            .collect()
    }

    /// Random spot for a `size` box that avoids solids when it can
    fn free_spot(&self, rng: &mut impl Rng, size: f32, solids: &[Aabb]) -> Vec2 {
        let world = self.world_size();
        let mut spot = random_point(rng, world, PLACEMENT_MARGIN);
        for _ in 1..PLACEMENT_TRIES {
            let spot_box = Aabb::new(spot.x, spot.y, size, size);
            if !solids.iter().any(|s| spot_box.overlaps(s)) {
                break;
            }
            spot = random_point(rng, world, PLACEMENT_MARGIN);
        }
        spot
    }

    /// Build the objective list.
    ///
    /// Unknown objective types are skipped. A level that lists nothing usable
    /// gets a derived objective: collect every collectible, else defeat every
    /// enemy, else none.
    pub fn build_objectives(&self) -> Vec<Objective> {
        let mut objectives = Vec::new();
        for data in &self.objectives {
            match self.build_objective(data) {
                Some(obj) => objectives.push(obj),
                None => log::warn!(
                    "Skipping unsupported objective type \"{}\" (target \"{}\")",
                    data.kind,
                    data.target
                ),
            }
        }

        if objectives.is_empty() && self.objectives.is_empty() {
            let collectibles = self
                .powerups
                .iter()
                .filter(|p| PickupKind::from_tag(&p.kind).is_collectible())
                .count() as u32;
            let enemies = self.known_enemy_count("enemies");
            if collectibles > 0 {
                objectives.push(Objective::new(
                    ObjectiveKind::Collect {
                        target: "collectibles".into(),
                    },
                    collectibles,
                ));
            } else if enemies > 0 {
                objectives.push(Objective::new(
                    ObjectiveKind::Defeat {
                        target: "enemies".into(),
                    },
                    enemies,
                ));
            }
        }
        objectives
    }

    fn build_objective(&self, data: &ObjectiveData) -> Option<Objective> {
        match normalize_tag(&data.kind).as_str() {
            "collect" => Some(Objective::new(
                ObjectiveKind::Collect {
                    target: data.target.clone(),
                },
                data.count.unwrap_or(DEFAULT_COLLECT_COUNT),
            )),
            "defeat" | "kill" => {
                let present = self.known_enemy_count(&data.target).max(1);
                Some(Objective::new(
                    ObjectiveKind::Defeat {
                        target: data.target.clone(),
                    },
                    data.count.unwrap_or(present),
                ))
            }
            "reach" => {
                let Some(r) = data.region else {
                    log::warn!("Reach objective without a region");
                    return None;
                };
                let region = Aabb::new(r.x, r.y, r.width, r.height);
                region.is_finite().then(|| Objective::new(ObjectiveKind::Reach { region }, 1))
            }
            "survive" => {
                let seconds = data
                    .duration
                    .or(data.count.map(|c| c as f32))
                    .unwrap_or_else(|| self.time_limit_secs());
                Some(Objective::new(ObjectiveKind::Survive { seconds }, 0))
            }
            _ => None,
        }
    }

    fn known_enemy_count(&self, target: &str) -> u32 {
        self.enemies
            .iter()
            .map(|e| EnemyKind::from_tag(&e.kind))
            .filter(|k| !matches!(k, EnemyKind::Unknown(_)) && target_matches(target, k.tag()))
            .count() as u32
    }

    /// Place the collectibles collect objectives need but the level lacks.
    ///
    /// Missing items are dropped at seeded random positions, away from
    /// solids when possible.
    pub fn ensure_collectibles(&mut self, rng: &mut impl Rng, pickup_size: f32) {
        let solids = self.solid_boxes();
        let wanted: Vec<(String, u32)> = self
            .objectives
            .iter()
            .filter(|o| normalize_tag(&o.kind) == "collect")
            .map(|o| (o.target.clone(), o.count.unwrap_or(DEFAULT_COLLECT_COUNT)))
            .collect();

        for (target, count) in wanted {
            let present = self
                .powerups
                .iter()
                .map(|p| PickupKind::from_tag(&p.kind))
                .filter(|k| k.is_collectible() && target_matches(&target, k.tag()))
                .count() as u32;
            if present >= count {
                continue;
            }

            let kind = target_kind(&target).unwrap_or_else(|| "coin".to_string());
            log::info!("Placing {} extra \"{}\" for objective", count - present, kind);
            for _ in present..count {
                let spot = self.free_spot(rng, pickup_size, &solids);
                self.powerups.push(PickupData {
                    x: spot.x,
                    y: spot.y,
                    kind: kind.clone(),
                });
            }
        }
    }

    /// Harder later levels: more enemies and a shorter clock.
    ///
    /// The modifier is `min(1 + (n - 1) * 0.2, 2)`. Extra enemies are basic
    /// patrollers at random positions; the time limit (if set) becomes
    /// `max(60, limit / modifier)`.
    pub fn scale_difficulty(&mut self, level_number: u32, rng: &mut impl Rng) {
        let modifier = difficulty_modifier(level_number);
        self.level_number = level_number;

        let current = self.enemies.len();
        let target = (current as f32 * modifier).floor() as usize;
        if target > current {
            let world = self.world_size();
            for _ in current..target {
                let p = random_point(rng, world, PLACEMENT_MARGIN);
                self.enemies.push(EnemyData {
                    x: p.x,
                    y: p.y,
                    kind: "basic".into(),
                    patrol_path: vec![Point::Pair([p.x, p.y]), Point::Pair([p.x + 50.0, p.y])],
                    patrol_mode: PatrolMode::Loop,
                });
            }
        }

        if let Some(limit) = self.time_limit.filter(|t| t.is_finite()) {
            self.time_limit = Some((limit / modifier).floor().max(60.0));
        }

        log::info!(
            "Level {level_number}: difficulty x{modifier:.1}, {} enemies, time limit {:?}",
            self.enemies.len(),
            self.time_limit
        );
    }
}

/// Difficulty multiplier for a 1-based level number, capped at 2
pub fn difficulty_modifier(level_number: u32) -> f32 {
    (1.0 + level_number.saturating_sub(1) as f32 * 0.2).min(2.0)
}
