//! Balance and configuration
//!
//! Every gameplay number lives here instead of in the simulation code.
//! Missing fields in a tuning file fall back to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::ability::{AbilityKind, AbilitySpec};
use crate::sim::behavior::{BehaviorProfile, RangedProfile};
use crate::sim::entity::EnemyKind;

/// Failure reading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tuning data")]
    Parse(#[from] serde_json::Error),
}

/// Player body and movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub size: f32,
    /// Pixels per second
    pub speed: f32,
    pub health: f32,
    /// Upward launch speed in platformer mode (pixels/s)
    pub jump_speed: f32,
    /// Terminal fall speed in platformer mode (pixels/s)
    pub max_fall_speed: f32,
    /// Seconds after an enemy contact hit before the next one can land
    pub contact_grace: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: 30.0,
            speed: 200.0,
            health: 100.0,
            jump_speed: 1200.0,
            max_fall_speed: 1200.0,
            contact_grace: 1.0,
        }
    }
}

/// One enemy archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub size: f32,
    pub speed: f32,
    pub health: f32,
    pub contact_damage: f32,
    pub detection_radius: f32,
    pub disengage_radius: f32,
    pub score_value: u64,
    /// Present for shooters
    pub ranged: Option<RangedProfile>,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            size: 25.0,
            speed: 50.0,
            health: 30.0,
            contact_damage: 10.0,
            detection_radius: 150.0,
            disengage_radius: 250.0,
            score_value: 100,
            ranged: None,
        }
    }
}

impl EnemyTuning {
    pub fn profile(&self) -> BehaviorProfile {
        BehaviorProfile::new(self.detection_radius, self.disengage_radius, self.ranged)
    }
}

/// Per-kind enemy tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyRoster {
    pub basic: EnemyTuning,
    pub aggressive: EnemyTuning,
    pub fast: EnemyTuning,
    pub ranged: EnemyTuning,
}

impl Default for EnemyRoster {
    fn default() -> Self {
        Self {
            basic: EnemyTuning::default(),
            aggressive: EnemyTuning {
                speed: 80.0,
                health: 40.0,
                contact_damage: 15.0,
                detection_radius: 250.0,
                disengage_radius: 400.0,
                score_value: 150,
                ..EnemyTuning::default()
            },
            fast: EnemyTuning {
                speed: 120.0,
                health: 20.0,
                detection_radius: 100.0,
                disengage_radius: 180.0,
                score_value: 120,
                ..EnemyTuning::default()
            },
            ranged: EnemyTuning {
                speed: 40.0,
                health: 25.0,
                contact_damage: 5.0,
                detection_radius: 250.0,
                disengage_radius: 350.0,
                score_value: 150,
                ranged: Some(RangedProfile {
                    interval: 1.5,
                    projectile_speed: 250.0,
                    damage: 8.0,
                    projectile_size: 8.0,
                    projectile_lifetime: 2.5,
                }),
                ..EnemyTuning::default()
            },
        }
    }
}

impl EnemyRoster {
    /// Tuning for a known kind; unknown kinds have none
    pub fn get(&self, kind: &EnemyKind) -> Option<&EnemyTuning> {
        match kind {
            EnemyKind::Basic => Some(&self.basic),
            EnemyKind::Aggressive => Some(&self.aggressive),
            EnemyKind::Fast => Some(&self.fast),
            EnemyKind::Ranged => Some(&self.ranged),
            EnemyKind::Unknown(_) => None,
        }
    }
}

/// Pickup values and effect durations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    pub size: f32,
    pub health: f32,
    pub score: u64,
    pub speed_multiplier: f32,
    pub speed_secs: f32,
    pub shield_secs: f32,
    pub energy: f32,
    pub coin: u64,
    pub gem: u64,
    pub key: u64,
    pub star: u64,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            size: 20.0,
            health: 20.0,
            score: 50,
            speed_multiplier: 1.5,
            speed_secs: 5.0,
            shield_secs: 3.0,
            energy: 25.0,
            coin: 10,
            gem: 50,
            key: 100,
            star: 100,
        }
    }
}

/// Non-solid terrain effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// Speed factor while wading through water
    pub water_slow: f32,
    /// How long the slow lingers after leaving water
    pub water_linger: f32,
    /// Lava damage per second
    pub lava_dps: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            water_slow: 0.5,
            water_linger: 0.1,
            lava_dps: 20.0,
        }
    }
}

/// Shared ability resource pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolTuning {
    pub max: f32,
    pub regen_per_sec: f32,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            max: 100.0,
            regen_per_sec: 10.0,
        }
    }
}

/// All balance data for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub enemies: EnemyRoster,
    pub pickups: PickupTuning,
    pub hazards: HazardTuning,
    pub pool: PoolTuning,
    /// Default ability loadout (slot order)
    pub abilities: Vec<AbilitySpec>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            enemies: EnemyRoster::default(),
            pickups: PickupTuning::default(),
            hazards: HazardTuning::default(),
            pool: PoolTuning::default(),
            abilities: default_loadout(),
        }
    }
}

/// Dash, area attack, throw and shield
pub fn default_loadout() -> Vec<AbilitySpec> {
    vec![
        AbilitySpec {
            name: "dash".into(),
            kind: AbilityKind::Dash {
                speed_multiplier: 2.5,
            },
            cost: 20.0,
            duration: 0.3,
            cooldown: 1.0,
            tag: None,
        },
        AbilitySpec {
            name: "area attack".into(),
            kind: AbilityKind::AreaAttack {
                radius: 80.0,
                damage: 25.0,
                stun_secs: 1.5,
            },
            cost: 30.0,
            duration: 0.2,
            cooldown: 3.0,
            tag: None,
        },
        AbilitySpec {
            name: "throw".into(),
            kind: AbilityKind::Throw {
                speed: 400.0,
                damage: 15.0,
                lifetime: 1.5,
                size: 10.0,
            },
            cost: 10.0,
            duration: 0.0,
            cooldown: 0.5,
            tag: None,
        },
        AbilitySpec {
            name: "shield".into(),
            kind: AbilityKind::Shield,
            cost: 40.0,
            duration: 2.0,
            cooldown: 8.0,
            tag: None,
        },
    ]
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Load from `path` if given, falling back to defaults on any failure
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("{err}; using default tuning");
                Self::default()
            }
        }
    }
}
