//! Arcade Forge - simulation core for generated 2D arcade games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, abilities, AI, objectives)
//! - `level`: Level records produced by the content generator
//! - `tuning`: Data-driven game balance
//! - `autopilot`: Scripted input for headless and demo runs

pub mod autopilot;
pub mod level;
pub mod sim;
pub mod tuning;

pub use level::{LevelData, LevelError};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the generated games)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World defaults when a level omits its size
    pub const DEFAULT_WORLD_WIDTH: f32 = 800.0;
    pub const DEFAULT_WORLD_HEIGHT: f32 = 600.0;

    /// Level countdown default (seconds)
    pub const DEFAULT_TIME_LIMIT: f32 = 120.0;

    /// Player spawn when the level has no player spawn point
    pub const DEFAULT_PLAYER_SPAWN: (f32, f32) = (50.0, 50.0);
}

/// Unit vector pointing from `from` toward `to` (zero when they coincide)
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Clamp a time delta to something the simulation can advance by.
///
/// Negative and non-finite deltas advance nothing.
#[inline]
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_dt() {
        assert_eq!(sanitize_dt(0.5), 0.5);
        assert_eq!(sanitize_dt(-1.0), 0.0);
        assert_eq!(sanitize_dt(f32::NAN), 0.0);
        assert_eq!(sanitize_dt(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_direction_to() {
        let d = direction_to(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert_eq!(direction_to(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
    }
}
