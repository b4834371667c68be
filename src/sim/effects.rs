//! Timed status effects
//!
//! Effects never mutate an entity's base stats. Whatever an effect changes
//! is derived from the live set each frame, so removing an expired effect
//! reverts its magnitude exactly once and nothing else.

use serde::{Deserialize, Serialize};

use crate::sanitize_dt;

/// Status effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Multiplies movement speed by `magnitude`
    SpeedMultiplier,
    /// Multiplies movement speed by `magnitude` (expected < 1)
    Slow,
    /// Ignores all incoming damage
    Invulnerable,
    /// No voluntary movement
    Stun,
    /// Invisible to enemy detection
    Cloak,
}

/// One running effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedEffect {
    pub kind: EffectKind,
    /// Seconds left; always > 0 while stored
    pub remaining: f32,
    pub magnitude: f32,
}

/// All effects currently applied to one entity (at most one per kind)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectSet {
    effects: Vec<TimedEffect>,
}

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect.
    ///
    /// Re-applying a kind that is already running keeps the longer of the
    /// two durations and takes the new magnitude. Zero or invalid
    /// durations are ignored.
    pub fn apply(&mut self, kind: EffectKind, duration: f32, magnitude: f32) {
        if !(duration.is_finite() && duration > 0.0) || !magnitude.is_finite() {
            return;
        }
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == kind) {
            existing.remaining = existing.remaining.max(duration);
            existing.magnitude = magnitude;
        } else {
            self.effects.push(TimedEffect {
                kind,
                remaining: duration,
                magnitude,
            });
        }
    }

    /// Advance all effects by `dt`, returning the kinds that expired.
    pub fn tick(&mut self, dt: f32) -> Vec<EffectKind> {
        let dt = sanitize_dt(dt);
        if dt == 0.0 {
            return Vec::new();
        }

        let mut expired = Vec::new();
        self.effects.retain_mut(|effect| {
            effect.remaining -= dt;
            if effect.remaining <= 0.0 {
                expired.push(effect.kind);
                false
            } else {
                true
            }
        });
        expired
    }

    #[inline]
    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn get(&self, kind: EffectKind) -> Option<&TimedEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    /// Combined movement multiplier from speed and slow effects
    pub fn speed_factor(&self) -> f32 {
        self.effects
            .iter()
            .filter(|e| matches!(e.kind, EffectKind::SpeedMultiplier | EffectKind::Slow))
            .map(|e| e.magnitude.max(0.0))
            .product()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedEffect> {
        self.effects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}
