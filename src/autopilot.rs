//! Scripted player for headless runs and demos
//!
//! Reads the state and produces the input a simple player would: start the
//! level, walk to the nearest pickup or region, fight whatever gets close.
//! Only abilities that are ready and affordable get pressed.

use glam::Vec2;

use crate::direction_to;
use crate::sim::ability::{AbilityKind, AbilitySet};
use crate::sim::entity::{Entity, Role, Team};
use crate::sim::objective::ObjectiveKind;
use crate::sim::state::{GamePhase, GameState};
use crate::sim::tick::TickInput;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Autopilot {
    /// Throw at enemies closer than this
    pub throw_range: f32,
    /// Fraction of the area attack radius an enemy must be inside
    pub area_reach: f32,
    /// Raise the shield below this fraction of max health
    pub shield_below: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            throw_range: 300.0,
            area_reach: 0.8,
            shield_below: 0.3,
        }
    }
}

fn nearest<'a>(from: Vec2, candidates: impl Iterator<Item = &'a Entity>) -> Option<&'a Entity> {
    candidates.min_by(|a, b| {
        from.distance(a.center())
            .partial_cmp(&from.distance(b.center()))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Slot of the first ready, affordable ability matching `pred`
fn usable(abilities: &AbilitySet, pred: impl Fn(&AbilityKind) -> bool) -> Option<usize> {
    abilities.slots.iter().position(|s| {
        pred(&s.spec.kind) && s.is_ready() && abilities.pool.current >= s.spec.cost
    })
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input for the next tick
    pub fn next_input(&self, state: &GameState) -> TickInput {
        let mut input = TickInput::default();
        match state.phase {
            GamePhase::Menu => {
                input.start = true;
                return input;
            }
            GamePhase::Paused => {
                input.pause = true;
                return input;
            }
            GamePhase::GameOver | GamePhase::Victory => return input,
            GamePhase::Playing => {}
        }

        let Some(player) = state.player().filter(|p| p.alive) else {
            return input;
        };
        let Some(ps) = player.player_state() else {
            return input;
        };
        let here = player.center();

        let pickup = nearest(
            here,
            state
                .entities
                .iter()
                .filter(|e| e.alive && matches!(e.role, Role::Pickup(_))),
        )
        .map(Entity::center);
        let region = state
            .objectives
            .objectives()
            .iter()
            .find_map(|o| match &o.kind {
                ObjectiveKind::Reach { region } if !o.is_satisfied() => Some(region.center()),
                _ => None,
            });
        let enemy = nearest(
            here,
            state
                .entities
                .iter()
                .filter(|e| e.alive && e.team == Team::Enemy && e.is_enemy()),
        );

        let target = pickup.or(region).or(enemy.map(Entity::center));
        if let Some(target) = target {
            input.movement = direction_to(here, target);
            if state.gravity.is_some() && target.y < player.aabb.top() {
                input.jump = true;
            }
        }

        let abilities = &ps.abilities;
        if player.health < player.max_health * self.shield_below {
            if let Some(slot) = usable(abilities, |k| matches!(k, AbilityKind::Shield)) {
                input.activate.push(slot);
            }
        }

        if let Some(enemy) = enemy {
            let dist = here.distance(enemy.center());
            let area = usable(abilities, |k| {
                matches!(k, AbilityKind::AreaAttack { radius, .. } if dist <= radius * self.area_reach)
            });
            if let Some(slot) = area {
                input.activate.push(slot);
            } else if dist <= self.throw_range {
                if let Some(slot) = usable(abilities, |k| matches!(k, AbilityKind::Throw { .. })) {
                    input.activate.push(slot);
                    input.aim = Some(enemy.center());
                }
            }
        }

        input
    }
}
