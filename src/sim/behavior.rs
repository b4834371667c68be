//! Enemy AI - a small finite-state behavior controller
//!
//! States:
//!   1. **Patrol** - walk the patrol path (loop or reverse at the ends).
//!   2. **Chase** - head for the last known player position.
//!   3. **Stunned** - no movement until the stun effect wears off.
//!   4. **RangedAttack** - hold position and fire at the player periodically.
//!
//! Priority when several triggers fire in one frame: Stunned > Chase > Patrol.
//! A cloaked or invulnerable player is undetectable, which drops any
//! engagement back to Patrol on the next check.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use crate::direction_to;

/// Distance at which a waypoint counts as reached even with zero speed
const ARRIVE_EPSILON: f32 = 0.01;

/// Shortest allowed gap between ranged shots
const MIN_FIRE_INTERVAL: f32 = 0.05;

/// What to do at the end of a patrol path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatrolMode {
    /// Last waypoint wraps to the first
    #[default]
    Loop,
    /// Walk the path back the way it came
    Reverse,
}

/// Ordered waypoints (top-left positions) an enemy cycles through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolPath {
    waypoints: Vec<Vec2>,
    index: usize,
    forward: bool,
    mode: PatrolMode,
}

impl PatrolPath {
    pub fn new(waypoints: Vec<Vec2>, mode: PatrolMode) -> Self {
        let waypoints = waypoints.into_iter().filter(|w| w.is_finite()).collect();
        Self {
            waypoints,
            index: 0,
            forward: true,
            mode,
        }
    }

    /// Path that never moves
    pub fn stationary() -> Self {
        Self::new(Vec::new(), PatrolMode::Loop)
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Empty and single-point paths keep the enemy in place
    pub fn is_stationary(&self) -> bool {
        self.waypoints.len() < 2
    }

    /// Waypoint currently being walked toward
    pub fn target(&self) -> Option<Vec2> {
        if self.is_stationary() {
            None
        } else {
            self.waypoints.get(self.index).copied()
        }
    }

    /// Move on to the next waypoint
    pub fn advance(&mut self) {
        let len = self.waypoints.len();
        if len < 2 {
            return;
        }
        match self.mode {
            PatrolMode::Loop => self.index = (self.index + 1) % len,
            PatrolMode::Reverse => {
                if self.forward {
                    if self.index + 1 < len {
                        self.index += 1;
                    } else {
                        self.forward = false;
                        self.index -= 1;
                    }
                } else if self.index > 0 {
                    self.index -= 1;
                } else {
                    self.forward = true;
                    self.index += 1;
                }
            }
        }
    }
}

/// Parameters for enemies that shoot instead of chasing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedProfile {
    /// Seconds between shots
    pub interval: f32,
    pub projectile_speed: f32,
    pub damage: f32,
    pub projectile_size: f32,
    pub projectile_lifetime: f32,
}

/// Per-enemy tuning for the state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    /// Patrol -> engage when the player is closer than this
    pub detection_radius: f32,
    /// Engage -> Patrol when the player is farther than this
    pub disengage_radius: f32,
    /// `Some` turns engagement into RangedAttack instead of Chase
    pub ranged: Option<RangedProfile>,
}

impl BehaviorProfile {
    pub fn new(detection_radius: f32, disengage_radius: f32, ranged: Option<RangedProfile>) -> Self {
        let detection_radius = detection_radius.max(0.0);
        Self {
            detection_radius,
            // Hysteresis: disengage radius is never inside the detection radius
            disengage_radius: disengage_radius.max(detection_radius),
            ranged,
        }
    }
}

/// State-machine state with its per-state data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BehaviorState {
    Patrol,
    Chase { last_known: Vec2 },
    Stunned,
    RangedAttack { target: Vec2, fire_timer: f32 },
}

/// Data-free label of a `BehaviorState`, used in events and snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorMode {
    Patrol,
    Chase,
    Stunned,
    RangedAttack,
}

impl BehaviorState {
    pub fn mode(&self) -> BehaviorMode {
        match self {
            BehaviorState::Patrol => BehaviorMode::Patrol,
            BehaviorState::Chase { .. } => BehaviorMode::Chase,
            BehaviorState::Stunned => BehaviorMode::Stunned,
            BehaviorState::RangedAttack { .. } => BehaviorMode::RangedAttack,
        }
    }
}

/// What the controller knows about the player this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sight {
    pub center: Vec2,
    pub detectable: bool,
}

/// Movement and attack intent for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Intent {
    pub velocity: Vec2,
    /// Direction of a projectile to spawn this frame
    pub fire: Option<Vec2>,
}

/// A state transition, reported for events and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BehaviorMode,
    pub to: BehaviorMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorController {
    pub state: BehaviorState,
    pub profile: BehaviorProfile,
    pub patrol: PatrolPath,
}

impl BehaviorController {
    pub fn new(profile: BehaviorProfile, patrol: PatrolPath) -> Self {
        Self {
            state: BehaviorState::Patrol,
            profile,
            patrol,
        }
    }

    pub fn mode(&self) -> BehaviorMode {
        self.state.mode()
    }

    /// Run one frame: pick the state, then the intent for that state.
    pub fn step(
        &mut self,
        body: &Aabb,
        speed: f32,
        stunned: bool,
        sight: Option<Sight>,
        dt: f32,
    ) -> (Intent, Option<Transition>) {
        let transition = self.update_state(body.center(), stunned, sight);
        let intent = self.intent(body, speed, dt);
        (intent, transition)
    }

    /// Choose this frame's state. Returns the transition if the state changed.
    pub fn update_state(
        &mut self,
        center: Vec2,
        stunned: bool,
        sight: Option<Sight>,
    ) -> Option<Transition> {
        let from = self.state.mode();

        let seen = sight
            .filter(|s| s.detectable)
            .map(|s| (s.center, center.distance(s.center)));

        self.state = if stunned {
            BehaviorState::Stunned
        } else {
            match (self.state, seen) {
                // Stun timed out
                (BehaviorState::Stunned, _) => BehaviorState::Patrol,
                (BehaviorState::Patrol, Some((pos, dist))) if dist < self.profile.detection_radius => {
                    self.engage(pos)
                }
                (BehaviorState::Patrol, _) => BehaviorState::Patrol,
                (BehaviorState::Chase { .. }, Some((pos, dist)))
                    if dist <= self.profile.disengage_radius =>
                {
                    BehaviorState::Chase { last_known: pos }
                }
                (BehaviorState::RangedAttack { fire_timer, .. }, Some((pos, dist)))
                    if dist <= self.profile.disengage_radius =>
                {
                    BehaviorState::RangedAttack {
                        target: pos,
                        fire_timer,
                    }
                }
                // Out of range or undetectable
                _ => BehaviorState::Patrol,
            }
        };

        let to = self.state.mode();
        (from != to).then_some(Transition { from, to })
    }

    fn engage(&self, target: Vec2) -> BehaviorState {
        match self.profile.ranged {
            Some(ranged) => BehaviorState::RangedAttack {
                target,
                fire_timer: ranged.interval.max(MIN_FIRE_INTERVAL),
            },
            None => BehaviorState::Chase { last_known: target },
        }
    }

    /// Movement/attack intent for the current state
    pub fn intent(&mut self, body: &Aabb, speed: f32, dt: f32) -> Intent {
        let dt = crate::sanitize_dt(dt);
        match &mut self.state {
            BehaviorState::Patrol => Intent {
                velocity: patrol_velocity(&mut self.patrol, body.pos, speed, dt),
                fire: None,
            },
            BehaviorState::Chase { last_known } => Intent {
                velocity: seek(body.center(), *last_known, speed, dt),
                fire: None,
            },
            BehaviorState::Stunned => Intent::default(),
            BehaviorState::RangedAttack { target, fire_timer } => {
                let Some(ranged) = self.profile.ranged else {
                    return Intent::default();
                };
                *fire_timer -= dt;
                let fire = if *fire_timer <= 0.0 {
                    *fire_timer += ranged.interval.max(MIN_FIRE_INTERVAL);
                    Some(direction_to(body.center(), *target)).filter(|d| *d != Vec2::ZERO)
                } else {
                    None
                };
                Intent {
                    velocity: Vec2::ZERO,
                    fire,
                }
            }
        }
    }
}

/// Velocity toward `target`, landing exactly on it instead of overshooting
fn seek(from: Vec2, target: Vec2, speed: f32, dt: f32) -> Vec2 {
    let to = target - from;
    let dist = to.length();
    if dist <= ARRIVE_EPSILON {
        Vec2::ZERO
    } else if dt > 0.0 && dist <= speed * dt {
        to / dt
    } else {
        to / dist * speed
    }
}

fn patrol_velocity(patrol: &mut PatrolPath, pos: Vec2, speed: f32, dt: f32) -> Vec2 {
    let Some(target) = patrol.target() else {
        return Vec2::ZERO;
    };
    let to = target - pos;
    let dist = to.length();

    if dist <= (speed * dt).max(ARRIVE_EPSILON) {
        // Arrives this frame; aim for the next waypoint from here on
        patrol.advance();
        return if dt > 0.0 { to / dt } else { Vec2::ZERO };
    }
    to / dist * speed
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn basic_profile() -> BehaviorProfile {
        BehaviorProfile::new(100.0, 200.0, None)
    }

    fn body_at(pos: Vec2) -> Aabb {
        Aabb {
            pos,
            size: Vec2::splat(20.0),
        }
    }

    /// Walk a controller along its path, returning positions where a waypoint was reached
    fn arrivals(mode: PatrolMode, count: usize) -> Vec<Vec2> {
        let start = Vec2::new(100.0, 100.0);
        let path = PatrolPath::new(vec![start, Vec2::new(200.0, 100.0)], mode);
        let mut ctl = BehaviorController::new(basic_profile(), path);
        let mut body = body_at(start);
        let mut hits = Vec::new();

        for _ in 0..10_000 {
            let before = ctl.patrol.index();
            let (intent, _) = ctl.step(&body, 50.0, false, None, DT);
            body.pos += intent.velocity * DT;
            if ctl.patrol.index() != before {
                hits.push(body.pos);
                if hits.len() == count {
                    break;
                }
            }
        }
        hits
    }

    #[test]
    fn test_two_point_patrol_returns_to_start_loop() {
        let hits = arrivals(PatrolMode::Loop, 3);
        assert_eq!(hits.len(), 3);
        assert!(hits[1].distance(Vec2::new(200.0, 100.0)) < 1e-3);
        assert!(hits[2].distance(Vec2::new(100.0, 100.0)) < 1e-3);
    }

    #[test]
    fn test_two_point_patrol_returns_to_start_reverse() {
        let hits = arrivals(PatrolMode::Reverse, 3);
        assert_eq!(hits.len(), 3);
        assert!(hits[2].distance(Vec2::new(100.0, 100.0)) < 1e-3);
    }

    #[test]
    fn test_reverse_mode_walks_back() {
        let mut path = PatrolPath::new(
            vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            PatrolMode::Reverse,
        );
        let mut order = vec![path.index()];
        for _ in 0..5 {
            path.advance();
            order.push(path.index());
        }
        assert_eq!(order, vec![0, 1, 2, 1, 0, 1]);
    }

    #[test]
    fn test_single_waypoint_is_stationary() {
        let path = PatrolPath::new(vec![Vec2::new(5.0, 5.0)], PatrolMode::Loop);
        let mut ctl = BehaviorController::new(basic_profile(), path);
        let body = body_at(Vec2::new(50.0, 50.0));
        for _ in 0..10 {
            let (intent, _) = ctl.step(&body, 80.0, false, None, DT);
            assert_eq!(intent.velocity, Vec2::ZERO);
        }
    }

    #[test]
    fn test_detection_then_cloak_reverts_to_patrol() {
        let mut ctl = BehaviorController::new(basic_profile(), PatrolPath::stationary());
        let body = body_at(Vec2::ZERO);
        let near = Sight {
            center: Vec2::new(60.0, 10.0),
            detectable: true,
        };

        let (_, t) = ctl.step(&body, 50.0, false, Some(near), DT);
        assert_eq!(
            t,
            Some(Transition {
                from: BehaviorMode::Patrol,
                to: BehaviorMode::Chase
            })
        );

        let cloaked = Sight {
            detectable: false,
            ..near
        };
        ctl.step(&body, 50.0, false, Some(cloaked), DT);
        assert_eq!(ctl.mode(), BehaviorMode::Patrol);
    }

    #[test]
    fn test_chase_uses_disengage_hysteresis() {
        let mut ctl = BehaviorController::new(basic_profile(), PatrolPath::stationary());
        let center = Vec2::new(10.0, 10.0);
        let at = |d: f32| Sight {
            center: center + Vec2::new(d, 0.0),
            detectable: true,
        };

        ctl.update_state(center, false, Some(at(150.0)));
        assert_eq!(ctl.mode(), BehaviorMode::Patrol);

        ctl.update_state(center, false, Some(at(90.0)));
        assert_eq!(ctl.mode(), BehaviorMode::Chase);

        // Between detection and disengage: keep chasing
        ctl.update_state(center, false, Some(at(150.0)));
        assert_eq!(ctl.mode(), BehaviorMode::Chase);

        ctl.update_state(center, false, Some(at(250.0)));
        assert_eq!(ctl.mode(), BehaviorMode::Patrol);
    }

    #[test]
    fn test_stun_beats_chase_and_times_out_to_patrol() {
        let mut ctl = BehaviorController::new(basic_profile(), PatrolPath::stationary());
        let center = Vec2::ZERO;
        let near = Sight {
            center: Vec2::new(20.0, 0.0),
            detectable: true,
        };

        ctl.update_state(center, true, Some(near));
        assert_eq!(ctl.mode(), BehaviorMode::Stunned);
        let intent = ctl.intent(&body_at(Vec2::ZERO), 100.0, DT);
        assert_eq!(intent.velocity, Vec2::ZERO);

        ctl.update_state(center, false, Some(near));
        assert_eq!(ctl.mode(), BehaviorMode::Patrol);
    }

    #[test]
    fn test_ranged_attack_fires_periodically() {
        let ranged = RangedProfile {
            interval: 0.5,
            projectile_speed: 200.0,
            damage: 5.0,
            projectile_size: 6.0,
            projectile_lifetime: 2.0,
        };
        let mut ctl = BehaviorController::new(
            BehaviorProfile::new(300.0, 400.0, Some(ranged)),
            PatrolPath::stationary(),
        );
        let body = body_at(Vec2::ZERO);
        let sight = Sight {
            center: Vec2::new(110.0, 10.0),
            detectable: true,
        };

        let mut shots = Vec::new();
        for _ in 0..120 {
            let (intent, _) = ctl.step(&body, 50.0, false, Some(sight), DT);
            assert_eq!(intent.velocity, Vec2::ZERO);
            if let Some(dir) = intent.fire {
                shots.push(dir);
            }
        }
        assert_eq!(ctl.mode(), BehaviorMode::RangedAttack);
        assert_eq!(shots.len(), 4);
        assert!((shots[0] - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_chase_moves_toward_player() {
        let mut ctl = BehaviorController::new(basic_profile(), PatrolPath::stationary());
        let body = body_at(Vec2::ZERO);
        let sight = Sight {
            center: Vec2::new(10.0, 70.0),
            detectable: true,
        };
        let (intent, _) = ctl.step(&body, 60.0, false, Some(sight), DT);
        assert!((intent.velocity - Vec2::new(0.0, 60.0)).length() < 1e-4);
    }
}
