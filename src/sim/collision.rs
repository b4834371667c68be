//! Integration and collision response for axis-aligned boxes
//!
//! Movers are integrated, clamped to the world, then pushed out of every
//! solid they overlap along the axis of least penetration.

use glam::Vec2;

use super::aabb::Aabb;
use super::entity::Entity;
use crate::sanitize_dt;

/// Walls of the world an integration step ran into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldHits {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    /// The world floor (largest y)
    pub bottom: bool,
}

impl WorldHits {
    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

/// Outcome of pushing one mover out of the solids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Horizontal velocity was zeroed against a solid
    pub blocked_x: bool,
    /// Vertical velocity was zeroed against a solid
    pub blocked_y: bool,
    /// Pushed up onto the top of a solid
    pub landed: bool,
    /// No clean position was found; the mover went back to where it started the frame
    pub reverted: bool,
}

/// Move an entity by its velocity and keep it inside the world.
///
/// Velocity pointing into a wall that was hit is zeroed.
pub fn integrate(entity: &mut Entity, dt: f32, world: Vec2) -> WorldHits {
    let dt = sanitize_dt(dt);
    entity.aabb.pos += entity.vel * dt;

    let [left, right, top, bottom] = entity.aabb.clamp_within(world);
    if (left && entity.vel.x < 0.0) || (right && entity.vel.x > 0.0) {
        entity.vel.x = 0.0;
    }
    if (top && entity.vel.y < 0.0) || (bottom && entity.vel.y > 0.0) {
        entity.vel.y = 0.0;
    }

    WorldHits {
        left,
        right,
        top,
        bottom,
    }
}

/// Push `moving` out of every overlapping solid.
///
/// Each overlap is resolved along its shallower axis only, zeroing that
/// velocity component. Equal depths resolve vertically so corner contacts
/// land instead of snagging. If the mover still overlaps something
/// afterwards it is put back at `previous` with zero velocity. `previous`
/// is the position before integration, not the integrated position this
/// call started from: the integrated position is the one that overlapped,
/// so it is never a safe place to fall back to.
pub fn resolve(moving: &mut Entity, previous: Vec2, solids: &[Aabb], world: Vec2) -> Resolution {
    let mut res = Resolution::default();

    for solid in solids {
        let Some(pen) = moving.aabb.penetration(solid) else {
            continue;
        };

        let center = moving.aabb.center();
        let solid_center = solid.center();
        if pen.y <= pen.x {
            if center.y < solid_center.y {
                moving.aabb.pos.y -= pen.y;
                res.landed = true;
            } else {
                moving.aabb.pos.y += pen.y;
            }
            moving.vel.y = 0.0;
            res.blocked_y = true;
        } else {
            if center.x < solid_center.x {
                moving.aabb.pos.x -= pen.x;
            } else {
                moving.aabb.pos.x += pen.x;
            }
            moving.vel.x = 0.0;
            res.blocked_x = true;
        }
    }

    if res.blocked_x || res.blocked_y {
        moving.aabb.clamp_within(world);
        if solids.iter().any(|s| moving.aabb.overlaps(s)) {
            moving.aabb.pos = previous;
            moving.vel = Vec2::ZERO;
            res.landed = false;
            res.reverted = true;
        }
    }

    res
}

/// Index of the first solid that `aabb` overlaps
pub fn first_overlap(aabb: &Aabb, solids: &[Aabb]) -> Option<usize> {
    solids.iter().position(|s| aabb.overlaps(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{ObstacleKind, Role, Team};
    use proptest::prelude::*;

    const WORLD: Vec2 = Vec2::new(800.0, 600.0);

    fn mover(x: f32, y: f32) -> Entity {
        Entity::new(
            1,
            Aabb::new(x, y, 20.0, 20.0),
            Team::Neutral,
            Role::Obstacle(ObstacleKind::Unknown("crate".into())),
            10.0,
        )
    }

    #[test]
    fn test_integrate_clamps_and_zeroes_velocity() {
        let mut e = mover(790.0, 100.0);
        e.vel = Vec2::new(600.0, 60.0);
        let hits = integrate(&mut e, 1.0 / 60.0, WORLD);
        assert!(hits.right);
        assert!(!hits.bottom);
        assert_eq!(e.aabb.pos.x, 780.0);
        assert_eq!(e.vel.x, 0.0);
        assert_eq!(e.vel.y, 60.0);
    }

    #[test]
    fn test_side_push_out() {
        // Mover overlaps the left side of the wall by 4px horizontally, 15px vertically
        let wall = Aabb::new(100.0, 100.0, 50.0, 50.0);
        let mut e = mover(84.0, 95.0);
        e.vel = Vec2::new(100.0, 10.0);
        let res = resolve(&mut e, Vec2::new(80.0, 95.0), &[wall], WORLD);
        assert!(res.blocked_x);
        assert!(!res.blocked_y);
        assert_eq!(e.aabb.pos.x, 80.0);
        assert_eq!(e.vel, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_landing_on_top() {
        let floor = Aabb::new(0.0, 300.0, 400.0, 20.0);
        let mut e = mover(100.0, 285.0);
        e.vel = Vec2::new(50.0, 300.0);
        let res = resolve(&mut e, Vec2::new(100.0, 275.0), &[floor], WORLD);
        assert!(res.landed);
        assert_eq!(e.aabb.bottom(), 300.0);
        assert_eq!(e.vel.y, 0.0);
        assert_eq!(e.vel.x, 50.0);
    }

    #[test]
    fn test_equal_penetration_resolves_vertically() {
        let solid = Aabb::new(100.0, 100.0, 50.0, 50.0);
        let mut e = mover(85.0, 85.0);
        e.vel = Vec2::new(30.0, 30.0);
        let res = resolve(&mut e, Vec2::new(80.0, 80.0), &[solid], WORLD);
        assert!(res.blocked_y);
        assert!(!res.blocked_x);
        assert!(res.landed);
        assert_eq!(e.aabb.pos, Vec2::new(85.0, 80.0));
    }

    #[test]
    fn test_wedged_mover_reverts_to_previous() {
        // Pushing out of one solid lands it inside the other
        let a = Aabb::new(100.0, 100.0, 20.0, 40.0);
        let b = Aabb::new(100.0, 75.0, 20.0, 25.0);
        let mut e = mover(100.0, 90.0);
        e.vel = Vec2::new(0.0, 50.0);
        let previous = Vec2::new(60.0, 90.0);
        let res = resolve(&mut e, previous, &[a, b], WORLD);
        assert!(res.reverted);
        assert_eq!(e.aabb.pos, previous);
        assert_eq!(e.vel, Vec2::ZERO);
    }

    #[test]
    fn test_touching_is_not_blocked() {
        let wall = Aabb::new(120.0, 100.0, 50.0, 50.0);
        let mut e = mover(100.0, 100.0);
        e.vel = Vec2::new(10.0, 0.0);
        let res = resolve(&mut e, Vec2::new(99.0, 100.0), &[wall], WORLD);
        assert_eq!(res, Resolution::default());
        assert_eq!(e.vel.x, 10.0);
    }

    #[test]
    fn test_first_overlap() {
        let solids = [Aabb::new(0.0, 0.0, 5.0, 5.0), Aabb::new(50.0, 50.0, 10.0, 10.0)];
        let point = Aabb::new(55.0, 55.0, 2.0, 2.0);
        assert_eq!(first_overlap(&point, &solids), Some(1));
        assert_eq!(first_overlap(&Aabb::new(30.0, 30.0, 2.0, 2.0), &solids), None);
    }

    proptest! {
        #[test]
        fn prop_single_overlap_is_order_independent(
            dx in -15.0f32..45.0,
            dy in -15.0f32..45.0,
            vx in -200.0f32..200.0,
            vy in -200.0f32..200.0,
            rotation in 0usize..4,
        ) {
            let hit = Aabb::new(300.0, 300.0, 30.0, 30.0);
            let mut solids = vec![
                hit,
                Aabb::new(10.0, 10.0, 40.0, 40.0),
                Aabb::new(600.0, 50.0, 40.0, 200.0),
                Aabb::new(50.0, 500.0, 300.0, 20.0),
            ];

            let start = Vec2::new(300.0 + dx - 10.0, 300.0 + dy - 10.0);
            let mut base = mover(start.x, start.y);
            base.vel = Vec2::new(vx, vy);
            let previous = start - Vec2::new(vx, vy) / 60.0;

            let mut a = base.clone();
            let res_a = resolve(&mut a, previous, &solids, WORLD);

            solids.rotate_left(rotation);
            let mut b = base.clone();
            let res_b = resolve(&mut b, previous, &solids, WORLD);

            prop_assert_eq!(res_a, res_b);
            prop_assert_eq!(a.aabb, b.aabb);
            prop_assert_eq!(a.vel, b.vel);
        }
    }
}
