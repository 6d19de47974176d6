use flipstage_common::Aabb;
use flipstage_map::{Direction, MapChipField};
use glam::Vec3;

use crate::physics::PhysicsState;

/// Cells whose entry face lies this far behind the leading edge are ones the
/// body already overlapped before moving; they are ignored so a body that ends
/// up inside a block after an inversion can walk out of it.
const ENTRY_TOLERANCE: f32 = 1e-3;

/// Which sides met the map during one [`Body::move_and_collide`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Contacts {
    /// Hit along the gravity pull.
    pub ground: bool,
    /// Hit against the gravity pull.
    pub ceiling: bool,
    pub wall_left: bool,
    pub wall_right: bool,
}

impl Contacts {
    pub fn wall(&self) -> bool {
        self.wall_left || self.wall_right
    }
}

/// Kinematic box moved against the map grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub half_extents: Vec3,
}

impl Body {
    pub fn new(position: Vec3, size: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            half_extents: size * 0.5,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(self.position, self.half_extents)
    }

    /// Integrate velocity and resolve against solid cells.
    ///
    /// X is resolved before Y. At a convex corner this lets a body sliding
    /// sideways along the top of a ledge stay on it instead of being pushed out
    /// horizontally.
    pub fn move_and_collide(&mut self, map: &MapChipField, physics: &PhysicsState) -> Contacts {
        let mut contacts = Contacts::default();

        if self.velocity.x != 0.0 {
            let dir = if self.velocity.x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            };
            if self.step_axis(map, 0, dir) {
                match dir {
                    Direction::Right => contacts.wall_right = true,
                    _ => contacts.wall_left = true,
                }
            }
        }

        if self.velocity.y != 0.0 {
            let dir = if self.velocity.y > 0.0 {
                Direction::Up
            } else {
                Direction::Down
            };
            if self.step_axis(map, 1, dir) {
                let along_pull = (dir == Direction::Down) == (physics.gravity_sign() > 0.0);
                if along_pull {
                    contacts.ground = true;
                } else {
                    contacts.ceiling = true;
                }
            }
        }

        self.position.z += self.velocity.z;
        contacts
    }

    /// Move along one axis and snap to the nearest entered cell face.
    /// Returns whether a face was hit; the velocity on that axis is zeroed then.
    fn step_axis(&mut self, map: &MapChipField, axis: usize, dir: Direction) -> bool {
        let forward = matches!(dir, Direction::Right | Direction::Up);
        let half = self.half_extents[axis];
        let leading_before = if forward {
            self.position[axis] + half
        } else {
            self.position[axis] - half
        };

        self.position[axis] += self.velocity[axis];

        let entered = map.blocks_overlapping(&self.aabb(), dir).into_iter().find(|hit| {
            if forward {
                hit.boundary >= leading_before - ENTRY_TOLERANCE
            } else {
                hit.boundary <= leading_before + ENTRY_TOLERANCE
            }
        });

        let Some(hit) = entered else {
            return false;
        };
        self.position[axis] = if forward {
            hit.boundary - half
        } else {
            hit.boundary + half
        };
        self.velocity[axis] = 0.0;
        tracing::trace!(axis, ?dir, cell = ?hit.index, "body hit block");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Bottom row at world y = 0 (top face 0.5). Wall at column 4.
    const LEVEL: &str = "\
0,0,0,0,0,0
0,0,0,0,1,0
0,0,0,0,1,0
0,0,0,0,0,0
1,1,1,1,1,1
";

    fn level() -> MapChipField {
        MapChipField::parse(LEVEL).unwrap()
    }

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(Vec3::new(x, y, 0.0), Vec3::splat(0.8))
    }

    #[test]
    fn falling_body_lands_on_floor() {
        let map = level();
        let physics = PhysicsState::default();
        let mut b = body_at(1.0, 1.0);
        b.velocity.y = -0.3;
        let c = b.move_and_collide(&map, &physics);
        assert!(c.ground);
        assert!((b.position.y - 0.9).abs() < 1e-5);
        assert_eq!(b.velocity.y, 0.0);
    }

    #[test]
    fn free_fall_without_contact() {
        let map = level();
        let physics = PhysicsState::default();
        let mut b = body_at(1.0, 2.0);
        b.velocity.y = -0.2;
        let c = b.move_and_collide(&map, &physics);
        assert_eq!(c, Contacts::default());
        assert!((b.position.y - 1.8).abs() < 1e-5);
    }

    #[test]
    fn wall_stops_horizontal_motion() {
        let map = level();
        let physics = PhysicsState::default();
        // Wall cells (4,1) and (4,2) span world y 1.5..3.5 and x 3.5..4.5.
        let mut b = body_at(3.0, 2.5);
        b.velocity.x = 0.3;
        let c = b.move_and_collide(&map, &physics);
        assert!(c.wall_right && !c.wall_left);
        assert!((b.position.x - 3.1).abs() < 1e-5);
        assert_eq!(b.velocity.x, 0.0);
    }

    #[test]
    fn head_bump_is_a_ceiling_under_normal_gravity() {
        let map = level();
        let physics = PhysicsState::default();
        // Under the wall's bottom face at y = 1.5.
        let mut b = body_at(4.0, 0.95);
        b.velocity.y = 0.3;
        let c = b.move_and_collide(&map, &physics);
        assert!(c.ceiling && !c.ground);
        assert!((b.position.y - 1.1).abs() < 1e-5);
    }

    #[test]
    fn inverted_gravity_lands_on_ceiling() {
        let map = level();
        let mut physics = PhysicsState::default();
        physics.flip_gravity();
        let mut b = body_at(4.0, 0.95);
        b.velocity.y = 0.3;
        let c = b.move_and_collide(&map, &physics);
        assert!(c.ground && !c.ceiling);
    }

    #[test]
    fn horizontal_pass_runs_first_at_corners() {
        let map = level();
        let physics = PhysicsState::default();
        // Moving diagonally down-right onto the floor next to nothing: X is free,
        // then Y lands on the floor.
        let mut b = body_at(1.0, 0.95);
        b.velocity = Vec3::new(0.2, -0.2, 0.0);
        let c = b.move_and_collide(&map, &physics);
        assert!(c.ground && !c.wall());
        assert!((b.position.x - 1.2).abs() < 1e-5);
        assert!((b.position.y - 0.9).abs() < 1e-5);
    }

    #[test]
    fn embedded_body_can_leave_a_block() {
        let map = level();
        let physics = PhysicsState::default();
        // Centre inside the wall cell (4, 2); move left out of it.
        let mut b = body_at(4.0, 2.0);
        b.velocity.x = -0.3;
        let c = b.move_and_collide(&map, &physics);
        assert!(!c.wall_left);
        assert!((b.position.x - 3.7).abs() < 1e-5);
    }
}
