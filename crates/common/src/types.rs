use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Fixed simulation step in seconds. The core assumes one update per frame at 60 Hz.
pub const FRAME_DT: f32 = 1.0 / 60.0;

/// Spatial transform: scale, Euler rotation, translation, and the derived world matrix.
///
/// `world_matrix` is only refreshed by [`Transform::update_matrix`]; mutating the
/// components leaves it stale until the next call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub translation: Vec3,
    #[serde(skip, default = "identity")]
    pub world_matrix: Mat4,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
            world_matrix: Mat4::IDENTITY,
        }
    }
}

impl Transform {
    /// Transform at `translation` with its matrix already computed.
    pub fn at(translation: Vec3) -> Self {
        let mut t = Self {
            translation,
            ..Self::default()
        };
        t.update_matrix();
        t
    }

    /// Rotation as a quaternion (X first, then Y, then Z).
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::ZYX, self.rotation.z, self.rotation.y, self.rotation.x)
    }

    /// Recompute `world_matrix` as scale, then rotation, then translation.
    pub fn update_matrix(&mut self) {
        self.world_matrix =
            Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.translation);
    }

    /// World-space position as of the last `update_matrix` call.
    pub fn world_position(&self) -> Vec3 {
        self.world_matrix.w_axis.truncate()
    }
}

/// Axis-aligned bounding box used for entity-vs-entity broad phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Overlap test. Touching faces count as a hit.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Axis-aligned rectangle on the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Rect {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}
