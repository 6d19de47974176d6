use flipstage_render::ViewProjection;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Fixed overview camera swapped in by the debug toggle. It has no controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugCamera {
    pub eye: Vec3,
    pub target: Vec3,
}

impl Default for DebugCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(50.0, 10.0, -80.0),
            target: Vec3::new(50.0, 10.0, 0.0),
        }
    }
}

impl DebugCamera {
    pub fn view_projection(&self) -> ViewProjection {
        ViewProjection::perspective(Mat4::look_at_lh(self.eye, self.target, Vec3::Y))
    }
}
