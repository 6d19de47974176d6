use std::collections::BTreeMap;

use flipstage_common::Transform;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque handle to a model owned by the external resource loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelHandle(pub u32);

/// View and projection matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewProjection {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for ViewProjection {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl ViewProjection {
    /// Perspective projection used by every in-game camera.
    pub fn perspective(view: Mat4) -> Self {
        Self {
            view,
            projection: Mat4::perspective_lh(45.0_f32.to_radians(), 1280.0 / 720.0, 0.1, 1000.0),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Camera position recovered from the view matrix.
    pub fn eye(&self) -> Vec3 {
        self.view.inverse().w_axis.truncate()
    }
}

/// Renderer collaborator. Implementations own all device state; the core only
/// submits `(transform, view projection, model)` triples during the draw pass.
pub trait Renderer {
    fn draw(&mut self, transform: &Transform, view_projection: &ViewProjection, model: ModelHandle);
}

/// A recorded draw submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub model: ModelHandle,
    pub world_matrix: Mat4,
    pub view_projection: ViewProjection,
}

impl DrawCall {
    pub fn position(&self) -> Vec3 {
        self.world_matrix.w_axis.truncate()
    }
}

/// Renderer that records submissions instead of drawing.
///
/// Used by the headless CLI and by tests that assert on what a frame drew.
#[derive(Debug, Default)]
pub struct DrawLog {
    calls: Vec<DrawCall>,
}

impl DrawLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn count(&self, model: ModelHandle) -> usize {
        self.calls.iter().filter(|c| c.model == model).count()
    }

    /// Human-readable per-model tally of the recorded frame.
    pub fn summary(&self) -> String {
        let mut per_model: BTreeMap<ModelHandle, usize> = BTreeMap::new();
        for call in &self.calls {
            *per_model.entry(call.model).or_default() += 1;
        }

        let mut out = String::new();
        out.push_str(&format!("=== Frame ({} draw calls) ===\n", self.calls.len()));
        if let Some(first) = self.calls.first() {
            let eye = first.view_projection.eye();
            out.push_str(&format!("Camera: eye=({:.2}, {:.2}, {:.2})\n", eye.x, eye.y, eye.z));
        }
        for (model, count) in per_model {
            out.push_str(&format!("  model {:>3}: {count}\n", model.0));
        }
        out
    }
}

impl Renderer for DrawLog {
    fn draw(&mut self, transform: &Transform, view_projection: &ViewProjection, model: ModelHandle) {
        tracing::trace!(model = model.0, "draw");
        self.calls.push(DrawCall {
            model,
            world_matrix: transform.world_matrix,
            view_projection: *view_projection,
        });
    }
}
