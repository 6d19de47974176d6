use std::f32::consts::PI;

use flipstage_common::{FRAME_DT, Rect};
use flipstage_render::ViewProjection;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Anything the camera can follow.
pub trait FollowTarget {
    fn world_position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
}

/// Tuning for [`CameraController`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Resting offset from the target.
    pub offset: Vec3,
    /// Base per-update interpolation rate. X uses half of it, Y 30%, Z all of it.
    pub interpolation_rate: f32,
    /// How far ahead of the target, in frames of its velocity, the camera aims.
    pub velocity_bias: f32,
    /// Horizontal window relative to the target (`left`/`right` are used).
    pub margin: Rect,
    /// Absolute horizontal bounds (`left`/`right` are used).
    pub movable_area: Rect,
    /// Seconds taken by the orbit rotation.
    pub rotation_duration: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 0.0, -15.0),
            interpolation_rate: 0.1,
            velocity_bias: 30.0,
            margin: Rect::new(-9.0, 9.0, -5.0, 5.0),
            movable_area: Rect::new(0.0, 88.0, 6.0, 6.0),
            rotation_duration: 1.0,
        }
    }
}

/// Controller state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraState {
    Following,
    Rotating {
        timer: f32,
        initial_angle: f32,
        radius: f32,
        start_orientation: Quat,
    },
}

/// Follow camera for the side-scrolling view.
#[derive(Debug, Clone)]
pub struct CameraController {
    settings: CameraSettings,
    translation: Vec3,
    orientation: Quat,
    state: CameraState,
    view_projection: ViewProjection,
}

impl CameraController {
    pub fn new(settings: CameraSettings) -> Self {
        let mut camera = Self {
            settings,
            translation: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            state: CameraState::Following,
            view_projection: ViewProjection::default(),
        };
        camera.update_matrix();
        camera
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn set_movable_area(&mut self, area: Rect) {
        self.settings.movable_area = area;
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_rotating(&self) -> bool {
        matches!(self.state, CameraState::Rotating { .. })
    }

    /// Matrices as of the last `update` or `reset`.
    pub fn view_projection(&self) -> &ViewProjection {
        &self.view_projection
    }

    /// Snap onto `target + offset`, skipping the smoothing. Used on (re)spawn.
    pub fn reset(&mut self, target: &impl FollowTarget) {
        self.translation = target.world_position() + self.settings.offset;
        self.update_matrix();
    }

    /// Advance one frame.
    pub fn update(&mut self, target: &impl FollowTarget) {
        match self.state {
            CameraState::Following => self.follow(target),
            CameraState::Rotating { .. } => self.rotate(target),
        }
        self.update_matrix();
    }

    /// Begin the 180° orbit around `target`. Ignored while already rotating.
    pub fn start_rotation(&mut self, target: &impl FollowTarget) {
        if self.is_rotating() {
            return;
        }
        let delta = self.translation - target.world_position();
        let initial_angle = delta.z.atan2(delta.x);
        let radius = (delta.x * delta.x + delta.z * delta.z).sqrt();
        self.state = CameraState::Rotating {
            timer: 0.0,
            initial_angle,
            radius,
            start_orientation: self.orientation,
        };
        tracing::debug!(initial_angle, radius, "camera rotation started");
    }

    fn follow(&mut self, target: &impl FollowTarget) {
        let s = &self.settings;
        let target_pos = target.world_position();
        let dest = target_pos + s.offset + target.velocity() * s.velocity_bias;

        let rates = Vec3::new(
            s.interpolation_rate * 0.5,
            s.interpolation_rate * 0.3,
            s.interpolation_rate,
        );
        self.translation += (dest - self.translation) * rates;

        // Target-relative window first, then the absolute area. The area wins on conflict.
        let x = self
            .translation
            .x
            .max(target_pos.x + s.margin.left)
            .min(target_pos.x + s.margin.right);
        self.translation.x = x.max(s.movable_area.left).min(s.movable_area.right);
    }

    fn rotate(&mut self, target: &impl FollowTarget) {
        let CameraState::Rotating {
            timer,
            initial_angle,
            radius,
            start_orientation,
        } = self.state
        else {
            return;
        };

        let timer = timer + FRAME_DT;
        let t = (timer / self.settings.rotation_duration).clamp(0.0, 1.0);
        let angle = initial_angle + PI * t;

        let center = target.world_position();
        self.translation.x = center.x + angle.cos() * radius;
        self.translation.z = center.z + angle.sin() * radius;
        self.orientation = Quat::from_rotation_z(PI * t) * start_orientation;

        if t >= 1.0 {
            self.state = CameraState::Following;
            tracing::debug!("camera rotation finished");
        } else {
            self.state = CameraState::Rotating {
                timer,
                initial_angle,
                radius,
                start_orientation,
            };
        }
    }

    fn update_matrix(&mut self) {
        let world = Mat4::from_rotation_translation(self.orientation, self.translation);
        self.view_projection = ViewProjection::perspective(world.inverse());
    }
}
