use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Movement tuning shared by every body in the scene. Per-frame units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity; a sixtieth of it is added to the fall speed each frame.
    pub gravity_acceleration: f32,
    pub limit_fall_speed: f32,
    /// Horizontal speed gained per frame while a direction is held.
    pub acceleration: f32,
    /// Fraction of horizontal speed lost per frame with no direction held.
    pub attenuation: f32,
    pub limit_run_speed: f32,
    /// Jump strength; a sixtieth of it becomes the take-off speed.
    pub jump_acceleration: f32,
    /// How far past the top or bottom of the map a player may go before dying.
    pub kill_margin: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity_acceleration: 0.98,
            limit_fall_speed: 0.5,
            acceleration: 0.01,
            attenuation: 0.05,
            limit_run_speed: 0.3,
            jump_acceleration: 20.0,
            kill_margin: 5.0,
        }
    }
}

/// Scene-owned physics state handed to every entity update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsState {
    pub config: PhysicsConfig,
    gravity_sign: f32,
}

impl PhysicsState {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            gravity_sign: 1.0,
        }
    }

    /// `+1.0` pulls toward -Y, `-1.0` toward +Y.
    pub fn gravity_sign(&self) -> f32 {
        self.gravity_sign
    }

    /// Reverse gravity and return the new sign.
    pub fn flip_gravity(&mut self) -> f32 {
        self.gravity_sign = -self.gravity_sign;
        self.gravity_sign
    }

    /// Unit vector gravity pulls along.
    pub fn pull(&self) -> Vec3 {
        Vec3::new(0.0, -self.gravity_sign, 0.0)
    }

    /// Velocity change gravity applies in one frame.
    pub fn gravity_step(&self) -> Vec3 {
        self.pull() * (self.config.gravity_acceleration / 60.0)
    }

    /// Take-off velocity of a jump, against the pull.
    pub fn jump_velocity(&self) -> Vec3 {
        -self.pull() * (self.config.jump_acceleration / 60.0)
    }

    /// Limit the speed along the pull to the fall-speed cap.
    pub fn limit_fall(&self, velocity: Vec3) -> Vec3 {
        let along = velocity.y * -self.gravity_sign;
        if along > self.config.limit_fall_speed {
            Vec3::new(
                velocity.x,
                -self.gravity_sign * self.config.limit_fall_speed,
                velocity.z,
            )
        } else {
            velocity
        }
    }
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}
