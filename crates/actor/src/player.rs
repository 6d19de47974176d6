use std::f32::consts::PI;

use flipstage_camera::FollowTarget;
use flipstage_common::{Aabb, FRAME_DT, Transform};
use flipstage_input::{Action, InputSource, KeyBindings};
use flipstage_map::MapChipField;
use flipstage_render::{ModelHandle, Renderer, ViewProjection};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::enemy::Enemy;
use crate::physics::PhysicsState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Full size of the collision box.
    pub size: Vec3,
    /// Seconds the facing turn takes.
    pub turn_time: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            size: Vec3::splat(0.8),
            turn_time: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Right,
    Left,
}

impl Facing {
    /// Yaw the model ends at when facing this way.
    pub fn yaw(self) -> f32 {
        match self {
            Facing::Right => PI / 2.0,
            Facing::Left => PI * 3.0 / 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    settings: PlayerSettings,
    body: Body,
    transform: Transform,
    facing: Facing,
    turn_start_yaw: f32,
    turn_timer: f32,
    on_ground: bool,
    upside_down: bool,
    alive: bool,
}

impl Player {
    pub fn new(settings: PlayerSettings, position: Vec3) -> Self {
        let facing = Facing::Right;
        let mut transform = Transform::at(position);
        transform.rotation.y = facing.yaw();
        transform.update_matrix();
        Self {
            settings,
            body: Body::new(position, settings.size),
            transform,
            facing,
            turn_start_yaw: facing.yaw(),
            turn_timer: 0.0,
            on_ground: false,
            upside_down: false,
            alive: true,
        }
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn is_upside_down(&self) -> bool {
        self.upside_down
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn aabb(&self) -> Aabb {
        self.body.aabb()
    }

    /// One frame of control, gravity and map collision. Frozen once dead.
    pub fn update(
        &mut self,
        input: &impl InputSource,
        bindings: &KeyBindings,
        map: &MapChipField,
        physics: &PhysicsState,
    ) {
        if !self.alive {
            return;
        }

        if self.on_ground {
            self.steer(input, bindings, physics);
            if bindings.is_active(input, Action::Jump) {
                self.body.velocity += physics.jump_velocity();
                tracing::trace!(velocity = ?self.body.velocity, "player jumped");
            }
        }

        self.body.velocity = physics.limit_fall(self.body.velocity + physics.gravity_step());
        let contacts = self.body.move_and_collide(map, physics);

        if contacts.ground != self.on_ground {
            tracing::trace!(on_ground = contacts.ground, "player ground state changed");
        }
        self.on_ground = contacts.ground;

        let bounds = map.world_bounds();
        let margin = physics.config.kill_margin;
        let y = self.body.position.y;
        if y < bounds.bottom - margin || y > bounds.top + margin {
            tracing::debug!(y, "player left the map");
            self.die();
        }

        self.advance_turn();
        self.sync_transform();
    }

    fn steer(&mut self, input: &impl InputSource, bindings: &KeyBindings, physics: &PhysicsState) {
        let cfg = &physics.config;
        let right = bindings.is_active(input, Action::MoveRight);
        let left = bindings.is_active(input, Action::MoveLeft);
        let v = &mut self.body.velocity;

        match (right, left) {
            (true, false) => {
                if v.x < 0.0 {
                    v.x *= 1.0 - cfg.attenuation;
                }
                v.x += cfg.acceleration;
                self.face(Facing::Right);
            }
            (false, true) => {
                if v.x > 0.0 {
                    v.x *= 1.0 - cfg.attenuation;
                }
                v.x -= cfg.acceleration;
                self.face(Facing::Left);
            }
            _ => v.x *= 1.0 - cfg.attenuation,
        }
        self.body.velocity.x = self
            .body
            .velocity
            .x
            .clamp(-cfg.limit_run_speed, cfg.limit_run_speed);
    }

    fn face(&mut self, facing: Facing) {
        if self.facing == facing {
            return;
        }
        self.facing = facing;
        self.turn_start_yaw = self.transform.rotation.y;
        self.turn_timer = self.settings.turn_time;
    }

    fn advance_turn(&mut self) {
        if self.turn_timer <= 0.0 {
            self.transform.rotation.y = self.facing.yaw();
            return;
        }
        self.turn_timer = (self.turn_timer - FRAME_DT).max(0.0);
        let t = 1.0 - self.turn_timer / self.settings.turn_time;
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.transform.rotation.y =
            self.turn_start_yaw + (self.facing.yaw() - self.turn_start_yaw) * eased;
    }

    fn sync_transform(&mut self) {
        self.transform.translation = self.body.position;
        self.transform.rotation.z = if self.upside_down { PI } else { 0.0 };
        self.transform.update_matrix();
    }

    /// Mark dead. Dead players neither move nor draw.
    pub fn die(&mut self) {
        if self.alive {
            self.alive = false;
            tracing::debug!(position = ?self.body.position, "player died");
        }
    }

    /// Touching an enemy is fatal.
    pub fn on_collision(&mut self, _enemy: &Enemy) {
        self.die();
    }

    /// React to a gravity flip: toggle the upside-down pose, nudge one unit
    /// along Y by the new gravity sign, and drop all momentum.
    pub fn on_gravity_inverted(&mut self, new_gravity_sign: f32) {
        self.upside_down = !self.upside_down;
        self.body.position.y += new_gravity_sign;
        self.body.velocity = Vec3::ZERO;
        self.on_ground = false;
        self.sync_transform();
    }

    /// Move to `position` without any collision check.
    pub fn relocate(&mut self, position: Vec3) {
        self.body.position = position;
        self.sync_transform();
    }

    pub fn draw(&self, renderer: &mut impl Renderer, view_projection: &ViewProjection, model: ModelHandle) {
        if self.alive {
            renderer.draw(&self.transform, view_projection, model);
        }
    }
}

impl FollowTarget for Player {
    fn world_position(&self) -> Vec3 {
        self.body.position
    }

    fn velocity(&self) -> Vec3 {
        self.body.velocity
    }
}
