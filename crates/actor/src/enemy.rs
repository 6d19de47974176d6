use std::f32::consts::{PI, TAU};

use flipstage_common::{Aabb, FRAME_DT, Transform};
use flipstage_map::MapChipField;
use flipstage_render::{ModelHandle, Renderer, ViewProjection};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::physics::PhysicsState;
use crate::player::Player;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySettings {
    /// Horizontal speed per frame.
    pub walk_speed: f32,
    pub size: Vec3,
    /// Peak forward lean of the walk wobble, in radians.
    pub wobble_angle: f32,
    /// Seconds per wobble cycle.
    pub wobble_period: f32,
}

impl Default for EnemySettings {
    fn default() -> Self {
        Self {
            walk_speed: 0.02,
            size: Vec3::splat(0.8),
            wobble_angle: 30f32.to_radians(),
            wobble_period: 1.0,
        }
    }
}

/// A walker that paces back and forth, turning at walls.
#[derive(Debug, Clone)]
pub struct Enemy {
    settings: EnemySettings,
    body: Body,
    transform: Transform,
    /// `-1.0` walking left, `1.0` walking right.
    heading: f32,
    wobble_timer: f32,
    upside_down: bool,
}

impl Enemy {
    pub fn new(settings: EnemySettings, position: Vec3) -> Self {
        let mut enemy = Self {
            settings,
            body: Body::new(position, settings.size),
            transform: Transform::at(position),
            heading: -1.0,
            wobble_timer: 0.0,
            upside_down: false,
        };
        enemy.sync_transform();
        enemy
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn world_position(&self) -> Vec3 {
        self.body.position
    }

    pub fn aabb(&self) -> Aabb {
        self.body.aabb()
    }

    pub fn update(&mut self, map: &MapChipField, physics: &PhysicsState) {
        self.wobble_timer = (self.wobble_timer + FRAME_DT) % self.settings.wobble_period;

        self.body.velocity.x = self.heading * self.settings.walk_speed;
        self.body.velocity = physics.limit_fall(self.body.velocity + physics.gravity_step());
        let contacts = self.body.move_and_collide(map, physics);
        if contacts.wall() {
            self.heading = -self.heading;
            tracing::trace!(heading = self.heading, "enemy turned at wall");
        }

        self.sync_transform();
    }

    /// Contact with the player. The enemy itself is unaffected.
    pub fn on_collision(&self, player: &Player) {
        tracing::trace!(player = ?player.aabb().center(), enemy = ?self.body.position, "enemy touched player");
    }

    /// Same pose and nudge rules as the player on a gravity flip.
    pub fn on_gravity_inverted(&mut self, new_gravity_sign: f32) {
        self.upside_down = !self.upside_down;
        self.body.position.y += new_gravity_sign;
        self.body.velocity = Vec3::ZERO;
        self.sync_transform();
    }

    pub fn relocate(&mut self, position: Vec3) {
        self.body.position = position;
        self.sync_transform();
    }

    fn sync_transform(&mut self) {
        let phase = TAU * self.wobble_timer / self.settings.wobble_period;
        self.transform.translation = self.body.position;
        self.transform.rotation.x = self.settings.wobble_angle * phase.sin();
        self.transform.rotation.y = if self.heading > 0.0 { PI / 2.0 } else { PI * 3.0 / 2.0 };
        self.transform.rotation.z = if self.upside_down { PI } else { 0.0 };
        self.transform.update_matrix();
    }

    pub fn draw(&self, renderer: &mut impl Renderer, view_projection: &ViewProjection, model: ModelHandle) {
        renderer.draw(&self.transform, view_projection, model);
    }
}
