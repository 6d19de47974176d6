use std::f32::consts::TAU;

use flipstage_common::{FRAME_DT, Transform};
use flipstage_render::{ModelHandle, Renderer, ViewProjection};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    pub count: u32,
    /// Seconds until the effect reports finished.
    pub duration: f32,
    /// Outward distance per frame.
    pub speed: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            count: 8,
            duration: 2.0,
            speed: 0.05,
        }
    }
}

/// One-shot burst played where the player died.
///
/// Particles fan out evenly around the depth axis and fade over `duration`.
#[derive(Debug, Clone)]
pub struct DeathParticles {
    settings: ParticleSettings,
    particles: Vec<Transform>,
    timer: f32,
    finished: bool,
}

impl DeathParticles {
    pub fn new(settings: ParticleSettings, origin: Vec3) -> Self {
        let mut effect = Self {
            settings,
            particles: Vec::new(),
            timer: 0.0,
            finished: false,
        };
        effect.spawn(origin);
        effect
    }

    /// Restart the burst at `origin`.
    pub fn spawn(&mut self, origin: Vec3) {
        self.particles = (0..self.settings.count).map(|_| Transform::at(origin)).collect();
        self.timer = 0.0;
        self.finished = false;
        tracing::debug!(?origin, count = self.settings.count, "death particles spawned");
    }

    pub fn update(&mut self) {
        if self.finished {
            return;
        }

        self.timer += FRAME_DT;
        if self.timer >= self.settings.duration {
            self.timer = self.settings.duration;
            self.finished = true;
            tracing::debug!("death particles finished");
        }

        let step = TAU / self.settings.count.max(1) as f32;
        for (i, particle) in self.particles.iter_mut().enumerate() {
            let dir = Quat::from_rotation_z(step * i as f32) * Vec3::X;
            particle.translation += dir * self.settings.speed;
            particle.update_matrix();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Opacity, fading linearly from 1 to 0 over the duration.
    pub fn alpha(&self) -> f32 {
        (1.0 - self.timer / self.settings.duration).clamp(0.0, 1.0)
    }

    pub fn particles(&self) -> &[Transform] {
        &self.particles
    }

    pub fn draw(&self, renderer: &mut impl Renderer, view_projection: &ViewProjection, model: ModelHandle) {
        if self.finished {
            return;
        }
        for particle in &self.particles {
            renderer.draw(particle, view_projection, model);
        }
    }
}
