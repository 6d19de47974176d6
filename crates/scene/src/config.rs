use std::path::Path;

use flipstage_actor::{EnemySettings, ParticleSettings, PhysicsConfig, PlayerSettings};
use flipstage_camera::{CameraSettings, DebugCamera};
use flipstage_common::Rect;
use flipstage_input::KeyBindings;
use flipstage_map::{IndexSet, InvertMode, MapChipField};
use flipstage_render::ModelHandle;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Errors from loading or checking a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid scene config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSection {
    pub cell_size: Vec2,
    /// World position of cell (0, 0). Defaults to putting the bottom row at y = 0.
    pub origin: Option<Vec3>,
    pub invert_mode: InvertMode,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            cell_size: MapChipField::DEFAULT_CELL_SIZE,
            origin: None,
            invert_mode: InvertMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSection {
    pub spawn: IndexSet,
    #[serde(flatten)]
    pub settings: PlayerSettings,
}

impl Default for PlayerSection {
    fn default() -> Self {
        Self {
            spawn: IndexSet::new(1, 18),
            settings: PlayerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySection {
    pub spawns: Vec<IndexSet>,
    #[serde(flatten)]
    pub settings: EnemySettings,
}

impl Default for EnemySection {
    fn default() -> Self {
        Self {
            spawns: vec![IndexSet::new(17, 18), IndexSet::new(14, 16)],
            settings: EnemySettings::default(),
        }
    }
}

/// Camera tuning. A missing movable area is derived from the map width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    pub offset: Vec3,
    pub interpolation_rate: f32,
    pub velocity_bias: f32,
    pub margin: Rect,
    pub movable_area: Option<Rect>,
    pub rotation_duration: f32,
}

impl Default for CameraSection {
    fn default() -> Self {
        let base = CameraSettings::default();
        Self {
            offset: base.offset,
            interpolation_rate: base.interpolation_rate,
            velocity_bias: base.velocity_bias,
            margin: base.margin,
            movable_area: None,
            rotation_duration: base.rotation_duration,
        }
    }
}

impl CameraSection {
    /// Horizontal room left at the right edge of the level.
    pub const RIGHT_EDGE_ROOM: f32 = 12.0;

    pub fn settings_for(&self, map: &MapChipField) -> CameraSettings {
        let movable_area = self.movable_area.unwrap_or_else(|| {
            let width = map.width() as f32 * map.cell_size().x;
            Rect::new(0.0, width - Self::RIGHT_EDGE_ROOM, 6.0, 6.0)
        });
        CameraSettings {
            offset: self.offset,
            interpolation_rate: self.interpolation_rate,
            velocity_bias: self.velocity_bias,
            margin: self.margin,
            movable_area,
            rotation_duration: self.rotation_duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugCameraSection {
    /// Whether the debug view starts active.
    pub enabled: bool,
    #[serde(flatten)]
    pub camera: DebugCamera,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelHandles {
    pub player: ModelHandle,
    pub enemy: ModelHandle,
    pub block: ModelHandle,
    pub block2: ModelHandle,
    pub particle: ModelHandle,
    pub skydome: ModelHandle,
}

impl Default for ModelHandles {
    fn default() -> Self {
        Self {
            player: ModelHandle(0),
            enemy: ModelHandle(1),
            block: ModelHandle(2),
            block2: ModelHandle(3),
            particle: ModelHandle(4),
            skydome: ModelHandle(5),
        }
    }
}

/// Everything a [`crate::GameScene`] needs besides the map itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub map: MapSection,
    pub physics: PhysicsConfig,
    pub player: PlayerSection,
    pub enemies: EnemySection,
    pub camera: CameraSection,
    pub particles: ParticleSettings,
    pub bindings: KeyBindings,
    pub debug_camera: DebugCameraSection,
    pub models: ModelHandles,
}

impl SceneConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "scene config loaded");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, value: f32| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")))
            }
        };

        positive("map.cell_size.x", self.map.cell_size.x)?;
        positive("map.cell_size.y", self.map.cell_size.y)?;
        positive("physics.limit_fall_speed", self.physics.limit_fall_speed)?;
        positive("physics.limit_run_speed", self.physics.limit_run_speed)?;
        positive("player.turn_time", self.player.settings.turn_time)?;
        positive("player.size.x", self.player.settings.size.x)?;
        positive("player.size.y", self.player.settings.size.y)?;
        positive("enemies.size.x", self.enemies.settings.size.x)?;
        positive("enemies.size.y", self.enemies.settings.size.y)?;
        positive("enemies.wobble_period", self.enemies.settings.wobble_period)?;
        positive("camera.rotation_duration", self.camera.rotation_duration)?;
        positive("particles.duration", self.particles.duration)?;

        if !(0.0..=1.0).contains(&self.physics.attenuation) {
            return Err(ConfigError::Invalid(format!(
                "physics.attenuation must lie in [0, 1], got {}",
                self.physics.attenuation
            )));
        }
        if self.particles.count == 0 {
            return Err(ConfigError::Invalid("particles.count must be at least 1".into()));
        }
        Ok(())
    }
}
