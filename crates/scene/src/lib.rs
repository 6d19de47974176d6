//! The game scene: per-frame orchestration of map, actors and cameras.
//!
//! # Frame order
//! 1. phase transition check
//! 2. player
//! 3. particles while dying, otherwise enemies and the follow camera
//! 4. block transform refresh
//! 5. player vs enemy contacts
//! 6. debug camera toggle and view selection
//! 7. map inversion on its trigger
//!
//! # Invariants
//! - Phases only move `Playing -> Dying -> Finished`; `Finished` is terminal.
//! - The gravity sign lives in the scene and is lent to every actor update.
//! - A block transform exists exactly for each solid cell.
//! - Drawing never mutates the scene.

mod blocks;
pub mod config;
mod phase;
mod scene;

pub use blocks::BlockTransforms;
pub use config::{ConfigError, SceneConfig};
pub use phase::{Phase, PhaseSignals};
pub use scene::{GameScene, SceneError, SceneEvent};
