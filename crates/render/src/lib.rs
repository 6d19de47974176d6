//! Rendering adapter: the draw-submission seam between the core and a real renderer.
//!
//! # Invariants
//! - Draw submission only reads scene state.
//! - Device state never crosses this boundary.

mod renderer;

pub use renderer::{DrawCall, DrawLog, ModelHandle, Renderer, ViewProjection};
