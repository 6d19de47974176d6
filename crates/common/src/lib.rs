//! Shared types for the flipstage core: transforms, bounding boxes, rectangles.
//!
//! # Invariants
//! - A transform's world matrix reflects its components as of the last update.
//! - Time only advances in fixed [`FRAME_DT`] steps.

mod types;

pub use types::{Aabb, FRAME_DT, Rect, Transform};
