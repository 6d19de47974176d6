//! Cameras: the follow controller and the fixed debug overview.
//!
//! # Invariants
//! - While following, the camera's X lies inside the movable area.
//! - The orbit rotation advances by the fixed frame step, never wall-clock time.
//! - A controller cannot update without a target; the target is borrowed per call.

mod controller;
mod debug;

pub use controller::{CameraController, CameraSettings, CameraState, FollowTarget};
pub use debug::DebugCamera;
