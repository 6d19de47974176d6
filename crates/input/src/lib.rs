//! Input: keyboard state queries mapped to gameplay actions.
//!
//! # Invariants
//! - The scene reads actions through [`KeyBindings`], never platform key codes.
//! - A press edge is visible for exactly one frame.

pub mod action;
mod keyboard;

pub use action::{Action, KeyBindings};
pub use keyboard::{InputSource, Key, KeyboardState, UnknownKey};
