//! Map-chip grid: the level layout the platformer runs on.
//!
//! # Invariants
//! - Grid dimensions never change after load.
//! - Cell `(x, y)` maps to exactly one world rectangle of the fixed cell size.
//! - Every [`InvertMode`] applied twice restores the original grid.

mod collision;
mod field;
pub mod layout;

pub use collision::{BlockHit, Direction};
pub use field::{IndexSet, InvertMode, MapChipField, MapChipType, MapError};
