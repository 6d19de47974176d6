//! Actors: the player, the enemy walkers and the death burst.
//!
//! Every body shares one integration step ([`Body::move_and_collide`]) against
//! the map grid, driven by a [`PhysicsState`] the scene owns and lends out.
//!
//! # Invariants
//! - Collision resolves X first, then Y.
//! - A body never ends a frame overlapping a cell it entered that frame.
//! - "Ground" is the side gravity currently pulls toward.
//! - A dead player neither moves nor draws.

mod body;
mod enemy;
mod particles;
mod physics;
mod player;

pub use body::{Body, Contacts};
pub use enemy::{Enemy, EnemySettings};
pub use particles::{DeathParticles, ParticleSettings};
pub use physics::{PhysicsConfig, PhysicsState};
pub use player::{Facing, Player, PlayerSettings};
