//! World simulation engine.
//!
//! This crate implements the bounded 2D grid where grazers and hunters move,
//! hunt, reproduce and die, one discrete step at a time.

pub mod behavior;
pub mod checkpoint;
pub mod entity;
pub mod grid;
pub mod random;
pub mod render;
pub mod stats;
pub mod world;

pub use checkpoint::Checkpoint;
pub use entity::Entity;
pub use grid::{Grid, Occupant};
pub use random::{RandomSource, Sequential};
pub use render::{render, Frame};
pub use stats::{Census, DeathTally, StepReport};
pub use world::{Snapshot, World};
