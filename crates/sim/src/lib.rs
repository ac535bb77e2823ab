//! Tile Room Simulation Core
//!
//! This crate is the deterministic heart of the room runtime: the immutable
//! tile map and the pure movement evaluator both client prediction and
//! server authority must agree on bit-for-bit.
//!
//! # Isolation
//!
//! This crate MUST NOT perform I/O, read wall-clock time, or use ambient
//! randomness. Every function here is pure and total with respect to its
//! arguments. All scheduling, persistence, and networking concerns live in
//! `tile-room-room` and above.

#![deny(unsafe_code)]

pub mod map;
pub mod movement;

pub use map::{MapError, MapModel, TileKind};
pub use movement::{evaluate, Direction};

/// Tile-grid x/y coordinate. Always non-negative; bounds are enforced by
/// [`MapModel`].
pub type Coord = u32;
