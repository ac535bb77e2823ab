//! Persistence port for the room runtime.
//!
//! This crate defines the narrow set of operations the spec names in §6
//! (`getWorld`, `getCharacter`, `createCharacter`, `saveAll`) as a trait
//! object port, plus a Postgres-backed adapter and an in-memory test
//! double. The room runtime (`tile-room-room`) depends only on the trait;
//! it never sees `sqlx` types directly, matching the "ports passed into
//! the room at construction" design note in the spec (§9).
//!
//! The relational schema itself — migrations, indices, the `WorldAdmin`
//! HTTP surface that creates/lists/deletes worlds — is out of scope here;
//! this crate only implements the operations the room consumes.

#![deny(unsafe_code)]

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::InMemoryPersistenceStore;
pub use models::{CharacterRow, WorldSaveRow};
pub use postgres::PgPersistenceStore;
pub use store::{PersistenceError, PersistenceStore};
