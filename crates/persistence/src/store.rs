//! The `PersistenceStore` port.

use serde_json::Value as Json;

use crate::models::{CharacterRow, WorldSaveRow};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// A transient failure (connection drop, timeout, deadlock). The spec
    /// (§7) says this must not be fatal to the room: log at error and
    /// continue, accepting bounded data loss until the next successful
    /// save.
    #[error("transient persistence failure: {0}")]
    Transient(String),

    /// A fatal failure during `on_join` (e.g. character creation failed
    /// under a constraint violation not explained by a race). The spec
    /// says the *session* is closed but the room survives.
    #[error("persistence operation failed: {0}")]
    Fatal(String),
}

/// Narrow persistence surface the room runtime consumes. Schema ownership,
/// connection pooling, and retries are the adapter's concern; the room
/// only ever sees this trait.
#[async_trait::async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Look up a world save by id. `Ok(None)` means "not found", which the
    /// caller (room creation) must treat as a creation-rejected condition,
    /// not an error.
    async fn get_world(&self, world_id: &str) -> Result<Option<WorldSaveRow>, PersistenceError>;

    /// Look up the character for `(account_id, world_id)`.
    async fn get_character(
        &self,
        account_id: i64,
        world_id: &str,
    ) -> Result<Option<CharacterRow>, PersistenceError>;

    /// Create a character at the map's spawn point. Callers must not call
    /// this when a character already exists for `(account_id, world_id)`
    /// (unique constraint); a race between two joins of the same account
    /// is a persistence-fatal error for the losing join, per spec §5.
    async fn create_character(
        &self,
        account_id: i64,
        world_id: &str,
        name: &str,
        spawn_x: i32,
        spawn_y: i32,
    ) -> Result<CharacterRow, PersistenceError>;

    /// Persist `world_data` and every `(character_id, x, y)` pair in a
    /// single transaction: either everything commits, or nothing does
    /// (spec §6).
    async fn save_all(
        &self,
        world_id: &str,
        world_data: Json,
        characters: &[(i64, i32, i32)],
    ) -> Result<(), PersistenceError>;
}
