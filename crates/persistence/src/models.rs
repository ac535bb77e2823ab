//! Row shapes consumed by the room runtime. The authoritative schema
//! (columns, indices, migrations) belongs to the store that owns
//! `world_saves`/`characters`; these structs are the subset of fields the
//! core cares about.

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

/// A row from `world_saves`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSaveRow {
    pub id: String,
    pub owner_account_id: i64,
    pub name: String,
    pub seed: i64,
    /// Opaque JSON blob; the room runtime round-trips it unread.
    pub world_data: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from `characters`. Unique on `(account_id, world_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRow {
    pub id: i64,
    pub account_id: i64,
    pub world_id: String,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
