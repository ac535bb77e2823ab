//! Shared identifier aliases for the room runtime.

/// Session identifier, assigned by the gateway at join.
pub type SessionId = u64;

/// Authenticated account identity, decoded from the bearer token.
pub type AccountId = i64;

/// Character row identity in persistence.
pub type CharacterId = i64;

/// World save identity (persistence primary key).
pub type WorldId = String;
