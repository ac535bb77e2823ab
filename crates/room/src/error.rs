//! Error taxonomy for the room runtime (spec §7), expressed as typed
//! enums the gateway maps onto close codes.

use tile_room_wire::close_code;

/// Errors that can occur while a session attempts to join a room.
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    /// First joiner into a cold room is not the world's owner.
    #[error("account {account_id} is not the owner of world {world_id}")]
    NotOwner {
        account_id: i64,
        world_id: String,
    },

    /// `onCreate` could not load the world.
    #[error("world {world_id} not found")]
    WorldNotFound { world_id: String },

    /// Persistence failed during the join (character lookup/creation).
    /// Fatal for this join; the room survives.
    #[error("persistence error during join: {0}")]
    Persistence(String),

    /// The room already has `MAX_PARTY_SIZE` players.
    #[error("room {world_id} is full")]
    RoomFull { world_id: String },

    /// The room has already transitioned to `Disposing` and can no longer
    /// accept joins.
    #[error("room {world_id} is disposing")]
    RoomDisposing { world_id: String },
}

impl JoinError {
    /// The close code the gateway should send for this failure, per spec §6.
    pub fn close_code(&self) -> u16 {
        match self {
            JoinError::NotOwner { .. } => close_code::NOT_OWNER,
            JoinError::WorldNotFound { .. } => close_code::WORLD_NOT_FOUND,
            // Persistence failures, a full room, and a disposing room are
            // all "generic connect failure" from the client's perspective;
            // the spec does not allocate a distinct close code for them.
            JoinError::Persistence(_) | JoinError::RoomFull { .. } | JoinError::RoomDisposing { .. } => {
                close_code::WORLD_NOT_FOUND
            }
        }
    }
}

/// Errors surfaced by room operations that are not join-specific.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("no room is running for world {world_id}")]
    RoomGone { world_id: String },

    #[error(transparent)]
    Join(#[from] JoinError),
}
