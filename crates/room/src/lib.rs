//! Tile Room Runtime
//!
//! Owns the per-world simulation loop: the input intake and validation
//! pipeline, the tick scheduler, the synchronized `RoomState` and its
//! patch broadcast, the host-ownership and idle-kick lifecycle, and
//! save/load coordination with the persistence store.
//!
//! A single `tokio` task drives each [`WorldRoom`]'s run loop; all
//! mutation of that room's state happens inside that task, so no lock is
//! needed around `RoomState` itself (spec §5: "single owning task per
//! room, all operations delivered via a bounded in-room channel").

#![deny(unsafe_code)]

pub mod constants;
pub mod error;
pub mod input_queue;
pub mod session;
pub mod state;
pub mod types;
pub mod validation;
pub mod world_room;

pub use constants::*;
pub use error::{JoinError, RoomError};
pub use input_queue::InputQueue;
pub use session::SessionContext;
pub use state::{Patch, PlayerRecord, RoomState};
pub use types::{AccountId, CharacterId, SessionId, WorldId};
pub use validation::{validate_input, RejectReason, ValidationOutcome};
pub use world_room::{OutboundSender, RoomOutboundMessage, RoomPhase, WorldRoom, WorldRoomHandle, WorldRoomPorts};
