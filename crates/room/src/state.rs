//! `RoomState`: the authoritative snapshot of every player currently in
//! a room, and the patch log each mutation records for the next tick's
//! broadcast.
//!
//! Every setter records exactly one [`Patch`]; `take_patches` drains them
//! for the tick handler to fold into a `StateBroadcast`. A joining player
//! is always inserted fully populated (spec §4.4 step 4) so the patch a
//! tick broadcasts never exposes a half-built record.

use std::collections::HashMap;

use tile_room_sim::Coord;
use tile_room_wire::{PatchKind, PlayerPatch, PlayerState};

use crate::types::{AccountId, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub session_id: SessionId,
    pub account_id: AccountId,
    pub name: String,
    pub x: Coord,
    pub y: Coord,
    pub last_processed_sequence_number: u64,
}

impl From<&PlayerRecord> for PlayerState {
    fn from(record: &PlayerRecord) -> Self {
        PlayerState {
            session_id: record.session_id,
            account_id: record.account_id,
            name: record.name.clone(),
            x: record.x,
            y: record.y,
            last_processed_sequence_number: record.last_processed_sequence_number,
        }
    }
}

/// One recorded mutation of `RoomState`, queued for the next broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    Add(PlayerRecord),
    Change(PlayerRecord),
    Remove(SessionId),
}

impl From<Patch> for PlayerPatch {
    fn from(patch: Patch) -> Self {
        match patch {
            Patch::Add(record) => PlayerPatch {
                session_id: record.session_id,
                kind: PatchKind::Add as i32,
                player: Some(PlayerState::from(&record)),
            },
            Patch::Change(record) => PlayerPatch {
                session_id: record.session_id,
                kind: PatchKind::Change as i32,
                player: Some(PlayerState::from(&record)),
            },
            Patch::Remove(session_id) => PlayerPatch {
                session_id,
                kind: PatchKind::Remove as i32,
                player: None,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct RoomState {
    players: HashMap<SessionId, PlayerRecord>,
    pending_patches: Vec<Patch>,
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session_id: SessionId) -> Option<&PlayerRecord> {
        self.players.get(&session_id)
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.players.contains_key(&session_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    /// Insert a fully populated player record, recording an `Add` patch.
    pub fn insert(&mut self, record: PlayerRecord) {
        let session_id = record.session_id;
        self.players.insert(session_id, record.clone());
        self.pending_patches.push(Patch::Add(record));
    }

    /// Apply the result of a movement evaluation to an existing player,
    /// recording a `Change` patch. No-op if the session is unknown.
    ///
    /// A patch is recorded even when `(x, y)` is unchanged: the
    /// acknowledged sequence number is itself a tracked field (spec §3),
    /// and a blocked move still advances it. Clients rely on seeing that
    /// acknowledgement in the next broadcast to discard the confirmed
    /// prediction (spec §4.4).
    pub fn apply_move(
        &mut self,
        session_id: SessionId,
        x: Coord,
        y: Coord,
        last_processed_sequence_number: u64,
    ) {
        let Some(record) = self.players.get_mut(&session_id) else {
            return;
        };
        record.x = x;
        record.y = y;
        record.last_processed_sequence_number = last_processed_sequence_number;
        self.pending_patches.push(Patch::Change(record.clone()));
    }

    /// Remove a player, recording a `Remove` patch. No-op if unknown.
    pub fn remove(&mut self, session_id: SessionId) {
        if self.players.remove(&session_id).is_some() {
            self.pending_patches.push(Patch::Remove(session_id));
        }
    }

    /// Drain and return all patches recorded since the last drain.
    pub fn take_patches(&mut self) -> Vec<Patch> {
        std::mem::take(&mut self.pending_patches)
    }
}
