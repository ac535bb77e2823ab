//! `RoomRegistry`: the process-wide directory that locates or spins up a
//! [`WorldRoom`] by world id, keyed the way `SessionList` keys
//! connections by address in the pack's connection-manager examples — a
//! concurrent map owned by no single task, with per-key creation
//! serialized so two joins racing to cold-open the same world don't spin
//! up two rooms.
//!
//! The registry owns lookup-synchronization only; it holds no game
//! state of its own (spec §4.5).

#![deny(unsafe_code)]

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};

use tile_room_persistence::PersistenceStore;
use tile_room_room::{JoinError, OutboundSender, WorldRoom, WorldRoomHandle, WorldRoomPorts};

type WorldId = String;
type SessionId = u64;
type AccountId = i64;

/// Per-world creation lock. A `DashMap` entry is inserted (with the lock
/// held) before the world lookup/spawn completes, so a second concurrent
/// `join_or_create` for the same world id waits on the same lock instead
/// of racing a second `WorldRoom::open`.
pub struct RoomRegistry {
    rooms: DashMap<WorldId, WorldRoomHandle>,
    creation_locks: DashMap<WorldId, Arc<Mutex<()>>>,
    persistence: Arc<dyn PersistenceStore>,
    dispose_notify: mpsc::UnboundedSender<WorldId>,
}

impl RoomRegistry {
    /// Build a registry. The returned receiver must be polled (typically
    /// by a background task) to actually evict disposed rooms; the
    /// registry stores only the sender side.
    pub fn new(persistence: Arc<dyn PersistenceStore>) -> (Self, mpsc::UnboundedReceiver<WorldId>) {
        let (dispose_notify, dispose_rx) = mpsc::unbounded_channel();
        let registry = Self {
            rooms: DashMap::new(),
            creation_locks: DashMap::new(),
            persistence,
            dispose_notify,
        };
        (registry, dispose_rx)
    }

    /// Drop the registry's entry for a disposed world. Call this for
    /// every id received on the disposal channel returned by [`Self::new`].
    pub fn remove_disposed(&self, world_id: &str) {
        self.rooms.remove(world_id);
        self.creation_locks.remove(world_id);
    }

    fn creation_lock(&self, world_id: &str) -> Arc<Mutex<()>> {
        self.creation_locks
            .entry(world_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// `joinOrCreate(worldId, sessionCtx)`: return a handle to the live
    /// room for `world_id`, cold-opening it if necessary, then perform
    /// the join against that handle.
    ///
    /// Concurrent calls for the same `world_id` serialize on creation;
    /// the losing side of a creation race simply joins the room the
    /// winner created (spec §9 open question, resolved this way: no
    /// error on losing the race, just a normal join against the
    /// now-live room).
    pub async fn join_or_create(
        &self,
        world_id: &str,
        session_id: SessionId,
        account_id: AccountId,
        character_name: String,
        outbound: OutboundSender,
    ) -> Result<WorldRoomHandle, JoinError> {
        if let Some(handle) = self.rooms.get(world_id) {
            let handle = handle.clone();
            handle
                .join(session_id, account_id, character_name, outbound)
                .await?;
            return Ok(handle);
        }

        let lock = self.creation_lock(world_id);
        let _guard = lock.lock().await;

        // Re-check: another task may have finished creation while we
        // waited for the lock.
        if let Some(handle) = self.rooms.get(world_id) {
            let handle = handle.clone();
            handle
                .join(session_id, account_id, character_name, outbound)
                .await?;
            return Ok(handle);
        }

        let ports = WorldRoomPorts {
            persistence: self.persistence.clone(),
        };
        let handle = WorldRoom::open(world_id.to_string(), ports, self.dispose_notify.clone()).await?;
        tracing::info!(world_id, "cold-opened room");
        self.rooms.insert(world_id.to_string(), handle.clone());

        handle
            .join(session_id, account_id, character_name, outbound)
            .await?;
        Ok(handle)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn get(&self, world_id: &str) -> Option<WorldRoomHandle> {
        self.rooms.get(world_id).map(|entry| entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_room_persistence::{InMemoryPersistenceStore, WorldSaveRow};
    use tokio::sync::mpsc as tokio_mpsc;

    fn perimeter_world(id: &str, owner_account_id: i64) -> WorldSaveRow {
        let mut tiles = vec!["ground"; 25];
        for i in 0..5 {
            tiles[i] = "wall";
            tiles[20 + i] = "wall";
        }
        for row in 0..5 {
            tiles[row * 5] = "wall";
            tiles[row * 5 + 4] = "wall";
        }
        WorldSaveRow {
            id: id.to_string(),
            owner_account_id,
            name: "Test World".to_string(),
            seed: 1,
            world_data: serde_json::json!({
                "width": 5, "height": 5, "tiles": tiles, "spawn_x": 2, "spawn_y": 2,
            }),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn cold_open_by_owner_succeeds_and_is_reused() {
        let store = Arc::new(InMemoryPersistenceStore::new());
        store.seed_world(perimeter_world("world-1", 1));
        let (registry, _dispose_rx) = RoomRegistry::new(store);

        let (tx1, _rx1) = tokio_mpsc::unbounded_channel();
        let handle1 = registry
            .join_or_create("world-1", 1, 1, "Owner".to_string(), tx1)
            .await
            .unwrap();

        let (tx2, _rx2) = tokio_mpsc::unbounded_channel();
        let handle2 = registry
            .join_or_create("world-1", 2, 2, "Guest".to_string(), tx2)
            .await
            .unwrap();

        assert_eq!(handle1.world_id(), handle2.world_id());
        assert_eq!(registry.room_count(), 1);
    }

    #[tokio::test]
    async fn cold_open_by_non_owner_rejected_without_creating_room() {
        let store = Arc::new(InMemoryPersistenceStore::new());
        store.seed_world(perimeter_world("world-2", 1));
        let (registry, _dispose_rx) = RoomRegistry::new(store);

        let (tx, _rx) = tokio_mpsc::unbounded_channel();
        let result = registry
            .join_or_create("world-2", 1, 2, "NotOwner".to_string(), tx)
            .await;
        assert!(matches!(result, Err(JoinError::NotOwner { .. })));
    }

    #[tokio::test]
    async fn unknown_world_returns_world_not_found() {
        let store = Arc::new(InMemoryPersistenceStore::new());
        let (registry, _dispose_rx) = RoomRegistry::new(store);

        let (tx, _rx) = tokio_mpsc::unbounded_channel();
        let result = registry
            .join_or_create("ghost-world", 1, 1, "Nobody".to_string(), tx)
            .await;
        assert!(matches!(result, Err(JoinError::WorldNotFound { .. })));
    }
}
