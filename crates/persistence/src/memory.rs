//! In-memory `PersistenceStore` for tests. Lets `tile-room-room` tests
//! exercise join/tick/autosave/leave without a real Postgres instance,
//! mirroring how the retrieval pack's actor examples swap a trait-object
//! port for an in-memory double in their own test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value as Json;

use crate::models::{CharacterRow, WorldSaveRow};
use crate::store::{PersistenceError, PersistenceStore};

struct Inner {
    worlds: HashMap<String, WorldSaveRow>,
    characters: HashMap<(i64, String), CharacterRow>,
    next_character_id: i64,
}

pub struct InMemoryPersistenceStore {
    inner: Mutex<Inner>,
}

impl InMemoryPersistenceStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                worlds: HashMap::new(),
                characters: HashMap::new(),
                next_character_id: 1,
            }),
        }
    }

    /// Seed a world save for a test without going through the (absent)
    /// WorldAdmin surface.
    pub fn seed_world(&self, world: WorldSaveRow) {
        let mut inner = self.inner.lock().unwrap();
        inner.worlds.insert(world.id.clone(), world);
    }
}

impl Default for InMemoryPersistenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceStore for InMemoryPersistenceStore {
    async fn get_world(&self, world_id: &str) -> Result<Option<WorldSaveRow>, PersistenceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.worlds.get(world_id).cloned())
    }

    async fn get_character(
        &self,
        account_id: i64,
        world_id: &str,
    ) -> Result<Option<CharacterRow>, PersistenceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .characters
            .get(&(account_id, world_id.to_string()))
            .cloned())
    }

    async fn create_character(
        &self,
        account_id: i64,
        world_id: &str,
        name: &str,
        spawn_x: i32,
        spawn_y: i32,
    ) -> Result<CharacterRow, PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (account_id, world_id.to_string());
        if inner.characters.contains_key(&key) {
            return Err(PersistenceError::Fatal(format!(
                "character already exists for account {account_id} in world {world_id}"
            )));
        }
        let now = chrono::Utc::now();
        let id = inner.next_character_id;
        inner.next_character_id += 1;
        let row = CharacterRow {
            id,
            account_id,
            world_id: world_id.to_string(),
            name: name.to_string(),
            x: spawn_x,
            y: spawn_y,
            created_at: now,
            updated_at: now,
        };
        inner.characters.insert(key, row.clone());
        Ok(row)
    }

    async fn save_all(
        &self,
        world_id: &str,
        world_data: Json,
        characters: &[(i64, i32, i32)],
    ) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(world) = inner.worlds.get_mut(world_id) {
            world.world_data = world_data;
            world.updated_at = chrono::Utc::now();
        }
        for &(character_id, x, y) in characters {
            if let Some(character) = inner
                .characters
                .values_mut()
                .find(|c| c.id == character_id)
            {
                character.x = x;
                character.y = y;
                character.updated_at = chrono::Utc::now();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_world() -> WorldSaveRow {
        let now = chrono::Utc::now();
        WorldSaveRow {
            id: "world-1".to_string(),
            owner_account_id: 10,
            name: "Test World".to_string(),
            seed: 0,
            world_data: Json::Null,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn get_world_returns_none_when_absent() {
        let store = InMemoryPersistenceStore::new();
        assert!(store.get_world("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeded_world_is_retrievable() {
        let store = InMemoryPersistenceStore::new();
        store.seed_world(sample_world());
        let world = store.get_world("world-1").await.unwrap().unwrap();
        assert_eq!(world.owner_account_id, 10);
    }

    #[tokio::test]
    async fn create_character_then_fetch() {
        let store = InMemoryPersistenceStore::new();
        store.seed_world(sample_world());
        let character = store
            .create_character(10, "world-1", "Aria", 2, 2)
            .await
            .unwrap();
        assert_eq!(character.x, 2);
        assert_eq!(character.y, 2);

        let fetched = store.get_character(10, "world-1").await.unwrap().unwrap();
        assert_eq!(fetched.id, character.id);
    }

    #[tokio::test]
    async fn duplicate_character_creation_is_fatal() {
        let store = InMemoryPersistenceStore::new();
        store.seed_world(sample_world());
        store
            .create_character(10, "world-1", "Aria", 2, 2)
            .await
            .unwrap();
        let err = store
            .create_character(10, "world-1", "Aria", 2, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Fatal(_)));
    }

    #[tokio::test]
    async fn save_all_updates_world_and_characters_together() {
        let store = InMemoryPersistenceStore::new();
        store.seed_world(sample_world());
        let character = store
            .create_character(10, "world-1", "Aria", 2, 2)
            .await
            .unwrap();

        store
            .save_all(
                "world-1",
                Json::String("updated".to_string()),
                &[(character.id, 3, 4)],
            )
            .await
            .unwrap();

        let world = store.get_world("world-1").await.unwrap().unwrap();
        assert_eq!(world.world_data, Json::String("updated".to_string()));

        let character = store.get_character(10, "world-1").await.unwrap().unwrap();
        assert_eq!((character.x, character.y), (3, 4));
    }
}
