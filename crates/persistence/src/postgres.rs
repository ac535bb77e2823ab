//! Postgres-backed `PersistenceStore`.
//!
//! Schema (owned by migrations external to this crate, documented here for
//! the implementer per spec §6):
//!
//! ```sql
//! create table world_saves (
//!     id text primary key,
//!     owner_account_id bigint not null,
//!     name text not null,
//!     seed bigint not null,
//!     world_data jsonb not null,
//!     created_at timestamptz not null default now(),
//!     updated_at timestamptz not null default now()
//! );
//!
//! create table characters (
//!     id bigserial primary key,
//!     account_id bigint not null,
//!     world_id text not null references world_saves(id),
//!     name text not null,
//!     x integer not null,
//!     y integer not null,
//!     created_at timestamptz not null default now(),
//!     updated_at timestamptz not null default now(),
//!     unique (account_id, world_id)
//! );
//! ```

use serde_json::Value as Json;
use sqlx::PgPool;

use crate::models::{CharacterRow, WorldSaveRow};
use crate::store::{PersistenceError, PersistenceStore};

pub struct PgPersistenceStore {
    pool: PgPool,
}

impl PgPersistenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn transient(err: sqlx::Error) -> PersistenceError {
    PersistenceError::Transient(err.to_string())
}

#[async_trait::async_trait]
impl PersistenceStore for PgPersistenceStore {
    async fn get_world(&self, world_id: &str) -> Result<Option<WorldSaveRow>, PersistenceError> {
        sqlx::query_as!(
            WorldSaveRow,
            r#"
            select id, owner_account_id, name, seed, world_data, created_at, updated_at
            from world_saves
            where id = $1
            "#,
            world_id,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(transient)
    }

    async fn get_character(
        &self,
        account_id: i64,
        world_id: &str,
    ) -> Result<Option<CharacterRow>, PersistenceError> {
        sqlx::query_as!(
            CharacterRow,
            r#"
            select id, account_id, world_id, name, x, y, created_at, updated_at
            from characters
            where account_id = $1 and world_id = $2
            "#,
            account_id,
            world_id,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(transient)
    }

    async fn create_character(
        &self,
        account_id: i64,
        world_id: &str,
        name: &str,
        spawn_x: i32,
        spawn_y: i32,
    ) -> Result<CharacterRow, PersistenceError> {
        sqlx::query_as!(
            CharacterRow,
            r#"
            insert into characters (account_id, world_id, name, x, y)
            values ($1, $2, $3, $4, $5)
            returning id, account_id, world_id, name, x, y, created_at, updated_at
            "#,
            account_id,
            world_id,
            name,
            spawn_x,
            spawn_y,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            // A unique-violation here means a concurrent join raced us;
            // the spec treats this as fatal for the losing join, not
            // transient (retrying would just violate the constraint
            // again).
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.is_unique_violation() {
                    return PersistenceError::Fatal(format!(
                        "character already exists for account {account_id} in world {world_id}"
                    ));
                }
            }
            transient(err)
        })
    }

    async fn save_all(
        &self,
        world_id: &str,
        world_data: Json,
        characters: &[(i64, i32, i32)],
    ) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(transient)?;

        sqlx::query!(
            r#"update world_saves set world_data = $1, updated_at = now() where id = $2"#,
            world_data,
            world_id,
        )
        .execute(&mut *tx)
        .await
        .map_err(transient)?;

        for &(character_id, x, y) in characters {
            sqlx::query!(
                r#"update characters set x = $1, y = $2, updated_at = now() where id = $3"#,
                x,
                y,
                character_id,
            )
            .execute(&mut *tx)
            .await
            .map_err(transient)?;
        }

        tx.commit().await.map_err(transient)
    }
}
