//! Persistent room registry: maps a room code to the tracker URL it was
//! registered with. Snapshots are never stored here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::RegistryError;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A registered room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub id: Uuid,
    pub url: String,
    /// Room code, unique across the registry
    pub link: String,
    pub ip_added: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomRecord {
    /// Creates an unsaved record stamped with the current time.
    pub fn new(url: String, link: String, ip_added: Option<String>) -> RoomRecord {
        let now = Utc::now();
        RoomRecord {
            id: Uuid::new_v4(),
            url,
            link,
            ip_added,
            created_at: now,
            updated_at: now,
        }
    }
}

type RoomRow = (String, String, String, Option<String>, DateTime<Utc>, DateTime<Utc>);

fn record_from_row(row: RoomRow) -> Result<RoomRecord, RegistryError> {
    let (id, url, link, ip_added, created_at, updated_at) = row;
    let id = Uuid::parse_str(&id).map_err(|e| RegistryError::CorruptRow(format!("room {link}: {e}")))?;
    Ok(RoomRecord { id, url, link, ip_added, created_at, updated_at })
}

const SELECT_ROOM: &str = "SELECT id, url, link, ip_added, created_at, updated_at FROM archipelago_rooms";

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Debug, Clone)]
pub struct RoomRegistry {
    pool: SqlitePool,
}

impl RoomRegistry {
    /// Opens the database and creates the schema if needed.
    pub async fn connect(database_url: &str) -> Result<RoomRegistry, RegistryError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        info!("Connected to room registry at {}", database_url);
        RoomRegistry::from_pool(pool).await
    }

    /// Private in-memory database; a single connection keeps it alive.
    pub async fn in_memory() -> Result<RoomRegistry, RegistryError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        RoomRegistry::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<RoomRegistry, RegistryError> {
        let registry = RoomRegistry { pool };
        registry.init_schema().await?;
        Ok(registry)
    }

    async fn init_schema(&self) -> Result<(), RegistryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS archipelago_rooms (
                id TEXT PRIMARY KEY NOT NULL,
                url TEXT NOT NULL,
                link TEXT NOT NULL UNIQUE,
                ip_added TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Registers a room, or points an existing registration at a new URL.
    /// `id` and `created_at` survive re-registration.
    pub async fn upsert(
        &self,
        url: &str,
        room_code: &str,
        ip_added: Option<&str>,
    ) -> Result<RoomRecord, RegistryError> {
        let fresh = RoomRecord::new(url.to_string(), room_code.to_string(), ip_added.map(str::to_string));

        sqlx::query(
            r#"
            INSERT INTO archipelago_rooms (id, url, link, ip_added, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(link) DO UPDATE SET
                url = excluded.url,
                ip_added = excluded.ip_added,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(fresh.id.to_string())
        .bind(&fresh.url)
        .bind(&fresh.link)
        .bind(&fresh.ip_added)
        .bind(fresh.created_at)
        .bind(fresh.updated_at)
        .execute(&self.pool)
        .await?;

        debug!("Upserted room {} -> {}", room_code, url);

        self.find(room_code)
            .await?
            .ok_or_else(|| RegistryError::CorruptRow(format!("room {room_code} missing after upsert")))
    }

    pub async fn find(&self, room_code: &str) -> Result<Option<RoomRecord>, RegistryError> {
        let row: Option<RoomRow> = sqlx::query_as(&format!("{SELECT_ROOM} WHERE link = ?"))
            .bind(room_code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(record_from_row).transpose()
    }

    /// All rooms, most recently updated first.
    pub async fn list(&self) -> Result<Vec<RoomRecord>, RegistryError> {
        let rows: Vec<RoomRow> = sqlx::query_as(&format!("{SELECT_ROOM} ORDER BY updated_at DESC, link"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(record_from_row).collect()
    }

    /// Returns whether a room was removed.
    pub async fn remove(&self, room_code: &str) -> Result<bool, RegistryError> {
        let result = sqlx::query("DELETE FROM archipelago_rooms WHERE link = ?")
            .bind(room_code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
