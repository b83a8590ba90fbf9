//! SQLite-backed pin store.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::schema;
use crate::domain::entities::{CacheKey, Coordinate, PhotoId, PhotoRecord, Pin, PinId};
use crate::domain::errors::StorageError;
use crate::domain::ports::{MergePolicy, PhotoCachePort, PinStorePort, StoreEvent};

const EVENT_CAPACITY: usize = 256;

const PIN_COLUMNS: &str = "id, latitude, longitude, created_at";
const PHOTO_COLUMNS: &str =
    "id, pin_id, remote_id, server, secret, title, cache_key, created_at";

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

fn conversion_error<E>(ty: Type, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(0, ty, Box::new(e))
}

fn uuid_column(row: &Row, name: &str) -> rusqlite::Result<Uuid> {
    let value: String = row.get(name)?;
    Uuid::parse_str(&value).map_err(|e| conversion_error(Type::Text, e))
}

fn timestamp_column(row: &Row, name: &str) -> rusqlite::Result<DateTime<Utc>> {
    let micros: i64 = row.get(name)?;
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        conversion_error(
            Type::Integer,
            StorageError::Corrupt(format!("timestamp out of range: {micros}")),
        )
    })
}

fn cache_key_column(row: &Row, name: &str) -> rusqlite::Result<CacheKey> {
    let value: String = row.get(name)?;
    CacheKey::new(value).map_err(|e| conversion_error(Type::Text, e))
}

fn map_pin(row: &Row) -> rusqlite::Result<Pin> {
    let coordinate = Coordinate::new(row.get("latitude")?, row.get("longitude")?)
        .map_err(|e| conversion_error(Type::Real, e))?;

    Ok(Pin::from_parts(
        PinId::from(uuid_column(row, "id")?),
        coordinate,
        timestamp_column(row, "created_at")?,
    ))
}

fn map_photo(row: &Row) -> rusqlite::Result<PhotoRecord> {
    Ok(PhotoRecord {
        id: PhotoId::from(uuid_column(row, "id")?),
        pin_id: PinId::from(uuid_column(row, "pin_id")?),
        remote_id: row.get("remote_id")?,
        server: row.get("server")?,
        secret: row.get("secret")?,
        title: row.get("title")?,
        cache_key: cache_key_column(row, "cache_key")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}

fn pin_exists(conn: &Connection, id: PinId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pins WHERE id = ?1)",
        params![id.to_string()],
        |row| row.get(0),
    )
}

/// Keeps the keys no remaining photo record refers to. The same Flickr
/// photo can belong to several pins, so a key is shared until its last
/// record is gone.
fn unreferenced_keys(conn: &Connection, keys: Vec<CacheKey>) -> rusqlite::Result<Vec<CacheKey>> {
    let mut seen = HashSet::new();
    let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM photos WHERE cache_key = ?1)")?;
    let mut out = Vec::new();

    for key in keys {
        if !seen.insert(key.clone()) {
            continue;
        }
        let in_use: bool = stmt.query_row(params![key.as_str()], |row| row.get(0))?;
        if !in_use {
            out.push(key);
        }
    }
    Ok(out)
}

/// Writes one record following `policy`. Returns what is stored now and,
/// when an overwrite changed the cache key, the key it replaced.
fn upsert_photo(
    conn: &Connection,
    record: PhotoRecord,
    policy: MergePolicy,
) -> rusqlite::Result<(PhotoRecord, Option<CacheKey>)> {
    let existing = conn
        .query_row(
            &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE pin_id = ?1 AND remote_id = ?2"),
            params![record.pin_id.to_string(), record.remote_id],
            map_photo,
        )
        .optional()?;

    match (existing, policy) {
        (Some(stored), MergePolicy::StoreTrumps) => Ok((stored, None)),
        (Some(stored), MergePolicy::ObjectTrumps) => {
            conn.execute(
                "UPDATE photos
                 SET server = ?2, secret = ?3, title = ?4, cache_key = ?5, created_at = ?6
                 WHERE id = ?1",
                params![
                    stored.id.to_string(),
                    record.server,
                    record.secret,
                    record.title,
                    record.cache_key.as_str(),
                    record.created_at.timestamp_micros(),
                ],
            )?;
            let replaced = (stored.cache_key != record.cache_key).then_some(stored.cache_key);
            Ok((
                PhotoRecord {
                    id: stored.id,
                    ..record
                },
                replaced,
            ))
        }
        (None, _) => {
            conn.execute(
                &format!(
                    "INSERT INTO photos ({PHOTO_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    record.id.to_string(),
                    record.pin_id.to_string(),
                    record.remote_id,
                    record.server,
                    record.secret,
                    record.title,
                    record.cache_key.as_str(),
                    record.created_at.timestamp_micros(),
                ],
            )?;
            Ok((record, None))
        }
    }
}

/// Pin store persisting to a SQLite database.
pub struct SqlitePinStore {
    conn: Arc<Mutex<Connection>>,
    cache: Arc<dyn PhotoCachePort>,
    events: broadcast::Sender<StoreEvent>,
}

impl SqlitePinStore {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or the schema cannot be created.
    pub fn open(path: &Path, cache: Arc<dyn PhotoCachePort>) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::database(format!("failed to create data directory: {e}"))
            })?;
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened pin store");
        Self::from_connection(conn, cache)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    /// Returns error if the schema cannot be created.
    pub fn open_in_memory(cache: Arc<dyn PhotoCachePort>) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?, cache)
    }

    fn from_connection(
        conn: Connection,
        cache: Arc<dyn PhotoCachePort>,
    ) -> Result<Self, StorageError> {
        schema::init(&conn)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            cache,
            events,
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }

    fn publish(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }

    async fn evict(&self, keys: Vec<CacheKey>) {
        for key in keys {
            if let Err(e) = self.cache.delete(&key).await {
                warn!(key = %key, error = %e, "Failed to evict cached photo, skipping");
            }
        }
    }
}

#[async_trait]
impl PinStorePort for SqlitePinStore {
    async fn create_pin(&self, coordinate: Coordinate) -> Result<Pin, StorageError> {
        let pin = Pin::new(coordinate);
        let row = pin.clone();

        self.with_conn(move |conn| {
            conn.execute(
                &format!("INSERT INTO pins ({PIN_COLUMNS}) VALUES (?1, ?2, ?3, ?4)"),
                params![
                    row.id().to_string(),
                    row.coordinate().latitude(),
                    row.coordinate().longitude(),
                    row.created_at().timestamp_micros(),
                ],
            )?;
            Ok(())
        })
        .await?;

        debug!(pin_id = %pin.id(), coordinate = %pin.coordinate(), "Created pin");
        self.publish(StoreEvent::PinCreated(pin.clone()));

        Ok(pin)
    }

    async fn list_pins(&self) -> Result<Vec<Pin>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {PIN_COLUMNS} FROM pins ORDER BY rowid"))?;
            let pins = stmt
                .query_map([], map_pin)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(pins)
        })
        .await
    }

    async fn find_pin(&self, id: PinId) -> Result<Option<Pin>, StorageError> {
        self.with_conn(move |conn| {
            let pin = conn
                .query_row(
                    &format!("SELECT {PIN_COLUMNS} FROM pins WHERE id = ?1"),
                    params![id.to_string()],
                    map_pin,
                )
                .optional()?;
            Ok(pin)
        })
        .await
    }

    async fn find_pin_at(&self, coordinate: Coordinate) -> Result<Option<Pin>, StorageError> {
        self.with_conn(move |conn| {
            let pin = conn
                .query_row(
                    &format!(
                        "SELECT {PIN_COLUMNS} FROM pins
                         WHERE latitude = ?1 AND longitude = ?2
                         ORDER BY rowid LIMIT 1"
                    ),
                    params![coordinate.latitude(), coordinate.longitude()],
                    map_pin,
                )
                .optional()?;
            Ok(pin)
        })
        .await
    }

    async fn photos_for(&self, pin: &Pin) -> Result<Vec<PhotoRecord>, StorageError> {
        let pin_id = pin.id();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PHOTO_COLUMNS} FROM photos
                 WHERE pin_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let photos = stmt
                .query_map(params![pin_id.to_string()], map_photo)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(photos)
        })
        .await
    }

    async fn save_photo_records(
        &self,
        pin: &Pin,
        records: Vec<PhotoRecord>,
        policy: MergePolicy,
    ) -> Result<Vec<PhotoRecord>, StorageError> {
        let pin_id = pin.id();
        let requested = records.len();

        let (saved, stale) = self
            .with_conn(move |conn| {
                if !pin_exists(conn, pin_id)? {
                    return Err(StorageError::PinNotFound(pin_id));
                }

                let mut saved = Vec::with_capacity(records.len());
                let mut replaced = Vec::new();

                for record in records {
                    if record.pin_id != pin_id {
                        warn!(photo_id = %record.id, owner = %record.pin_id, "Photo record belongs to another pin, skipping");
                        continue;
                    }
                    let remote_id = record.remote_id.clone();
                    match upsert_photo(conn, record, policy) {
                        Ok((stored, old_key)) => {
                            saved.push(stored);
                            replaced.extend(old_key);
                        }
                        Err(e) => {
                            warn!(remote_id = %remote_id, error = %e, "Failed to save photo record, skipping");
                        }
                    }
                }

                let stale = unreferenced_keys(conn, replaced)?;
                Ok((saved, stale))
            })
            .await?;

        self.evict(stale).await;

        debug!(pin_id = %pin_id, requested, saved = saved.len(), ?policy, "Saved photo records");
        self.publish(StoreEvent::PhotosSaved {
            pin_id,
            count: saved.len(),
        });

        Ok(saved)
    }

    async fn delete_photo(&self, record: &PhotoRecord) -> Result<(), StorageError> {
        let photo_id = record.id;
        let key = record.cache_key.clone();

        let stale = self
            .with_conn(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM photos WHERE id = ?1",
                    params![photo_id.to_string()],
                )?;
                if removed == 0 {
                    return Err(StorageError::PhotoNotFound(photo_id));
                }
                Ok(unreferenced_keys(conn, vec![key])?)
            })
            .await?;

        self.evict(stale).await;

        debug!(photo_id = %photo_id, pin_id = %record.pin_id, "Deleted photo");
        self.publish(StoreEvent::PhotoDeleted {
            pin_id: record.pin_id,
            photo_id,
        });

        Ok(())
    }

    async fn delete_all_photos(&self, pin: &Pin) -> Result<usize, StorageError> {
        let pin_id = pin.id();

        let (count, stale) = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let keys = {
                    let mut stmt = tx.prepare("SELECT cache_key FROM photos WHERE pin_id = ?1")?;
                    let keys = stmt
                        .query_map(params![pin_id.to_string()], |row| {
                            cache_key_column(row, "cache_key")
                        })?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    keys
                };
                let count = tx.execute(
                    "DELETE FROM photos WHERE pin_id = ?1",
                    params![pin_id.to_string()],
                )?;
                let stale = unreferenced_keys(&tx, keys)?;
                tx.commit()?;
                Ok((count, stale))
            })
            .await?;

        self.evict(stale).await;

        debug!(pin_id = %pin_id, count, "Deleted all photos of pin");
        self.publish(StoreEvent::PhotosCleared { pin_id, count });

        Ok(count)
    }

    async fn delete_pin(&self, pin: &Pin) -> Result<(), StorageError> {
        let photos = self.delete_all_photos(pin).await?;
        let pin_id = pin.id();

        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM album_pages WHERE pin_id = ?1",
                params![pin_id.to_string()],
            )?;
            let removed = conn.execute("DELETE FROM pins WHERE id = ?1", params![pin_id.to_string()])?;
            if removed == 0 {
                return Err(StorageError::PinNotFound(pin_id));
            }
            Ok(())
        })
        .await?;

        info!(pin_id = %pin_id, photos, "Deleted pin");
        self.publish(StoreEvent::PinDeleted(pin_id));

        Ok(())
    }

    async fn page_count(&self, pin: &Pin) -> Result<u32, StorageError> {
        let pin_id = pin.id();
        self.with_conn(move |conn| {
            let pages: Option<i64> = conn
                .query_row(
                    "SELECT pages FROM album_pages WHERE pin_id = ?1",
                    params![pin_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(pages
                .and_then(|p| u32::try_from(p).ok())
                .unwrap_or(1)
                .max(1))
        })
        .await
    }

    async fn set_page_count(&self, pin: &Pin, pages: u32) -> Result<(), StorageError> {
        let pin_id = pin.id();
        let pages = pages.max(1);
        self.with_conn(move |conn| {
            if !pin_exists(conn, pin_id)? {
                return Err(StorageError::PinNotFound(pin_id));
            }
            conn.execute(
                "INSERT INTO album_pages (pin_id, pages) VALUES (?1, ?2)
                 ON CONFLICT(pin_id) DO UPDATE SET pages = excluded.pages",
                params![pin_id.to_string(), pages],
            )?;
            Ok(())
        })
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
