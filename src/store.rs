//! Record store backed by an embedded fjall keyspace
//!
//! Documents are JSON encoded and keyed by a UUIDv7 string, so key order is
//! insertion order.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use fjall::Keyspace;
use tokio::sync::Mutex;
use tokio::task;
use uuid::Uuid;

use crate::WeatherRecordError;
use crate::models::{DateRange, NewWeatherRecord, WeatherRecord};

const KEYSPACE: &str = "weather_records";
const NOT_FOUND: &str = "Record not found";
const NOT_FOUND_OR_UNCHANGED: &str = "Record not found or no changes made.";

/// Persistence contract for weather records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a new record and return its assigned id
    async fn insert(&self, record: NewWeatherRecord) -> crate::Result<String>;

    /// All records in store order
    async fn find_all(&self) -> crate::Result<Vec<WeatherRecord>>;

    async fn find_by_id(&self, id: &str) -> crate::Result<WeatherRecord>;

    /// Overwrite `location` and `date_range` only. Reports `NotFound` both
    /// for unknown ids and when nothing would change.
    async fn update_fields(
        &self,
        id: &str,
        location: String,
        date_range: DateRange,
    ) -> crate::Result<WeatherRecord>;

    async fn delete(&self, id: &str) -> crate::Result<()>;
}

/// `RecordStore` over a fjall keyspace
#[derive(Clone)]
pub struct FjallRecordStore {
    store: Keyspace,
    /// Serialises read-modify-write operations
    write_lock: Arc<Mutex<()>>,
}

fn get_from_store(store: &Keyspace, key: &str) -> crate::Result<Option<WeatherRecord>> {
    match store.get(key.as_bytes())? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn put_in_store(store: &Keyspace, record: &WeatherRecord) -> crate::Result<()> {
    let bytes = serde_json::to_vec(record)?;
    store.insert(record.id.as_bytes(), bytes)?;
    Ok(())
}

impl FjallRecordStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let db = fjall::Database::builder(path.as_ref()).open()?;
        let store = db.keyspace(KEYSPACE, fjall::KeyspaceCreateOptions::default)?;
        tracing::info!(path = %path.as_ref().display(), "Opened record store");
        Ok(Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl RecordStore for FjallRecordStore {
    #[tracing::instrument(name = "insert_record", level = "debug", skip_all)]
    async fn insert(&self, record: NewWeatherRecord) -> crate::Result<String> {
        let id = Uuid::now_v7().to_string();
        let record = record.with_id(id.clone());
        let store = self.store.clone();

        // Fresh key, nothing to read back first
        task::spawn_blocking(move || put_in_store(&store, &record)).await??;

        tracing::debug!(%id, "Inserted record");
        Ok(id)
    }

    #[tracing::instrument(name = "list_records", level = "debug", skip(self))]
    async fn find_all(&self) -> crate::Result<Vec<WeatherRecord>> {
        let store = self.store.clone();
        let records = task::spawn_blocking(move || {
            store
                .iter()
                .map(|guard| -> crate::Result<WeatherRecord> {
                    let (_, value) = guard.into_inner()?;
                    Ok(serde_json::from_slice(&value)?)
                })
                .collect::<crate::Result<Vec<_>>>()
        })
        .await??;

        tracing::debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    #[tracing::instrument(name = "find_record", level = "debug", skip(self))]
    async fn find_by_id(&self, id: &str) -> crate::Result<WeatherRecord> {
        let store = self.store.clone();
        let key = id.to_string();
        task::spawn_blocking(move || get_from_store(&store, &key))
            .await??
            .ok_or_else(|| WeatherRecordError::not_found(NOT_FOUND))
    }

    #[tracing::instrument(name = "update_record", level = "debug", skip(self, location, date_range))]
    async fn update_fields(
        &self,
        id: &str,
        location: String,
        date_range: DateRange,
    ) -> crate::Result<WeatherRecord> {
        let store = self.store.clone();
        let key = id.to_string();

        let _guard = self.write_lock.lock().await;
        let updated = task::spawn_blocking(move || -> crate::Result<Option<WeatherRecord>> {
            let Some(mut record) = get_from_store(&store, &key)? else {
                return Ok(None);
            };
            if record.location == location && record.date_range == date_range {
                return Ok(None);
            }
            record.location = location;
            record.date_range = date_range;
            put_in_store(&store, &record)?;
            Ok(Some(record))
        })
        .await??;

        updated.ok_or_else(|| WeatherRecordError::not_found(NOT_FOUND_OR_UNCHANGED))
    }

    #[tracing::instrument(name = "delete_record", level = "debug", skip(self))]
    async fn delete(&self, id: &str) -> crate::Result<()> {
        let store = self.store.clone();
        let key = id.to_string();

        let _guard = self.write_lock.lock().await;
        let deleted = task::spawn_blocking(move || -> crate::Result<bool> {
            if !store.contains_key(key.as_bytes())? {
                return Ok(false);
            }
            store.remove(key.as_bytes())?;
            Ok(true)
        })
        .await??;

        if deleted {
            Ok(())
        } else {
            Err(WeatherRecordError::not_found(NOT_FOUND))
        }
    }
}
