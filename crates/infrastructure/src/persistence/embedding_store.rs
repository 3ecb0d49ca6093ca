//! SQLite embedding store implementation
//!
//! Implements the `EmbeddingStore` port on rusqlite with an r2d2 pool
//! the store opens and owns itself. Vectors are stored as little-endian
//! f32 blobs next to their recorded dimension; the blob length is
//! validated against it on every read.

use std::path::Path;
use std::sync::Arc;

use application::{error::ApplicationError, ports::EmbeddingStore};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::{CacheEntry, CacheKey, ContentHash, DomainError, ModelId};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params};
use tokio::task;
use tracing::{debug, info, instrument};

use super::{StoreOpenError, migrations};
use crate::config::DatabaseConfig;

type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

/// SQLite-based embedding store
#[derive(Debug, Clone)]
pub struct SqliteEmbeddingStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteEmbeddingStore {
    /// Open (or create) the embedding store described by `config`
    ///
    /// Every pooled connection comes up in WAL mode so hits can keep
    /// reading while a miss is being written, and with a busy timeout
    /// sized for the short transactions this store issues.
    pub fn open(config: &DatabaseConfig) -> Result<Self, StoreOpenError> {
        info!(
            path = %config.path,
            max_connections = config.max_connections,
            "Opening embedding store"
        );

        let manager = if config.path == ":memory:" {
            SqliteConnectionManager::memory()
        } else {
            if let Some(parent) = Path::new(&config.path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|source| {
                        StoreOpenError::CreateDir {
                            path: parent.display().to_string(),
                            source,
                        }
                    })?;
                }
            }
            SqliteConnectionManager::file(&config.path)
        };

        let manager = manager.with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;
                ",
            )
        });

        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .build(manager)?;

        if config.run_migrations {
            let conn = pool.get()?;
            migrations::run_migrations(&conn)?;
        }

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

const SELECT_ENTRY: &str = "SELECT model_id, content_hash, vector, dimensions, created_at, \
                            last_accessed_at, access_count FROM embeddings";

/// Raw row before key parsing and dimension validation
struct RawEntry {
    model_id: String,
    content_hash: String,
    vector: Vec<u8>,
    dimensions: i64,
    created_at: String,
    last_accessed_at: String,
    access_count: i64,
}

impl RawEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            model_id: row.get(0)?,
            content_hash: row.get(1)?,
            vector: row.get(2)?,
            dimensions: row.get(3)?,
            created_at: row.get(4)?,
            last_accessed_at: row.get(5)?,
            access_count: row.get(6)?,
        })
    }

    fn into_entry(self) -> Result<CacheEntry, ApplicationError> {
        let model = ModelId::parse(&self.model_id)
            .map_err(|e| ApplicationError::Storage(format!("Corrupt model id: {e}")))?;
        let content = ContentHash::parse(&self.content_hash)
            .map_err(|e| ApplicationError::Storage(format!("Corrupt content hash: {e}")))?;

        #[allow(clippy::cast_sign_loss)]
        let dimensions = self.dimensions.max(0) as usize;
        if self.vector.len() != dimensions * 4 {
            return Err(DomainError::dimension_mismatch(
                model.as_str(),
                dimensions,
                self.vector.len() / 4,
            )
            .into());
        }

        let created_at = parse_timestamp(&self.created_at)?;
        let last_accessed_at = parse_timestamp(&self.last_accessed_at)?;

        #[allow(clippy::cast_sign_loss)]
        Ok(
            CacheEntry::new(CacheKey::new(model, content), bytes_to_vector(&self.vector), created_at)
                .with_last_accessed_at(last_accessed_at)
                .with_access_count(self.access_count.max(0) as u64),
        )
    }
}

#[async_trait]
impl EmbeddingStore for SqliteEmbeddingStore {
    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let model = key.model.to_string();
        let hash = key.content.to_string();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_err)?;

            let sql = format!("{SELECT_ENTRY} WHERE model_id = ?1 AND content_hash = ?2");
            let raw = conn
                .query_row(&sql, params![model, hash], RawEntry::from_row)
                .optional()
                .map_err(storage_err)?;

            raw.map(RawEntry::into_entry).transpose()
        })
        .await
        .map_err(join_err)?
    }

    #[instrument(skip(self, entry), fields(key = %entry.key))]
    async fn put(&self, entry: &CacheEntry) -> Result<(), ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let entry = entry.clone();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_err)?;

            conn.execute(
                "INSERT OR REPLACE INTO embeddings \
                 (model_id, content_hash, vector, dimensions, created_at, last_accessed_at, \
                  access_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.key.model.to_string(),
                    entry.key.content.to_string(),
                    vector_to_bytes(&entry.vector),
                    entry.vector.len() as i64,
                    format_timestamp(entry.created_at),
                    format_timestamp(entry.last_accessed_at),
                    entry.access_count as i64,
                ],
            )
            .map_err(storage_err)?;

            debug!("Stored embedding");
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn touch(&self, key: &CacheKey, at: DateTime<Utc>) -> Result<(), ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let model = key.model.to_string();
        let hash = key.content.to_string();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_err)?;

            // Zero affected rows means the key is absent; that is a no-op.
            conn.execute(
                "UPDATE embeddings \
                 SET last_accessed_at = ?1, access_count = access_count + 1 \
                 WHERE model_id = ?2 AND content_hash = ?3",
                params![format_timestamp(at), model, hash],
            )
            .map_err(storage_err)?;

            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn delete(&self, key: &CacheKey) -> Result<bool, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let model = key.model.to_string();
        let hash = key.content.to_string();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_err)?;

            let affected = conn
                .execute(
                    "DELETE FROM embeddings WHERE model_id = ?1 AND content_hash = ?2",
                    params![model, hash],
                )
                .map_err(storage_err)?;

            Ok(affected > 0)
        })
        .await
        .map_err(join_err)?
    }

    #[instrument(skip(self), fields(threshold = %threshold))]
    async fn delete_older_than(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<u64, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let cutoff = format_timestamp(threshold);

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_err)?;

            let affected = conn
                .execute(
                    "DELETE FROM embeddings WHERE last_accessed_at < ?1",
                    params![cutoff],
                )
                .map_err(storage_err)?;

            debug!(removed = affected, "Removed stale embeddings");
            Ok(affected as u64)
        })
        .await
        .map_err(join_err)?
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<u64, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_err)?;

            let affected = conn
                .execute("DELETE FROM embeddings", [])
                .map_err(storage_err)?;

            debug!(removed = affected, "Cleared embeddings table");
            Ok(affected as u64)
        })
        .await
        .map_err(join_err)?
    }

    async fn count(&self) -> Result<u64, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_err)?;

            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))
                .map_err(storage_err)?;

            #[allow(clippy::cast_sign_loss)]
            Ok(count as u64)
        })
        .await
        .map_err(join_err)?
    }

    async fn list_all(&self) -> Result<Vec<CacheEntry>, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_err)?;

            let mut stmt = conn.prepare(SELECT_ENTRY).map_err(storage_err)?;
            let raws = stmt
                .query_map([], RawEntry::from_row)
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;

            raws.into_iter().map(RawEntry::into_entry).collect()
        })
        .await
        .map_err(join_err)?
    }

    async fn list_oldest(&self, limit: usize) -> Result<Vec<CacheEntry>, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_err)?;

            let sql = format!("{SELECT_ENTRY} ORDER BY created_at ASC LIMIT ?1");
            let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
            let raws = stmt
                .query_map(params![limit as i64], RawEntry::from_row)
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;

            raws.into_iter().map(RawEntry::into_entry).collect()
        })
        .await
        .map_err(join_err)?
    }
}

fn storage_err<E: std::fmt::Display>(err: E) -> ApplicationError {
    ApplicationError::Storage(err.to_string())
}

fn join_err(err: task::JoinError) -> ApplicationError {
    ApplicationError::Internal(err.to_string())
}

/// Convert an embedding vector to bytes for storage
fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert stored bytes back to an embedding vector
fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or([0; 4]);
            f32::from_le_bytes(arr)
        })
        .collect()
}

/// Fixed-width RFC 3339 so stored timestamps order lexicographically
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ApplicationError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApplicationError::Storage(format!("Corrupt timestamp {s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use proptest::prelude::*;

    use super::*;

    fn memory_store() -> SqliteEmbeddingStore {
        // A pool of one so every operation sees the same in-memory db.
        let config = DatabaseConfig {
            path: ":memory:".to_string(),
            max_connections: 1,
            run_migrations: true,
        };
        SqliteEmbeddingStore::open(&config).unwrap()
    }

    fn key(model: &str, text: &str) -> CacheKey {
        CacheKey::for_text(ModelId::parse(model).unwrap(), text)
    }

    fn entry(model: &str, text: &str, vector: Vec<f32>) -> CacheEntry {
        CacheEntry::new(key(model, text), vector, Utc::now())
    }

    #[tokio::test]
    async fn put_and_get_roundtrip() {
        let store = memory_store();
        let original = entry("m1", "hello", vec![0.25, -1.5, 3.125]);

        store.put(&original).await.unwrap();
        let found = store.get(&original.key).await.unwrap().unwrap();

        assert_eq!(found.key, original.key);
        assert_eq!(found.vector, original.vector);
        assert_eq!(found.access_count, 0);
    }

    #[tokio::test]
    async fn get_absent_returns_none() {
        let store = memory_store();
        assert!(store.get(&key("m1", "missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn timestamps_survive_with_microsecond_precision() {
        let store = memory_store();
        let original = entry("m1", "hello", vec![1.0]);

        store.put(&original).await.unwrap();
        let found = store.get(&original.key).await.unwrap().unwrap();

        let drift = (found.created_at - original.created_at).abs();
        assert!(drift < Duration::milliseconds(1));
    }

    #[tokio::test]
    async fn put_overwrites_existing_entry() {
        let store = memory_store();
        let first = entry("m1", "hello", vec![1.0, 2.0]);
        store.put(&first).await.unwrap();

        let second = CacheEntry::new(first.key.clone(), vec![3.0, 4.0], Utc::now());
        store.put(&second).await.unwrap();

        let found = store.get(&first.key).await.unwrap().unwrap();
        assert_eq!(found.vector, vec![3.0, 4.0]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn touch_bumps_access_metadata() {
        let store = memory_store();
        let original = entry("m1", "hello", vec![1.0]);
        store.put(&original).await.unwrap();

        let later = Utc::now() + Duration::seconds(10);
        store.touch(&original.key, later).await.unwrap();
        store
            .touch(&original.key, later + Duration::seconds(1))
            .await
            .unwrap();

        let found = store.get(&original.key).await.unwrap().unwrap();
        assert_eq!(found.access_count, 2);
        assert!(found.last_accessed_at > original.last_accessed_at);
    }

    #[tokio::test]
    async fn touch_on_absent_key_is_a_noop() {
        let store = memory_store();
        store.touch(&key("m1", "missing"), Utc::now()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_reports_whether_entry_existed() {
        let store = memory_store();
        let original = entry("m1", "hello", vec![1.0]);
        store.put(&original).await.unwrap();

        assert!(store.delete(&original.key).await.unwrap());
        assert!(!store.delete(&original.key).await.unwrap());
        assert!(store.get(&original.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_older_than_respects_boundary() {
        let store = memory_store();
        let now = Utc::now();

        let stale = entry("m1", "stale", vec![1.0])
            .with_last_accessed_at(now - Duration::days(10));
        let fresh = entry("m1", "fresh", vec![2.0])
            .with_last_accessed_at(now - Duration::days(1));
        store.put(&stale).await.unwrap();
        store.put(&fresh).await.unwrap();

        let removed = store
            .delete_older_than(now - Duration::days(5))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(store.get(&stale.key).await.unwrap().is_none());
        let kept = store.get(&fresh.key).await.unwrap().unwrap();
        assert_eq!(kept.vector, vec![2.0]);
    }

    #[tokio::test]
    async fn delete_all_reports_removed_count() {
        let store = memory_store();
        store.put(&entry("m1", "a", vec![1.0])).await.unwrap();
        store.put(&entry("m1", "b", vec![2.0])).await.unwrap();
        store.put(&entry("m2", "a", vec![3.0])).await.unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 3);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn entries_are_isolated_per_model() {
        let store = memory_store();
        store.put(&entry("m1", "a", vec![1.0])).await.unwrap();
        store.put(&entry("m2", "a", vec![2.0])).await.unwrap();

        let m1 = store.get(&key("m1", "a")).await.unwrap().unwrap();
        let m2 = store.get(&key("m2", "a")).await.unwrap().unwrap();
        assert_eq!(m1.vector, vec![1.0]);
        assert_eq!(m2.vector, vec![2.0]);
    }

    #[tokio::test]
    async fn list_all_returns_every_entry() {
        let store = memory_store();
        store.put(&entry("m1", "a", vec![1.0])).await.unwrap();
        store.put(&entry("m2", "b", vec![2.0])).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn list_oldest_orders_by_creation_and_limits() {
        let store = memory_store();
        let now = Utc::now();

        for (i, text) in ["first", "second", "third"].iter().enumerate() {
            let e = entry("m1", text, vec![1.0]).with_created_at(now + Duration::seconds(i as i64));
            store.put(&e).await.unwrap();
        }

        let oldest = store.list_oldest(2).await.unwrap();
        assert_eq!(oldest.len(), 2);
        assert!(oldest[0].created_at <= oldest[1].created_at);
        assert_eq!(oldest[0].key, key("m1", "first"));
    }

    #[tokio::test]
    async fn corrupt_dimension_column_fails_loudly() {
        let store = memory_store();
        let original = entry("m1", "hello", vec![1.0, 2.0, 3.0]);
        store.put(&original).await.unwrap();

        // Corrupt the recorded dimension behind the store's back.
        {
            let conn = store.pool.get().unwrap();
            conn.execute("UPDATE embeddings SET dimensions = 5", [])
                .unwrap();
        }

        let result = store.get(&original.key).await;
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::DimensionMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn corrupt_timestamp_is_a_storage_error_not_a_miss() {
        let store = memory_store();
        let original = entry("m1", "hello", vec![1.0]);
        store.put(&original).await.unwrap();

        {
            let conn = store.pool.get().unwrap();
            conn.execute("UPDATE embeddings SET created_at = 'garbage'", [])
                .unwrap();
        }

        let result = store.get(&original.key).await;
        assert!(matches!(result, Err(ApplicationError::Storage(_))));
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/cache.db");
        let config = DatabaseConfig {
            path: path.to_string_lossy().into_owned(),
            max_connections: 2,
            run_migrations: true,
        };

        assert!(SqliteEmbeddingStore::open(&config).is_ok());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn open_without_migrations_reports_errors_not_misses() {
        let config = DatabaseConfig {
            path: ":memory:".to_string(),
            max_connections: 1,
            run_migrations: false,
        };
        let store = SqliteEmbeddingStore::open(&config).unwrap();

        // The embeddings table does not exist, so a lookup is a storage
        // error rather than Ok(None).
        let result = store.get(&key("m1", "a")).await;
        assert!(matches!(result, Err(ApplicationError::Storage(_))));
    }

    #[test]
    fn vector_codec_roundtrip() {
        let vector = vec![0.1_f32, -0.2, 3.5e-5, f32::MAX, f32::MIN_POSITIVE];
        let bytes = vector_to_bytes(&vector);
        assert_eq!(bytes.len(), vector.len() * 4);

        let restored = bytes_to_vector(&bytes);
        assert_eq!(vector.len(), restored.len());
        for (a, b) in vector.iter().zip(restored.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn empty_vector_codec() {
        assert!(vector_to_bytes(&[]).is_empty());
        assert!(bytes_to_vector(&[]).is_empty());
    }

    #[test]
    fn format_timestamp_is_fixed_width() {
        let a = format_timestamp(Utc::now());
        let b = format_timestamp(Utc::now() + Duration::nanoseconds(1));
        assert_eq!(a.len(), b.len());
    }

    proptest! {
        #[test]
        fn codec_roundtrip_is_bit_exact(vector in proptest::collection::vec(any::<f32>(), 0..64)) {
            let restored = bytes_to_vector(&vector_to_bytes(&vector));
            prop_assert_eq!(vector.len(), restored.len());
            for (a, b) in vector.iter().zip(restored.iter()) {
                prop_assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }
}
