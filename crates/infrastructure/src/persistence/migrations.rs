//! Database migrations
//!
//! Manages database schema versioning. Rollbacks are manual: fix the
//! underlying issue, repair the database if needed, re-run migrations.
//!
//! Adding a new migration: increment `SCHEMA_VERSION`, add a
//! `migrate_vX` function, and call it from `run_migrations`.

use rusqlite::Connection;
use tracing::{debug, error, info};

use super::StoreOpenError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), StoreOpenError> {
    let current_version = get_schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        info!(
            from_version = current_version,
            to_version = SCHEMA_VERSION,
            "Running database migrations"
        );

        if current_version < 1 {
            if let Err(e) = migrate_v1(conn) {
                error!(version = 1, error = %e, "Migration V001 (embeddings table) failed");
                return Err(e);
            }
        }

        set_schema_version(conn, SCHEMA_VERSION)?;
        info!(version = SCHEMA_VERSION, "Database migrations complete");
    } else {
        debug!(version = current_version, "Database schema is up to date");
    }

    Ok(())
}

/// Get current schema version
fn get_schema_version(conn: &Connection) -> Result<i32, StoreOpenError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

/// Record the schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), StoreOpenError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// V001: the embeddings table
///
/// One row per `(model_id, content_hash)` pair. Vectors are stored as
/// little-endian f32 blobs; `dimensions` is authoritative, and the blob
/// length must equal `dimensions * 4` on read.
fn migrate_v1(conn: &Connection) -> Result<(), StoreOpenError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS embeddings (
            model_id         TEXT    NOT NULL,
            content_hash     TEXT    NOT NULL,
            vector           BLOB    NOT NULL,
            dimensions       INTEGER NOT NULL,
            created_at       TEXT    NOT NULL,
            last_accessed_at TEXT    NOT NULL,
            access_count     INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (model_id, content_hash)
        );

        CREATE INDEX IF NOT EXISTS idx_embeddings_last_accessed
            ON embeddings (last_accessed_at);

        CREATE INDEX IF NOT EXISTS idx_embeddings_created
            ON embeddings (created_at);
        ",
    )?;
    Ok(())
}
