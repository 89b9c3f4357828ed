use std::error::Error;
use std::fmt;
use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

use crate::domain;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Version of the record payloads inside the containers. A stored value that
/// does not match triggers the destructive clear-and-reseed migration.
pub const CURRENT_DATA_VERSION: &str = "3.0";

/// Fixed container keys. The record store is two JSON arrays behind these.
pub const PROMPTS_KEY: &str = "prompts";
pub const CATEGORIES_KEY: &str = "categories";

const DATA_VERSION_META_KEY: &str = "data_version";

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "baseline_container_schema_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS container (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#,
}];

pub fn open_connection(path: &str) -> Result<Connection, StoreError> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    ensure_data_version(&conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

/// Compares the stored data version against [`CURRENT_DATA_VERSION`]. On a
/// mismatch (or first open) both containers are cleared and reseeded from the
/// compiled-in defaults. Destructive: no backup is taken here, `export` is the
/// escape hatch.
fn ensure_data_version(conn: &Connection) -> Result<bool, StoreError> {
    let stored = get_meta(conn, DATA_VERSION_META_KEY)?;
    if stored.as_deref() == Some(CURRENT_DATA_VERSION) {
        return Ok(false);
    }

    info!(
        stored = stored.as_deref().unwrap_or("<none>"),
        current = CURRENT_DATA_VERSION,
        "data version mismatch; clearing containers and reseeding defaults"
    );
    clear_containers(conn)?;
    seed_defaults(conn)?;
    set_meta(conn, DATA_VERSION_META_KEY, CURRENT_DATA_VERSION)?;
    Ok(true)
}

pub fn clear_containers(conn: &Connection) -> Result<(), StoreError> {
    set_container(conn, PROMPTS_KEY, "[]")?;
    set_container(conn, CATEGORIES_KEY, "[]")?;
    Ok(())
}

pub fn seed_defaults(conn: &Connection) -> Result<(), StoreError> {
    let dataset = domain::default_dataset().map_err(StoreError::Seed)?;
    set_container(
        conn,
        CATEGORIES_KEY,
        &serde_json::to_string(&dataset.categories)?,
    )?;
    set_container(conn, PROMPTS_KEY, &serde_json::to_string(&dataset.prompts)?)?;
    Ok(())
}

pub fn get_container(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM container WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_container(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        r#"
INSERT INTO container (key, value)
VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![key, value],
    )?;
    Ok(())
}

pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        r#"
INSERT INTO meta (key, value)
VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![key, value],
    )?;
    Ok(())
}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

#[derive(Debug)]
pub enum StoreError {
    Db(rusqlite::Error),
    Seed(toml::de::Error),
    Encode(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(err) => write!(f, "database error: {}", err),
            StoreError::Seed(err) => write!(f, "default dataset error: {}", err),
            StoreError::Encode(err) => write!(f, "container encoding error: {}", err),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Db(err) => Some(err),
            StoreError::Seed(err) => Some(err),
            StoreError::Encode(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Db(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Encode(value)
    }
}
