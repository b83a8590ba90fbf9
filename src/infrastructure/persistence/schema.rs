//! Pin store schema.

use rusqlite::Connection;
use tracing::{debug, info};

/// Bumped whenever the schema below changes.
pub const SCHEMA_VERSION: i64 = 1;

fn user_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Enables foreign keys and creates missing tables.
pub fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let version = user_version(conn)?;
    if version >= SCHEMA_VERSION {
        debug!(version, "Pin store schema up to date");
        return Ok(());
    }

    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS pins (
            id          TEXT PRIMARY KEY,
            latitude    REAL NOT NULL,
            longitude   REAL NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS photos (
            id          TEXT PRIMARY KEY,
            pin_id      TEXT NOT NULL REFERENCES pins(id) ON DELETE CASCADE,
            remote_id   TEXT NOT NULL,
            server      TEXT NOT NULL,
            secret      TEXT NOT NULL,
            title       TEXT NOT NULL DEFAULT '',
            cache_key   TEXT NOT NULL,
            created_at  INTEGER NOT NULL,
            UNIQUE(pin_id, remote_id)
        );

        CREATE INDEX IF NOT EXISTS idx_photos_pin_created
            ON photos(pin_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_photos_cache_key
            ON photos(cache_key);
        CREATE INDEX IF NOT EXISTS idx_pins_coordinate
            ON pins(latitude, longitude);

        CREATE TABLE IF NOT EXISTS album_pages (
            pin_id      TEXT PRIMARY KEY REFERENCES pins(id) ON DELETE CASCADE,
            pages       INTEGER NOT NULL CHECK(pages >= 1)
        );
        ",
    )?;

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    info!(from = version, to = SCHEMA_VERSION, "Pin store schema initialized");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();

        assert_eq!(user_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO photos (id, pin_id, remote_id, server, secret, cache_key, created_at)
             VALUES ('p', 'missing', 'r', 's', 'x', 'k', 0)",
            [],
        );
        assert!(result.is_err());
    }
}
