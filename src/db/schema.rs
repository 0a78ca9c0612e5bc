//! Database schema and migrations

use rusqlite::Connection;

use crate::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
///
/// # Errors
///
/// Returns error if migration fails
pub fn init(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- Patient records, one row per patient name.
        -- allergic_food and schedule are comma-delimited, parsed by consumers.
        CREATE TABLE IF NOT EXISTS patients (
            name TEXT PRIMARY KEY,
            age INTEGER NOT NULL,
            disease TEXT NOT NULL,
            allergic_food TEXT NOT NULL DEFAULT '',
            schedule TEXT NOT NULL DEFAULT '',
            food_intake INTEGER NOT NULL DEFAULT 0,
            water_intake INTEGER NOT NULL DEFAULT 0
        );

        PRAGMA user_version = 1;
        ",
    )?;

    Ok(())
}
