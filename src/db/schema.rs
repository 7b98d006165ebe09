//! SQL DDL for the document store.
//!
//! Every document lives in `documents`, keyed by `(owner, collection, id)`, with its
//! JSON body and the timestamp it is listed by. All DDL uses `IF NOT EXISTS` for
//! idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Per-user document collections
CREATE TABLE IF NOT EXISTS documents (
    owner TEXT NOT NULL,
    collection TEXT NOT NULL CHECK(collection IN ('thoughts','favorites')),
    id TEXT NOT NULL,
    sort_key TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (owner, collection, id)
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
