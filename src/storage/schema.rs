//! Database schema definitions
//!
//! Every keyspace lives in one table; `(keyspace, key)` is the primary key so
//! range scans within a keyspace come back in key order.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    keyspace TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (keyspace, key)
) WITHOUT ROWID;
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
