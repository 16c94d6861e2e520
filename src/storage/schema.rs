use rusqlite::Connection;

pub const CREATE_EVENTS: &str = "
CREATE TABLE IF NOT EXISTS events (
    id          INTEGER NOT NULL PRIMARY KEY,
    timestamp   INTEGER NOT NULL,
    property    TEXT NOT NULL,
    ip          TEXT NOT NULL,
    user_agent  TEXT NOT NULL,
    description TEXT NOT NULL
);";

pub const INDEX_PROPERTY_TIMESTAMP: &str =
    "CREATE INDEX IF NOT EXISTS idx_property_timestamp ON events (property, timestamp);";

/// Create the events table and its index if they do not exist yet.
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_EVENTS)?;
    conn.execute_batch(INDEX_PROPERTY_TIMESTAMP)?;
    tracing::debug!("events schema ready");
    Ok(())
}
