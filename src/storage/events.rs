use crate::types::NewEvent;
use rusqlite::{params, Connection};

const INSERT_EVENT: &str = "INSERT INTO events (timestamp, property, ip, user_agent, description)
     VALUES (?1, ?2, ?3, ?4, ?5)";
const COUNT_HITS: &str = "SELECT COUNT(id) FROM events WHERE property = ?1 AND timestamp > ?2";
const COUNT_UNIQUE: &str =
    "SELECT COUNT(DISTINCT ip) FROM events WHERE property = ?1 AND timestamp > ?2";

/// Outcome of writing a batch of events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertSummary {
    pub stored: usize,
    pub failed: usize,
}

/// Append one event and return its row id.
pub fn insert(conn: &Connection, event: &NewEvent) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached(INSERT_EVENT)?;
    stmt.execute(params![
        event.timestamp,
        event.property,
        event.ip,
        event.user_agent,
        event.description,
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Insert events one by one. A failed insert is logged and skipped; the
/// remaining events are still written.
pub fn insert_all(conn: &Connection, events: &[NewEvent]) -> InsertSummary {
    let mut summary = InsertSummary::default();
    for (index, event) in events.iter().enumerate() {
        match insert(conn, event) {
            Ok(_) => summary.stored += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(
                    index,
                    property = %event.property,
                    error = %e,
                    "failed to store event, skipping"
                );
            }
        }
    }
    summary
}

/// Number of events for `property` strictly after `since`.
pub fn count_hits(conn: &Connection, property: &str, since: i64) -> rusqlite::Result<i64> {
    conn.prepare_cached(COUNT_HITS)?
        .query_row(params![property, since], |row| row.get(0))
}

/// Number of distinct ips for `property` strictly after `since`.
pub fn count_unique(conn: &Connection, property: &str, since: i64) -> rusqlite::Result<i64> {
    conn.prepare_cached(COUNT_UNIQUE)?
        .query_row(params![property, since], |row| row.get(0))
}
