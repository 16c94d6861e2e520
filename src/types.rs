use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Shape identifier for `StatsResponse`. Bump when its fields change.
pub const STATS_VERSION: &str = "0.0.3";

/// An event as submitted by a client. Optional fields may be absent or null.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubmittedEvent {
    pub property: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /events`: either one event or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Batch(Vec<SubmittedEvent>),
    Single(SubmittedEvent),
}

impl EventPayload {
    pub fn into_events(self) -> Vec<SubmittedEvent> {
        match self {
            EventPayload::Batch(events) => events,
            EventPayload::Single(event) => vec![event],
        }
    }
}

/// Fully populated event, ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub timestamp: i64,
    pub property: String,
    pub ip: String,
    pub user_agent: String,
    pub description: String,
}

/// Query parameters for `GET /stats`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatsParams {
    pub property: Option<String>,
}

impl StatsParams {
    /// Read parameters from a raw query string. Repeated keys keep their
    /// first value; undecodable escapes are taken literally.
    pub fn from_query(query: Option<&str>) -> Self {
        let property = query.and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "property")
                .map(|(_, value)| value.into_owned())
        });
        Self { property }
    }
}

/// Windowed hit counts for one property.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub version: String,
    pub last_month_unique_hits: i64,
    pub last_day_unique_hits: i64,
    pub last_month_hits: i64,
    pub last_day_hits: i64,
}

impl Default for StatsResponse {
    fn default() -> Self {
        Self {
            version: STATS_VERSION.to_string(),
            last_month_unique_hits: 0,
            last_day_unique_hits: 0,
            last_month_hits: 0,
            last_day_hits: 0,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db_ok: bool,
}
