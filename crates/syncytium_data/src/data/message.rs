use super::cell::CellId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Source or destination of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Cell(CellId),
    User,
    Broadcast,
}

impl Endpoint {
    pub fn cell(&self) -> Option<&CellId> {
        match self {
            Endpoint::Cell(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Cell(id) => f.write_str(id.as_str()),
            Endpoint::User => f.write_str("user"),
            Endpoint::Broadcast => f.write_str("broadcast"),
        }
    }
}

impl From<CellId> for Endpoint {
    fn from(id: CellId) -> Self {
        Endpoint::Cell(id)
    }
}

/// A transient message record. Messages live only long enough to be
/// delivered and displayed; the log is truncated every tick and stale
/// entries drop out of read snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub source: Endpoint,
    pub target: Endpoint,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Resolved hop sequence for routed sends.
    pub route: Option<Vec<CellId>>,
}

impl Message {
    pub fn new(source: Endpoint, target: Endpoint, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            content: content.into(),
            timestamp: Utc::now(),
            route: None,
        }
    }

    pub fn with_route(mut self, route: Vec<CellId>) -> Self {
        self.route = Some(route);
        self
    }
}
