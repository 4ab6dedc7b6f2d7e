//! Process-wide caches shared by every request.
//!
//! Only two values are worth keeping between requests: the COUNTERS_DB key
//! separator and the queue-type classification. Both are built at most once
//! and then read without locking.

use crate::db::{self, Database, DbFacade, TableSelector};
use crate::error::{ShowError, ShowResult};
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Queue name → oid (`Ethernet0:3` → `oid:0x15000000000003`).
pub const COUNTERS_QUEUE_NAME_MAP: &str = "COUNTERS_QUEUE_NAME_MAP";

/// Queue oid → `SAI_QUEUE_TYPE_*`.
pub const COUNTERS_QUEUE_TYPE_MAP: &str = "COUNTERS_QUEUE_TYPE_MAP";

/// Classification of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueType {
    Unicast,
    Multicast,
    All,
}

impl QueueType {
    /// Prefix used when rendering queue names (`UC0`, `MC10`).
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueType::Unicast => "UC",
            QueueType::Multicast => "MC",
            QueueType::All => "ALL",
        }
    }

    /// Parses a `SAI_QUEUE_TYPE_*` value.
    pub fn from_sai(value: &str) -> Option<Self> {
        match value {
            "SAI_QUEUE_TYPE_UNICAST" => Some(QueueType::Unicast),
            "SAI_QUEUE_TYPE_MULTICAST" => Some(QueueType::Multicast),
            "SAI_QUEUE_TYPE_ALL" => Some(QueueType::All),
            _ => None,
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue name → classification.
pub type QueueTypeMap = BTreeMap<String, QueueType>;

/// Init-once holder for the shared caches.
#[derive(Debug, Default)]
pub struct SharedCaches {
    counters_separator: OnceCell<String>,
    queue_types: OnceCell<QueueTypeMap>,
}

impl SharedCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// COUNTERS_DB key separator. A lookup failure falls back to the default
    /// separator, and the fallback is what gets cached.
    pub async fn counters_separator(&self, facade: &dyn DbFacade) -> &str {
        self.counters_separator
            .get_or_init(move || async move {
                match facade.key_separator(Database::CountersDb).await {
                    Ok(sep) => sep,
                    Err(e) => {
                        let fallback = Database::CountersDb.default_separator();
                        warn!(error = %e, fallback, "Failed to read COUNTERS_DB separator");
                        fallback.to_string()
                    }
                }
            })
            .await
    }

    /// Queue-type classification. Failures are returned and not cached, so a
    /// later request retries the build.
    pub async fn queue_types(&self, facade: &dyn DbFacade) -> ShowResult<&QueueTypeMap> {
        self.queue_types
            .get_or_try_init(|| build_queue_type_map(facade))
            .await
    }
}

async fn build_queue_type_map(facade: &dyn DbFacade) -> ShowResult<QueueTypeMap> {
    let names = db::hash(
        facade,
        TableSelector::table(Database::CountersDb, COUNTERS_QUEUE_NAME_MAP),
    )
    .await?;
    let types = db::hash(
        facade,
        TableSelector::table(Database::CountersDb, COUNTERS_QUEUE_TYPE_MAP),
    )
    .await?;

    if names.is_empty() || types.is_empty() {
        return Err(ShowError::database(
            "queue_types",
            format!(
                "{} or {} is empty",
                COUNTERS_QUEUE_NAME_MAP, COUNTERS_QUEUE_TYPE_MAP
            ),
        ));
    }

    let mut map = QueueTypeMap::new();
    for (queue, oid) in names {
        match types.get(&oid).and_then(|t| QueueType::from_sai(t)) {
            Some(queue_type) => {
                map.insert(queue, queue_type);
            }
            None => {
                debug!(queue = %queue, oid = %oid, "Queue has no known type");
            }
        }
    }

    debug!(count = map.len(), "Built queue-type map");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryFacade;

    fn queue_facade() -> MemoryFacade {
        MemoryFacade::new()
            .with_row(
                Database::CountersDb,
                COUNTERS_QUEUE_NAME_MAP,
                [("Ethernet0:0", "oid:0x15000000000001"), ("Ethernet0:8", "oid:0x15000000000009")],
            )
            .with_row(
                Database::CountersDb,
                COUNTERS_QUEUE_TYPE_MAP,
                [
                    ("oid:0x15000000000001", "SAI_QUEUE_TYPE_UNICAST"),
                    ("oid:0x15000000000009", "SAI_QUEUE_TYPE_MULTICAST"),
                ],
            )
    }

    #[tokio::test]
    async fn test_separator_cached_once() {
        let facade = MemoryFacade::new();
        facade.set_separator(Database::CountersDb, "|");
        let caches = SharedCaches::new();
        assert_eq!(caches.counters_separator(&facade).await, "|");

        facade.set_separator(Database::CountersDb, ":");
        assert_eq!(caches.counters_separator(&facade).await, "|");
    }

    #[tokio::test]
    async fn test_separator_falls_back_on_error() {
        let facade = MemoryFacade::new();
        facade.fail_key_separator(true);
        let caches = SharedCaches::new();
        assert_eq!(caches.counters_separator(&facade).await, ":");
    }

    #[tokio::test]
    async fn test_queue_types() {
        let caches = SharedCaches::new();
        let map = caches.queue_types(&queue_facade()).await.unwrap();
        assert_eq!(map.get("Ethernet0:0"), Some(&QueueType::Unicast));
        assert_eq!(map.get("Ethernet0:8"), Some(&QueueType::Multicast));
    }

    #[tokio::test]
    async fn test_queue_types_failure_not_cached() {
        let caches = SharedCaches::new();
        assert!(caches.queue_types(&MemoryFacade::new()).await.is_err());
        assert!(caches.queue_types(&queue_facade()).await.is_ok());
    }

    #[test]
    fn test_queue_type_from_sai() {
        assert_eq!(QueueType::from_sai("SAI_QUEUE_TYPE_ALL"), Some(QueueType::All));
        assert_eq!(QueueType::from_sai("bogus"), None);
        assert_eq!(QueueType::Multicast.to_string(), "MC");
    }
}
