//! Query aggregation over the SONiC Redis databases.
//!
//! Handlers never talk to Redis directly. They describe what they want as
//! [`TableSelector`]s and receive a JSON mapping back from a [`DbFacade`]:
//!
//! - table only (`COUNTERS_DB/COUNTERS_PORT_NAME_MAP`): row key → fields, or
//!   the fields of the table hash itself when the table has no rows
//! - exact key (`APPL_DB/PORT_TABLE/Ethernet0`): the fields of that row
//! - key pattern (`ASIC_DB/ASIC_STATE/SAI_OBJECT_TYPE_FDB_ENTRY:*`): row key →
//!   fields for every matching row
//!
//! Results from several selectors are merged into one mapping.

pub mod memory;
pub mod redis_adapter;

pub use self::memory::MemoryFacade;
pub use self::redis_adapter::RedisFacade;

use crate::error::{ShowError, ShowResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field name → value of one stored row.
pub type Fields = BTreeMap<String, String>;

/// Result of a facade query.
pub type TableData = serde_json::Map<String, Value>;

/// SONiC databases consulted by show commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Database {
    ApplDb,
    AsicDb,
    CountersDb,
    ConfigDb,
    StateDb,
}

impl Database {
    pub const ALL: [Database; 5] = [
        Database::ApplDb,
        Database::AsicDb,
        Database::CountersDb,
        Database::ConfigDb,
        Database::StateDb,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Database::ApplDb => "APPL_DB",
            Database::AsicDb => "ASIC_DB",
            Database::CountersDb => "COUNTERS_DB",
            Database::ConfigDb => "CONFIG_DB",
            Database::StateDb => "STATE_DB",
        }
    }

    /// Separator between table name and row key when nothing else is known.
    pub fn default_separator(&self) -> &'static str {
        match self {
            Database::ConfigDb | Database::StateDb => "|",
            _ => ":",
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Database {
    type Err = ShowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Database::ALL
            .into_iter()
            .find(|db| db.name() == s)
            .ok_or_else(|| ShowError::parse("database name", format!("unknown database '{}'", s)))
    }
}

/// One `db/table[/key]` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSelector {
    pub db: Database,
    pub table: String,
    pub key: Option<String>,
}

impl TableSelector {
    pub fn table(db: Database, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// True when the key contains glob metacharacters.
    pub fn is_pattern(&self) -> bool {
        self.key
            .as_deref()
            .is_some_and(|k| k.contains(['*', '?', '[']))
    }
}

impl fmt::Display for TableSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.db, self.table)?;
        if let Some(key) = &self.key {
            write!(f, "/{}", key)?;
        }
        Ok(())
    }
}

/// Read-only access to the SONiC databases.
#[async_trait]
pub trait DbFacade: Send + Sync {
    /// Runs every selector and merges the results.
    async fn query(&self, selectors: &[TableSelector]) -> ShowResult<TableData>;

    /// Separator between table name and row key in `db`.
    async fn key_separator(&self, db: Database) -> ShowResult<String>;
}

/// The primitive operations a keyed store offers.
#[async_trait]
pub(crate) trait KeyStore: Send + Sync {
    async fn keys(&self, db: Database, pattern: &str) -> ShowResult<Vec<String>>;

    async fn hgetall(&self, db: Database, key: &str) -> ShowResult<Fields>;

    fn separator(&self, db: Database) -> String;
}

/// Answers selectors against a [`KeyStore`]. Shared by both facades so that
/// fixtures behave exactly like Redis.
pub(crate) async fn query_store<S: KeyStore + ?Sized>(
    store: &S,
    selectors: &[TableSelector],
) -> ShowResult<TableData> {
    let mut out = TableData::new();

    for selector in selectors {
        let sep = store.separator(selector.db);
        let prefix = format!("{}{}", selector.table, sep);

        match &selector.key {
            Some(key) if !selector.is_pattern() => {
                let fields = store.hgetall(selector.db, &format!("{}{}", prefix, key)).await?;
                out.extend(fields_to_json(fields));
            }
            key => {
                let pattern = format!("{}{}", prefix, key.as_deref().unwrap_or("*"));
                let keys = store.keys(selector.db, &pattern).await?;

                if keys.is_empty() && key.is_none() {
                    // Key-less hashes such as COUNTERS_PORT_NAME_MAP
                    let fields = store.hgetall(selector.db, &selector.table).await?;
                    out.extend(fields_to_json(fields));
                    continue;
                }

                for full_key in keys {
                    let fields = store.hgetall(selector.db, &full_key).await?;
                    let row = full_key
                        .strip_prefix(&prefix)
                        .unwrap_or(&full_key)
                        .to_string();
                    out.insert(row, Value::Object(fields_to_json(fields)));
                }
            }
        }
    }

    Ok(out)
}

fn fields_to_json(fields: Fields) -> TableData {
    fields
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

/// String-valued fields of a JSON object. Non-string values are skipped.
pub fn fields_of(value: &Value) -> Fields {
    value
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Queries one table and returns row key → fields.
pub async fn rows(
    db: &dyn DbFacade,
    selector: TableSelector,
) -> ShowResult<BTreeMap<String, Fields>> {
    let data = db.query(std::slice::from_ref(&selector)).await?;
    Ok(data
        .iter()
        .filter(|(_, v)| v.is_object())
        .map(|(k, v)| (k.clone(), fields_of(v)))
        .collect())
}

/// Queries one hash (an exact row, or a key-less table) and returns its fields.
pub async fn hash(db: &dyn DbFacade, selector: TableSelector) -> ShowResult<Fields> {
    let data = db.query(std::slice::from_ref(&selector)).await?;
    Ok(fields_of(&Value::Object(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_database_names_round_trip() {
        for db in Database::ALL {
            assert_eq!(db.name().parse::<Database>().unwrap(), db);
        }
        assert!("FLEX_COUNTER_DB".parse::<Database>().is_err());
    }

    #[test]
    fn test_default_separators() {
        assert_eq!(Database::ConfigDb.default_separator(), "|");
        assert_eq!(Database::StateDb.default_separator(), "|");
        assert_eq!(Database::CountersDb.default_separator(), ":");
        assert_eq!(Database::AsicDb.default_separator(), ":");
    }

    #[test]
    fn test_selector_display_and_pattern() {
        let sel = TableSelector::table(Database::AsicDb, "ASIC_STATE")
            .with_key("SAI_OBJECT_TYPE_VLAN:*");
        assert!(sel.is_pattern());
        assert_eq!(sel.to_string(), "ASIC_DB/ASIC_STATE/SAI_OBJECT_TYPE_VLAN:*");

        let sel = TableSelector::table(Database::ApplDb, "PORT_TABLE").with_key("Ethernet0");
        assert!(!sel.is_pattern());
        assert!(!TableSelector::table(Database::ApplDb, "PORT_TABLE").is_pattern());
    }

    #[test]
    fn test_fields_of_skips_non_strings() {
        let fields = fields_of(&json!({"admin_status": "up", "nested": {"a": "b"}, "mtu": 9100}));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("admin_status").map(String::as_str), Some("up"));
        assert!(fields_of(&json!("scalar")).is_empty());
    }
}
