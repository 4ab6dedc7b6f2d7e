//! In-memory [`DbFacade`] for fixtures and tests.
//!
//! Rows are stored under their full Redis key (`PORT|Ethernet0`), so the
//! same selector logic that runs against Redis runs here unchanged.
//!
//! Fixture files use the layout of a `sonic-db-dump`:
//!
//! ```json
//! {
//!   "CONFIG_DB": { "PORT|Ethernet0": { "alias": "etp1" } },
//!   "COUNTERS_DB": { "COUNTERS_PORT_NAME_MAP": { "Ethernet0": "oid:0x1000000000002" } }
//! }
//! ```

use super::{fields_of, query_store, Database, DbFacade, Fields, KeyStore, TableData, TableSelector};
use crate::error::{ShowError, ShowResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

type Store = BTreeMap<Database, BTreeMap<String, Fields>>;

#[derive(Debug, Default)]
pub struct MemoryFacade {
    store: RwLock<Store>,
    separators: RwLock<BTreeMap<Database, String>>,
    fail_separator: AtomicBool,
}

impl MemoryFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `fields` under the full key `key`, replacing any previous row.
    pub fn insert_row<I, K, V>(&self, db: Database, key: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.store
            .write()
            .entry(db)
            .or_default()
            .insert(key.into(), fields);
    }

    /// Builder form of [`MemoryFacade::insert_row`].
    pub fn with_row<I, K, V>(self, db: Database, key: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.insert_row(db, key, fields);
        self
    }

    /// Sets one field of a row, creating the row if needed.
    pub fn set_field(&self, db: Database, key: &str, field: &str, value: impl Into<String>) {
        self.store
            .write()
            .entry(db)
            .or_default()
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.into());
    }

    /// Removes a row. Returns whether it existed.
    pub fn remove_row(&self, db: Database, key: &str) -> bool {
        self.store
            .write()
            .get_mut(&db)
            .is_some_and(|rows| rows.remove(key).is_some())
    }

    /// Overrides the separator reported for `db`.
    pub fn set_separator(&self, db: Database, separator: impl Into<String>) {
        self.separators.write().insert(db, separator.into());
    }

    /// Makes `key_separator` fail, as when the database config is unreadable.
    pub fn fail_key_separator(&self, fail: bool) {
        self.fail_separator.store(fail, Ordering::Relaxed);
    }

    /// Builds a store from a dump keyed by database name.
    pub fn from_json(dump: &Value) -> ShowResult<Self> {
        let dbs = dump
            .as_object()
            .ok_or_else(|| ShowError::parse("fixture", "top level must be an object"))?;
        let facade = Self::new();

        for (db_name, rows) in dbs {
            let db: Database = db_name.parse()?;
            let rows = rows.as_object().ok_or_else(|| {
                ShowError::parse("fixture", format!("{} must map keys to rows", db_name))
            })?;
            for (key, fields) in rows {
                facade.insert_row(db, key.clone(), fields_of(fields));
            }
        }

        Ok(facade)
    }

    /// Loads a fixture dump from disk.
    pub fn load(path: impl AsRef<Path>) -> ShowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let dump: Value = serde_json::from_str(&content)?;
        Self::from_json(&dump)
    }
}

/// Translates a Redis glob into an anchored regex.
fn glob_to_regex(pattern: &str) -> ShowResult<Regex> {
    let mut re = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => re.push('['),
            ']' => re.push(']'),
            '\\' => {
                if let Some(next) = chars.next() {
                    re.push_str(&regex::escape(&next.to_string()));
                }
            }
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| ShowError::parse("key pattern", e.to_string()))
}

#[async_trait]
impl KeyStore for MemoryFacade {
    async fn keys(&self, db: Database, pattern: &str) -> ShowResult<Vec<String>> {
        let re = glob_to_regex(pattern)?;
        let store = self.store.read();
        Ok(store
            .get(&db)
            .map(|rows| rows.keys().filter(|k| re.is_match(k)).cloned().collect())
            .unwrap_or_default())
    }

    async fn hgetall(&self, db: Database, key: &str) -> ShowResult<Fields> {
        let store = self.store.read();
        Ok(store
            .get(&db)
            .and_then(|rows| rows.get(key))
            .cloned()
            .unwrap_or_default())
    }

    fn separator(&self, db: Database) -> String {
        db.default_separator().to_string()
    }
}

#[async_trait]
impl DbFacade for MemoryFacade {
    async fn query(&self, selectors: &[TableSelector]) -> ShowResult<TableData> {
        query_store(self, selectors).await
    }

    async fn key_separator(&self, db: Database) -> ShowResult<String> {
        if self.fail_separator.load(Ordering::Relaxed) {
            return Err(ShowError::database(
                "key_separator",
                format!("no separator configured for {}", db),
            ));
        }
        Ok(self
            .separators
            .read()
            .get(&db)
            .cloned()
            .unwrap_or_else(|| self.separator(db)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{hash, rows};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn facade() -> MemoryFacade {
        MemoryFacade::new()
            .with_row(Database::ConfigDb, "PORT|Ethernet0", [("alias", "etp1")])
            .with_row(Database::ConfigDb, "PORT|Ethernet4", [("alias", "etp2")])
            .with_row(
                Database::CountersDb,
                "COUNTERS_PORT_NAME_MAP",
                [("Ethernet0", "oid:0x1000000000002")],
            )
            .with_row(
                Database::AsicDb,
                "ASIC_STATE:SAI_OBJECT_TYPE_VLAN:oid:0x26000000000001",
                [("SAI_VLAN_ATTR_VLAN_ID", "100")],
            )
            .with_row(
                Database::AsicDb,
                "ASIC_STATE:SAI_OBJECT_TYPE_BRIDGE_PORT:oid:0x3a000000000002",
                [("SAI_BRIDGE_PORT_ATTR_PORT_ID", "oid:0x1000000000002")],
            )
    }

    #[tokio::test]
    async fn test_table_rows_strip_prefix() {
        let rows = rows(&facade(), TableSelector::table(Database::ConfigDb, "PORT"))
            .await
            .unwrap();
        assert_eq!(
            rows.keys().cloned().collect::<Vec<_>>(),
            vec!["Ethernet0".to_string(), "Ethernet4".to_string()]
        );
        assert_eq!(rows["Ethernet4"]["alias"], "etp2");
    }

    #[tokio::test]
    async fn test_keyless_table_returns_hash() {
        let fields = hash(
            &facade(),
            TableSelector::table(Database::CountersDb, "COUNTERS_PORT_NAME_MAP"),
        )
        .await
        .unwrap();
        assert_eq!(fields["Ethernet0"], "oid:0x1000000000002");
    }

    #[tokio::test]
    async fn test_exact_key_and_pattern() {
        let f = facade();
        let fields = hash(
            &f,
            TableSelector::table(Database::ConfigDb, "PORT").with_key("Ethernet0"),
        )
        .await
        .unwrap();
        assert_eq!(fields["alias"], "etp1");

        let vlans = rows(
            &f,
            TableSelector::table(Database::AsicDb, "ASIC_STATE")
                .with_key("SAI_OBJECT_TYPE_VLAN:*"),
        )
        .await
        .unwrap();
        assert_eq!(vlans.len(), 1);
        assert!(vlans.contains_key("SAI_OBJECT_TYPE_VLAN:oid:0x26000000000001"));
    }

    #[tokio::test]
    async fn test_merged_selectors() {
        let data = facade()
            .query(&[
                TableSelector::table(Database::ConfigDb, "PORT").with_key("Ethernet0"),
                TableSelector::table(Database::CountersDb, "COUNTERS_PORT_NAME_MAP"),
            ])
            .await
            .unwrap();
        assert_eq!(data["alias"], json!("etp1"));
        assert_eq!(data["Ethernet0"], json!("oid:0x1000000000002"));
    }

    #[tokio::test]
    async fn test_missing_data_is_empty() {
        let f = facade();
        assert!(rows(&f, TableSelector::table(Database::StateDb, "PORT_TABLE"))
            .await
            .unwrap()
            .is_empty());

        assert!(f.remove_row(Database::ConfigDb, "PORT|Ethernet0"));
        let fields = hash(
            &f,
            TableSelector::table(Database::ConfigDb, "PORT").with_key("Ethernet0"),
        )
        .await
        .unwrap();
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_from_json_dump() {
        let dump = json!({
            "APPL_DB": {"PORT_TABLE:Ethernet0": {"oper_status": "up", "speed": "100000"}},
            "STATE_DB": {"PORT_TABLE|Ethernet0": {"flap_count": "3"}},
        });
        let f = MemoryFacade::from_json(&dump).unwrap();
        let fields = hash(
            &f,
            TableSelector::table(Database::ApplDb, "PORT_TABLE").with_key("Ethernet0"),
        )
        .await
        .unwrap();
        assert_eq!(fields["speed"], "100000");

        assert!(MemoryFacade::from_json(&json!({"BOGUS_DB": {}})).is_err());
        assert!(MemoryFacade::from_json(&json!([])).is_err());
    }

    #[tokio::test]
    async fn test_separator_override_and_failure() {
        let f = MemoryFacade::new();
        assert_eq!(f.key_separator(Database::CountersDb).await.unwrap(), ":");
        f.set_separator(Database::CountersDb, "|");
        assert_eq!(f.key_separator(Database::CountersDb).await.unwrap(), "|");
        f.fail_key_separator(true);
        assert!(f.key_separator(Database::CountersDb).await.is_err());
    }

    #[test]
    fn test_glob_translation() {
        let re = glob_to_regex("ASIC_STATE:SAI_OBJECT_TYPE_FDB_ENTRY:*").unwrap();
        assert!(re.is_match("ASIC_STATE:SAI_OBJECT_TYPE_FDB_ENTRY:{\"mac\":\"00:11\"}"));
        assert!(!re.is_match("ASIC_STATE:SAI_OBJECT_TYPE_VLAN:oid:0x1"));

        let re = glob_to_regex("PORT|Ethernet?").unwrap();
        assert!(re.is_match("PORT|Ethernet4"));
        assert!(!re.is_match("PORT|Ethernet40"));
    }
}
