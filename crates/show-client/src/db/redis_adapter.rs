//! Redis-backed [`DbFacade`].

use super::{query_store, Database, DbFacade, Fields, KeyStore, TableData, TableSelector};
use crate::config::DatabaseConfig;
use crate::error::{ShowError, ShowResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Facade holding one managed connection per SONiC database.
pub struct RedisFacade {
    connections: BTreeMap<Database, ConnectionManager>,
}

impl RedisFacade {
    /// Connects to every database named in `config`.
    #[instrument(skip_all)]
    pub async fn connect(config: &DatabaseConfig, timeout: Duration) -> ShowResult<Self> {
        let mut connections = BTreeMap::new();

        for db in Database::ALL {
            let url = config.url(db);
            debug!(db = %db, url = %url, "Connecting to Redis database");

            let client = Client::open(url)?;
            let manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
                .await
                .map_err(|_| {
                    ShowError::database("connect", format!("timed out connecting to {}", db))
                })??;
            connections.insert(db, manager);
        }

        debug!(count = connections.len(), "Connected to all Redis databases");
        Ok(Self { connections })
    }

    fn connection(&self, db: Database) -> ShowResult<ConnectionManager> {
        self.connections
            .get(&db)
            .cloned()
            .ok_or_else(|| ShowError::database("connect", format!("no connection for {}", db)))
    }
}

#[async_trait]
impl KeyStore for RedisFacade {
    async fn keys(&self, db: Database, pattern: &str) -> ShowResult<Vec<String>> {
        let mut conn = self.connection(db)?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        debug!(db = %db, pattern, count = keys.len(), "Listed keys");
        Ok(keys)
    }

    async fn hgetall(&self, db: Database, key: &str) -> ShowResult<Fields> {
        let mut conn = self.connection(db)?;
        let fields: Fields = conn.hgetall(key).await?;
        Ok(fields)
    }

    fn separator(&self, db: Database) -> String {
        db.default_separator().to_string()
    }
}

#[async_trait]
impl DbFacade for RedisFacade {
    #[instrument(skip(self, selectors), fields(count = selectors.len()))]
    async fn query(&self, selectors: &[TableSelector]) -> ShowResult<TableData> {
        query_store(self, selectors).await
    }

    async fn key_separator(&self, db: Database) -> ShowResult<String> {
        Ok(self.separator(db))
    }
}
