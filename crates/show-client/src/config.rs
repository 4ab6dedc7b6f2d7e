//! Configuration file support for the show client
//!
//! Loads and validates configuration from TOML files.
//! Default location: /etc/sonic/show-client.conf

use crate::db::Database;
use crate::error::{ShowError, ShowResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/show-client.conf";

/// Upper bound accepted for `commands.max_period_secs`.
pub const MAX_SHOW_COMMAND_PERIOD: u64 = 300;

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Redis host
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    /// Redis port
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Redis unix socket; takes precedence over host/port when set
    #[serde(default)]
    pub unix_socket: Option<String>,

    /// Redis database number for APPL_DB
    #[serde(default = "default_appl_db_number")]
    pub appl_db_number: u32,

    /// Redis database number for ASIC_DB
    #[serde(default = "default_asic_db_number")]
    pub asic_db_number: u32,

    /// Redis database number for COUNTERS_DB
    #[serde(default = "default_counters_db_number")]
    pub counters_db_number: u32,

    /// Redis database number for CONFIG_DB
    #[serde(default = "default_config_db_number")]
    pub config_db_number: u32,

    /// Redis database number for STATE_DB
    #[serde(default = "default_state_db_number")]
    pub state_db_number: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

/// Command execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Largest `period` a counters command may sleep for
    #[serde(default = "default_max_period")]
    pub max_period_secs: u64,

    /// Deadline for one host command
    #[serde(default = "default_host_command_timeout")]
    pub host_command_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Complete show-client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub commands: CommandsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_appl_db_number() -> u32 {
    0
}

fn default_asic_db_number() -> u32 {
    1
}

fn default_counters_db_number() -> u32 {
    2
}

fn default_config_db_number() -> u32 {
    4
}

fn default_state_db_number() -> u32 {
    6
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_max_period() -> u64 {
    MAX_SHOW_COMMAND_PERIOD
}

fn default_host_command_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            unix_socket: None,
            appl_db_number: default_appl_db_number(),
            asic_db_number: default_asic_db_number(),
            counters_db_number: default_counters_db_number(),
            config_db_number: default_config_db_number(),
            state_db_number: default_state_db_number(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            max_period_secs: default_max_period(),
            host_command_timeout_secs: default_host_command_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DatabaseConfig {
    /// Redis database number serving `db`.
    pub fn number(&self, db: Database) -> u32 {
        match db {
            Database::ApplDb => self.appl_db_number,
            Database::AsicDb => self.asic_db_number,
            Database::CountersDb => self.counters_db_number,
            Database::ConfigDb => self.config_db_number,
            Database::StateDb => self.state_db_number,
        }
    }

    /// Connection URL for `db`.
    pub fn url(&self, db: Database) -> String {
        match &self.unix_socket {
            Some(socket) => format!("redis+unix://{}?db={}", socket, self.number(db)),
            None => format!(
                "redis://{}:{}/{}",
                self.redis_host,
                self.redis_port,
                self.number(db)
            ),
        }
    }
}

impl ShowConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> ShowResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ShowError::config(
                    path.display().to_string(),
                    format!("failed to parse config file: {}", e),
                )
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ShowError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> ShowResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Get connection timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.database.connection_timeout_secs)
    }

    /// Get host command timeout as Duration
    pub fn host_command_timeout(&self) -> Duration {
        Duration::from_secs(self.commands.host_command_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> ShowResult<()> {
        if self.database.unix_socket.is_none() && self.database.redis_port == 0 {
            return Err(ShowError::config("database.redis_port", "must be > 0"));
        }

        if self.commands.max_period_secs > MAX_SHOW_COMMAND_PERIOD {
            return Err(ShowError::config(
                "commands.max_period_secs",
                format!("must be <= {}", MAX_SHOW_COMMAND_PERIOD),
            ));
        }

        if self.commands.host_command_timeout_secs == 0 {
            return Err(ShowError::config(
                "commands.host_command_timeout_secs",
                "must be > 0",
            ));
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(ShowError::config(
                "logging.level",
                format!("invalid filter '{}'", self.logging.level),
            ));
        }

        Ok(())
    }
}
