//! SONiC show commands served as read-only path queries.
//!
//! A query path such as `SHOW/interfaces/counters[period=5]` is routed by the
//! dispatcher from `sonic-cli-dispatch` to a handler in [`commands`]. Handlers
//! read the SONiC Redis databases through the [`db::DbFacade`] seam, run host
//! tools through [`host::HostCommand`], and answer with JSON bytes.

pub mod cache;
pub mod commands;
pub mod config;
pub mod context;
pub mod counters;
pub mod db;
pub mod error;
pub mod host;
pub mod naming;
pub mod resolve;
pub mod response;

pub use cache::{QueueType, SharedCaches};
pub use commands::{build_dispatcher, build_registry};
pub use config::ShowConfig;
pub use context::ShowContext;
pub use db::{Database, DbFacade, MemoryFacade, RedisFacade, TableSelector};
pub use error::{ShowError, ShowResult};
pub use host::{HostCommand, ShellRunner};
pub use naming::{AliasMap, NamingMode, SONIC_CLI_IFACE_MODE};
