//! Path dispatch for SONiC show-command queries.
//!
//! This crate owns the part of the show client that knows nothing about
//! SONiC data:
//!
//! - [`path`]: query paths (`SHOW/interfaces/counters[period=5]`) and
//!   positional arguments
//! - [`option`]: typed option declarations and values
//! - [`registry`]: the trie of registered commands and help nodes
//! - [`dispatcher`]: resolve, validate, invoke
//! - [`error`]: the error kinds reported back to the protocol layer
//!
//! # Example
//!
//! ```ignore
//! use sonic_cli_dispatch::{CommandDescriptor, Dispatcher, OptionSpec, Path, Registry};
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     &["SHOW", "interfaces", "errors"],
//!     CommandDescriptor::new(get_interface_errors)
//!         .description("Show Interface Errors <interfacename>")
//!         .args(1, 1),
//! )?;
//!
//! let dispatcher = Dispatcher::new(registry)
//!     .with_global_option(OptionSpec::string("SONIC_CLI_IFACE_MODE"));
//! let body = dispatcher
//!     .dispatch(ctx, &Path::parse("SHOW/interfaces/errors/Ethernet0")?)
//!     .await?;
//! ```

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod option;
pub mod path;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use error::{CommandError, CommandResult, ErrorKind, RegistryError};
pub use handler::CommandHandler;
pub use option::{OptionKind, OptionMap, OptionSpec, OptionValue, Presence};
pub use path::{CmdArgs, Path, PathElem};
pub use registry::{CommandDescriptor, HintNode, Registry, Resolution};
