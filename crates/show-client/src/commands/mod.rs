//! Show command handlers and their registration.
//!
//! Every handler has the shape
//! `async fn(Arc<ShowContext>, CmdArgs, OptionMap) -> CommandResult<Vec<u8>>`
//! and is registered exactly once in [`build_registry`].

pub mod arp;
pub mod interfaces;
pub mod mac;
pub mod ndp;
pub mod queue;
pub mod rif;

use crate::context::ShowContext;
use crate::naming::{AliasMap, NamingMode, SONIC_CLI_IFACE_MODE};
use sonic_cli_dispatch::{
    CmdArgs, CommandDescriptor, CommandResult, Dispatcher, OptionMap, OptionSpec, Registry,
    RegistryError,
};
use tracing::info;

pub const OPTION_IFACE: &str = "iface";
pub const OPTION_INTERFACES: &str = "interfaces";
pub const OPTION_VERBOSE: &str = "verbose";
pub const OPTION_DISPLAY: &str = "display";
pub const OPTION_NAMESPACE: &str = "namespace";
pub const OPTION_JSON: &str = "json";
pub const OPTION_NONZERO: &str = "nonzero";
pub const OPTION_TRIM: &str = "trim";
pub const OPTION_QUEUE_TYPE: &str = "queue-type";
pub const OPTION_VLAN: &str = "vlan";
pub const OPTION_PORT: &str = "port";
pub const OPTION_ADDRESS: &str = "address";
pub const OPTION_TYPE: &str = "type";
pub const OPTION_COUNT: &str = "count";

fn verbose() -> OptionSpec {
    OptionSpec::bool(OPTION_VERBOSE).description("Enable verbose output")
}

fn namespace() -> OptionSpec {
    OptionSpec::string(OPTION_NAMESPACE)
        .description("Namespace name or all")
        .unimplemented()
}

fn display() -> OptionSpec {
    OptionSpec::string(OPTION_DISPLAY).description("Show internal interfaces [all|frontend]")
}

fn interfaces_list() -> OptionSpec {
    OptionSpec::string_list(OPTION_INTERFACES).description("Comma separated interface names")
}

fn period() -> OptionSpec {
    OptionSpec::int(crate::counters::PERIOD_OPTION)
        .description("Display statistics over a specified period (in seconds)")
}

/// Builds the registry of every show command.
pub fn build_registry() -> Result<Registry<ShowContext>, RegistryError> {
    let mut registry = Registry::new();

    registry.register(
        &["SHOW", "arp"],
        CommandDescriptor::new(arp::get_arp)
            .description("SHOW/arp/{IPADDRESS}[OPTIONS]: Show IP ARP table")
            .args(0, 1)
            .option(OptionSpec::string(OPTION_IFACE).description("Interface name")),
    )?;

    registry.register(
        &["SHOW", "ndp"],
        CommandDescriptor::new(ndp::get_ndp)
            .description("SHOW/ndp/{IP6ADDRESS}[OPTIONS]: Show IPv6 Neighbour table")
            .args(0, 1)
            .option(OptionSpec::string(OPTION_IFACE).description("Interface name"))
            .option(verbose()),
    )?;

    registry.register(
        &["SHOW", "mac"],
        CommandDescriptor::new(mac::get_mac_table)
            .description("SHOW/mac[OPTIONS]: Show MAC (FDB) entries")
            .args(0, 0)
            .option(OptionSpec::int(OPTION_VLAN).description("VLAN ID"))
            .option(OptionSpec::string(OPTION_PORT).description("Port name"))
            .option(OptionSpec::string(OPTION_ADDRESS).description("MAC address"))
            .option(OptionSpec::string(OPTION_TYPE).description("Entry type [dynamic|static]"))
            .option(OptionSpec::bool(OPTION_COUNT).description("Show only the entry count"))
            .option(verbose()),
    )?;

    registry.register_hints(
        &["SHOW", "interfaces"],
        "SHOW/interfaces/COMMAND[OPTIONS]: Show interface information",
        [
            ("alias", "show/interfaces/alias: Show Interface Name/Alias Mapping"),
            ("counters", "show/interfaces/counters: Show interface counters"),
            ("description", "show/interfaces/description: Show interface status, protocol and description"),
            ("errors", "show/interfaces/errors: Show Interface Errors <interfacename>"),
            ("flap", "show/interfaces/flap: Show Interface Flap Information"),
            ("naming_mode", "show/interfaces/naming_mode: Show interface naming_mode status"),
        ],
    )?;

    registry.register(
        &["SHOW", "interfaces", "counters"],
        CommandDescriptor::new(interfaces::get_interface_counters)
            .description("SHOW/interfaces/counters[OPTIONS]: Show interface counters")
            .args(0, 0)
            .subcommand("rif", "show/interfaces/counters/rif: Show interface counters rif")
            .option(namespace())
            .option(display())
            .option(interfaces_list())
            .option(period())
            .option(OptionSpec::bool(OPTION_JSON).description("Print in JSON format"))
            .option(verbose()),
    )?;

    registry.register(
        &["SHOW", "interfaces", "counters", "rif"],
        CommandDescriptor::new(rif::get_interface_rif_counters)
            .description("SHOW/interfaces/counters/rif/{INTERFACENAME}[OPTIONS]: Show interface counters rif")
            .args(0, 1)
            .option(period()),
    )?;

    registry.register(
        &["SHOW", "interfaces", "alias"],
        CommandDescriptor::new(interfaces::get_interface_alias)
            .description("SHOW/interfaces/alias/{INTERFACENAME}[OPTIONS]: Show Interface Name/Alias Mapping")
            .args(0, 1)
            .option(namespace())
            .option(display()),
    )?;

    registry.register(
        &["SHOW", "interfaces", "naming_mode"],
        CommandDescriptor::new(interfaces::get_interface_naming_mode)
            .description("SHOW/interfaces/naming_mode[OPTIONS]: Show interface naming_mode status")
            .args(0, 0)
            .option(verbose()),
    )?;

    registry.register(
        &["SHOW", "interfaces", "errors"],
        CommandDescriptor::new(interfaces::get_interface_errors)
            .description("SHOW/interfaces/errors/{INTERFACENAME}[OPTIONS]: Show Interface Errors <interfacename>")
            .args(1, 1),
    )?;

    registry.register(
        &["SHOW", "interfaces", "description"],
        CommandDescriptor::new(interfaces::get_interfaces_description)
            .description("SHOW/interfaces/description/{INTERFACENAME}[OPTIONS]: Show interface status, protocol and description")
            .args(0, 1)
            .option(namespace())
            .option(display().unimplemented())
            .option(verbose()),
    )?;

    registry.register(
        &["SHOW", "interfaces", "flap"],
        CommandDescriptor::new(interfaces::get_interface_flap)
            .description("SHOW/interfaces/flap/{INTERFACENAME}[OPTIONS]: Show Interface Flap Information")
            .args(0, 1),
    )?;

    registry.register_hints(
        &["SHOW", "queue"],
        "SHOW/queue/COMMAND[OPTIONS]: Show queue information",
        [
            ("counters", "show/queue/counters: Show queue counters"),
            ("watermark", "show/queue/watermark: Show user WM for queues"),
        ],
    )?;

    registry.register(
        &["SHOW", "queue", "counters"],
        CommandDescriptor::new(queue::get_queue_counters)
            .description("SHOW/queue/counters/{INTERFACENAME}[OPTIONS]: Show queue counters")
            .args(0, 1)
            .option(interfaces_list())
            .option(display())
            .option(OptionSpec::bool(OPTION_NONZERO).description("Display only non-zero counters"))
            .option(OptionSpec::bool(OPTION_TRIM).description("Display only trimming counters"))
            .option(namespace())
            .option(verbose()),
    )?;

    registry.register(
        &["SHOW", "queue", "watermark"],
        CommandDescriptor::new(queue::get_queue_user_watermarks)
            .description("SHOW/queue/watermark[OPTIONS]: Show user WM for queues")
            .args(0, 0)
            .option(interfaces_list())
            .option(
                OptionSpec::string(OPTION_QUEUE_TYPE)
                    .description("Queue type [all|unicast|multicast]")
                    .required(),
            ),
    )?;

    info!(commands = registry.len(), "Built show command registry");
    Ok(registry)
}

/// Builds the dispatcher with the global naming-mode option.
pub fn build_dispatcher() -> Result<Dispatcher<ShowContext>, RegistryError> {
    Ok(Dispatcher::new(build_registry()?).with_global_option(
        OptionSpec::string(SONIC_CLI_IFACE_MODE)
            .description("Interface naming mode [default|alias]"),
    ))
}

/// Converts caller-supplied interface names to SONiC names. The alias map is
/// only read in alias mode.
pub(crate) async fn resolve_interfaces(
    ctx: &ShowContext,
    names: &[String],
    mode: NamingMode,
) -> CommandResult<Vec<String>> {
    if mode != NamingMode::Alias || names.is_empty() {
        return Ok(names.to_vec());
    }
    let aliases = AliasMap::load(ctx.db.as_ref()).await?;
    names
        .iter()
        .map(|name| aliases.resolve_input(name, mode))
        .collect()
}

/// Alias map for rendering names, or `None` in default mode.
pub(crate) async fn display_aliases(
    ctx: &ShowContext,
    mode: NamingMode,
) -> CommandResult<Option<AliasMap>> {
    match mode {
        NamingMode::Alias => Ok(Some(AliasMap::load(ctx.db.as_ref()).await?)),
        NamingMode::Default => Ok(None),
    }
}

/// The `interfaces` option followed by the first argument, deduplicated in
/// order.
pub(crate) fn requested_interfaces(args: &CmdArgs, options: &OptionMap) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let from_arg = Some(args.at(0)).filter(|s| !s.is_empty());
    for name in options
        .strings(OPTION_INTERFACES)
        .unwrap_or_default()
        .iter()
        .map(String::as_str)
        .chain(from_arg)
    {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
