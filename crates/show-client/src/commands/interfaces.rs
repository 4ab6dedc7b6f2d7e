//! `show interfaces ...` handlers.

use super::{display_aliases, resolve_interfaces, OPTION_INTERFACES};
use crate::context::ShowContext;
use crate::counters::{self, Snapshot, APP_PORT_TABLE_NAME, MISSING, PORT_COUNTERS};
use crate::db::{self, Database, Fields, TableSelector};
use crate::naming::{natsort, AliasMap, NamingMode, CFG_PORT_TABLE_NAME};
use crate::response::to_json;
use serde::Serialize;
use sonic_cli_dispatch::{CmdArgs, CommandError, CommandResult, OptionMap};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

const STATE_PORT_OPERR_TABLE: &str = "PORT_OPERR_TABLE";

/// Count and last-seen fields of every port operational error.
const PORT_ERRORS: [(&str, &str); 14] = [
    ("oper_error_status", "oper_error_status_time"),
    ("mac_local_fault_count", "mac_local_fault_time"),
    ("mac_remote_fault_count", "mac_remote_fault_time"),
    ("fec_sync_loss_count", "fec_sync_loss_time"),
    ("fec_alignment_loss_count", "fec_alignment_loss_time"),
    ("high_ser_error_count", "high_ser_error_time"),
    ("high_ber_error_count", "high_ber_error_time"),
    ("data_unit_crc_error_count", "data_unit_crc_error_time"),
    ("data_unit_misalignment_error_count", "data_unit_misalignment_error_time"),
    ("signal_local_error_count", "signal_local_error_time"),
    ("crc_rate_count", "crc_rate_time"),
    ("data_unit_size_count", "data_unit_size_time"),
    ("code_group_error_count", "code_group_error_time"),
    ("no_rx_reachability_count", "no_rx_reachability_time"),
];

pub async fn get_interface_counters(
    ctx: Arc<ShowContext>,
    _args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let mode = NamingMode::from_options(&options)?;
    let requested = options.strings(OPTION_INTERFACES).unwrap_or_default();
    let names = resolve_interfaces(&ctx, requested, mode).await?;

    let facade = ctx.db.as_ref();
    let names = &names;
    let snapshot = counters::sample(&ctx, &options, &PORT_COUNTERS, move || {
        counters::port_snapshot(facade, names)
    })
    .await?;

    let snapshot = match display_aliases(&ctx, mode).await? {
        Some(aliases) => snapshot
            .into_iter()
            .map(|(name, counters)| (aliases.to_display(&name, mode), counters))
            .collect(),
        None => snapshot,
    };
    to_json::<Snapshot>(&snapshot)
}

pub async fn get_interface_alias(
    ctx: Arc<ShowContext>,
    args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let mode = NamingMode::from_options(&options)?;
    let aliases = AliasMap::load(ctx.db.as_ref()).await?;
    let ports = db::rows(
        ctx.db.as_ref(),
        TableSelector::table(Database::ConfigDb, CFG_PORT_TABLE_NAME),
    )
    .await?;

    let row = |name: &str| {
        let alias = aliases.alias_of(name).unwrap_or(name).to_string();
        BTreeMap::from([("alias", alias)])
    };

    let intf = args.at(0);
    if !intf.is_empty() {
        let name = aliases.resolve_input(intf, mode)?;
        if !ports.contains_key(&name) {
            return Err(CommandError::not_found(format!(
                "Invalid interface name {}",
                name
            )));
        }
        return to_json(&BTreeMap::from([(name.clone(), row(&name))]));
    }

    let out: BTreeMap<&String, _> = ports.keys().map(|name| (name, row(name))).collect();
    to_json(&out)
}

#[derive(Debug, Serialize)]
struct NamingModeResponse {
    naming_mode: &'static str,
}

pub async fn get_interface_naming_mode(
    _ctx: Arc<ShowContext>,
    _args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let mode = NamingMode::from_options(&options)?;
    to_json(&NamingModeResponse {
        naming_mode: mode.as_str(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortErrorRow {
    #[serde(rename = "Port Errors")]
    pub port_errors: String,
    #[serde(rename = "Count")]
    pub count: String,
    #[serde(rename = "Last timestamp(UTC)")]
    pub last_timestamp: String,
}

/// `mac_local_fault_count` → `mac local fault`.
fn port_error_name(field: &str) -> String {
    field.replace('_', " ").replace(" count", "")
}

/// One row per known error type; absent counters read as never seen.
pub fn port_error_rows(errors: &Fields) -> Vec<PortErrorRow> {
    PORT_ERRORS
        .iter()
        .map(|(count, time)| PortErrorRow {
            port_errors: port_error_name(count),
            count: errors.get(*count).cloned().unwrap_or_else(|| "0".to_string()),
            last_timestamp: errors
                .get(*time)
                .cloned()
                .unwrap_or_else(|| "Never".to_string()),
        })
        .collect()
}

pub async fn get_interface_errors(
    ctx: Arc<ShowContext>,
    args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let intf = args.at(0);
    if intf.is_empty() {
        return Err(CommandError::invalid_argument("No interface name passed"));
    }
    let mode = NamingMode::from_options(&options)?;
    let name = resolve_interfaces(&ctx, &[intf.to_string()], mode)
        .await?
        .pop()
        .unwrap_or_default();

    let errors = db::hash(
        ctx.db.as_ref(),
        TableSelector::table(Database::StateDb, STATE_PORT_OPERR_TABLE).with_key(&name),
    )
    .await
    .unwrap_or_else(|e| {
        warn!(interface = %name, error = %e, "Failed to read port operational errors");
        Fields::new()
    });

    to_json(&port_error_rows(&errors))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDescription {
    #[serde(rename = "Oper")]
    pub oper: String,
    #[serde(rename = "Admin")]
    pub admin: String,
    #[serde(rename = "Alias")]
    pub alias: String,
    #[serde(rename = "Description")]
    pub description: String,
}

pub async fn get_interfaces_description(
    ctx: Arc<ShowContext>,
    args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let mode = NamingMode::from_options(&options)?;
    let intf = args.at(0);
    let wanted = if intf.is_empty() {
        None
    } else {
        resolve_interfaces(&ctx, &[intf.to_string()], mode).await?.pop()
    };

    let config = db::rows(
        ctx.db.as_ref(),
        TableSelector::table(Database::ConfigDb, CFG_PORT_TABLE_NAME),
    )
    .await?;
    let details = db::rows(
        ctx.db.as_ref(),
        TableSelector::table(Database::ApplDb, APP_PORT_TABLE_NAME),
    )
    .await?;

    let out: BTreeMap<&String, InterfaceDescription> = details
        .iter()
        .filter(|(name, _)| config.contains_key(*name))
        .filter(|(name, _)| wanted.as_ref().map_or(true, |w| w == *name))
        .map(|(name, fields)| {
            let get = |f: &str| fields.get(f).cloned().unwrap_or_else(|| MISSING.to_string());
            (
                name,
                InterfaceDescription {
                    oper: get("oper_status"),
                    admin: get("admin_status"),
                    alias: get("alias"),
                    description: fields.get("description").cloned().unwrap_or_default(),
                },
            )
        })
        .collect();

    debug!(interfaces = out.len(), "Assembled interface descriptions");
    to_json(&out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlapRow {
    #[serde(rename = "Interface")]
    pub interface: String,
    #[serde(rename = "Flap Count")]
    pub flap_count: String,
    #[serde(rename = "Admin")]
    pub admin: String,
    #[serde(rename = "Oper")]
    pub oper: String,
    #[serde(rename = "Link Down TimeStamp(UTC)")]
    pub link_down: String,
    #[serde(rename = "Link Up TimeStamp(UTC)")]
    pub link_up: String,
}

/// First letter upper case, the rest lower case.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn flap_row(name: &str, port: &Fields) -> FlapRow {
    let get = |f: &str, default: &str| {
        port.get(f)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };
    FlapRow {
        interface: name.to_string(),
        flap_count: get("flap_count", "Never"),
        admin: capitalize(&get("admin_status", "Unknown")),
        oper: capitalize(&get("oper_status", "Unknown")),
        link_down: get("last_down_time", "Never"),
        link_up: get("last_up_time", "Never"),
    }
}

pub async fn get_interface_flap(
    ctx: Arc<ShowContext>,
    args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let mode = NamingMode::from_options(&options)?;
    let ports = db::rows(
        ctx.db.as_ref(),
        TableSelector::table(Database::ApplDb, APP_PORT_TABLE_NAME),
    )
    .await?;

    let intf = args.at(0);
    let mut names: Vec<&String> = if intf.is_empty() {
        ports.keys().collect()
    } else {
        let name = resolve_interfaces(&ctx, &[intf.to_string()], mode)
            .await?
            .pop()
            .unwrap_or_default();
        match ports.get_key_value(&name) {
            Some((name, _)) => vec![name],
            None => {
                return Err(CommandError::not_found(format!(
                    "Invalid interface name {}",
                    name
                )))
            }
        }
    };
    natsort(&mut names);

    let rows: Vec<FlapRow> = names
        .into_iter()
        .filter_map(|name| ports.get(name).map(|port| flap_row(name, port)))
        .collect();
    to_json(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_port_error_names() {
        assert_eq!(port_error_name("oper_error_status"), "oper error status");
        assert_eq!(port_error_name("mac_local_fault_count"), "mac local fault");
        assert_eq!(port_error_name("no_rx_reachability_count"), "no rx reachability");
    }

    #[test]
    fn test_port_error_rows_defaults() {
        let errors = Fields::from([
            ("mac_local_fault_count".to_string(), "3".to_string()),
            ("mac_local_fault_time".to_string(), "2025-01-01 00:00:00".to_string()),
        ]);
        let rows = port_error_rows(&errors);
        assert_eq!(rows.len(), 14);
        assert_eq!(
            rows[1],
            PortErrorRow {
                port_errors: "mac local fault".to_string(),
                count: "3".to_string(),
                last_timestamp: "2025-01-01 00:00:00".to_string(),
            }
        );
        assert_eq!(rows[0].count, "0");
        assert_eq!(rows[0].last_timestamp, "Never");
    }

    #[test]
    fn test_flap_row_defaults_and_capitalization() {
        let port = Fields::from([
            ("admin_status".to_string(), "up".to_string()),
            ("oper_status".to_string(), "DOWN".to_string()),
            ("flap_count".to_string(), "7".to_string()),
        ]);
        let row = flap_row("Ethernet0", &port);
        assert_eq!(row.admin, "Up");
        assert_eq!(row.oper, "Down");
        assert_eq!(row.flap_count, "7");
        assert_eq!(row.link_down, "Never");

        let row = flap_row("Ethernet4", &Fields::new());
        assert_eq!(row.admin, "Unknown");
        assert_eq!(row.flap_count, "Never");
    }
}
