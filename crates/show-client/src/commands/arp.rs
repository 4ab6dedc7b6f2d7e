//! `show arp`: the kernel IPv4 neighbor table with VLAN members resolved.

use super::OPTION_IFACE;
use crate::context::ShowContext;
use crate::host::{shellquote, ARP_CMD};
use crate::naming::{AliasMap, NamingMode};
use crate::resolve::{fetch_fdb, merge_neighbors_with_fdb, NeighborRecord};
use crate::response::{to_json, NeighborResponse};
use sonic_cli_dispatch::{CmdArgs, CommandError, CommandResult, OptionMap};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::debug;

/// Parses `arp -n` output. Only `ether` entries with a full set of columns
/// are kept.
pub fn parse_arp_output(output: &str) -> Vec<NeighborRecord> {
    output
        .lines()
        .filter(|line| line.contains("ether"))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            let mac = fields
                .iter()
                .position(|f| *f == "ether")
                .and_then(|i| fields.get(i + 1))
                .copied()
                .unwrap_or_default();
            Some(NeighborRecord {
                address: fields[0].to_string(),
                mac: mac.to_string(),
                iface: fields[fields.len() - 1].to_string(),
                status: None,
            })
        })
        .collect()
}

async fn arp_command(ctx: &ShowContext, args: &CmdArgs, options: &OptionMap) -> CommandResult<String> {
    let mode = NamingMode::from_options(options)?;
    let mut cmd = format!("{} -n", ARP_CMD);

    let ip = args.at(0);
    if !ip.is_empty() {
        let ip: Ipv4Addr = ip.parse().map_err(|_| {
            CommandError::invalid_argument(format!("invalid IPv4 address: {}", ip))
        })?;
        cmd.push_str(&format!(" {}", ip));
    }

    if let Some(iface) = options.string(OPTION_IFACE).filter(|s| !s.is_empty()) {
        let iface = if iface.starts_with("PortChannel") || iface.starts_with("eth") {
            iface.to_string()
        } else if mode == NamingMode::Alias {
            AliasMap::load(ctx.db.as_ref())
                .await?
                .resolve_input(iface, mode)?
        } else {
            iface.to_string()
        };
        cmd.push_str(&format!(" -i {}", shellquote(&iface)));
    }

    Ok(cmd)
}

pub async fn get_arp(
    ctx: Arc<ShowContext>,
    args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let cmd = arp_command(&ctx, &args, &options).await?;
    let output = ctx.host.run(&cmd).await?;
    if output.trim().is_empty() {
        return to_json(&NeighborResponse::default());
    }

    let records = parse_arp_output(&output);
    let fdb = fetch_fdb(ctx.db.as_ref()).await?;
    let mut entries = merge_neighbors_with_fdb(records, &fdb);
    entries.sort_by(|a, b| a.address.cmp(&b.address));
    debug!(entries = entries.len(), fdb = fdb.len(), "Assembled ARP table");

    to_json(&NeighborResponse::new(entries))
}
