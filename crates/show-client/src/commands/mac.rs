//! `show mac`: the resolved FDB table.

use super::{
    display_aliases, resolve_interfaces, OPTION_ADDRESS, OPTION_COUNT, OPTION_PORT, OPTION_TYPE,
    OPTION_VLAN,
};
use crate::context::ShowContext;
use crate::naming::NamingMode;
use crate::resolve::{fetch_fdb, BridgeMacEntry, FdbType};
use crate::response::{to_json, CountResponse};
use serde::Serialize;
use sonic_cli_dispatch::{CmdArgs, CommandError, CommandResult, OptionMap};
use std::sync::Arc;
use tracing::debug;

/// One row of the MAC table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacEntry {
    pub vlan: u32,
    pub mac_address: String,
    pub port: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacResponse {
    pub entries: Vec<MacEntry>,
    pub total_entries: usize,
}

/// Row filters taken from the request options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacFilter {
    pub vlan: Option<u32>,
    pub port: Option<String>,
    pub address: Option<String>,
    pub entry_type: Option<FdbType>,
}

impl MacFilter {
    fn from_options(options: &OptionMap) -> CommandResult<Self> {
        let vlan = match options.int(OPTION_VLAN) {
            Some(v) => Some(u32::try_from(v).ok().filter(|v| (1..=4094).contains(v)).ok_or_else(
                || CommandError::invalid_argument(format!("invalid VLAN id {}", v)),
            )?),
            None => None,
        };
        let entry_type = match options.string(OPTION_TYPE) {
            Some(t) => Some(match t.to_ascii_lowercase().as_str() {
                "dynamic" => FdbType::Dynamic,
                "static" => FdbType::Static,
                _ => {
                    return Err(CommandError::invalid_argument(format!(
                        "invalid type '{}', expected 'dynamic' or 'static'",
                        t
                    )))
                }
            }),
            None => None,
        };
        Ok(Self {
            vlan,
            port: options.string(OPTION_PORT).map(String::from),
            address: options.string(OPTION_ADDRESS).map(str::to_uppercase),
            entry_type,
        })
    }

    pub fn matches(&self, entry: &BridgeMacEntry) -> bool {
        self.vlan.map_or(true, |v| v == entry.vlan_id)
            && self.port.as_deref().map_or(true, |p| p == entry.if_name)
            && self
                .address
                .as_deref()
                .map_or(true, |a| a == entry.mac.to_uppercase())
            && self.entry_type.map_or(true, |t| t == entry.entry_type)
    }
}

pub async fn get_mac_table(
    ctx: Arc<ShowContext>,
    _args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let mode = NamingMode::from_options(&options)?;
    let mut filter = MacFilter::from_options(&options)?;
    if let Some(port) = filter.port.take() {
        filter.port = resolve_interfaces(&ctx, &[port], mode).await?.pop();
    }

    let mut fdb: Vec<BridgeMacEntry> = fetch_fdb(ctx.db.as_ref())
        .await?
        .into_iter()
        .filter(|e| filter.matches(e))
        .collect();
    fdb.sort_by(|a, b| {
        (a.vlan_id, &a.mac, &a.if_name).cmp(&(b.vlan_id, &b.mac, &b.if_name))
    });
    debug!(entries = fdb.len(), "Filtered MAC table");

    if options.bool(OPTION_COUNT).unwrap_or(false) {
        return to_json(&CountResponse {
            total_entries: fdb.len(),
        });
    }

    let aliases = display_aliases(&ctx, mode).await?;
    let entries: Vec<MacEntry> = fdb
        .into_iter()
        .map(|e| MacEntry {
            vlan: e.vlan_id,
            port: match &aliases {
                Some(aliases) => aliases.to_display(&e.if_name, mode),
                None => e.if_name,
            },
            mac_address: e.mac,
            entry_type: e.entry_type.as_str().to_string(),
        })
        .collect();

    to_json(&MacResponse {
        total_entries: entries.len(),
        entries,
    })
}
