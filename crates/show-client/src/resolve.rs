//! Identifier resolution chains.
//!
//! FDB entries in ASIC_DB name their port through two levels of object ids
//! and their VLAN through a bridge VLAN object. Turning them into
//! `(vlan, mac, interface)` takes three lookup maps, each built by an
//! independent stage below. Every stage silently drops rows it cannot
//! interpret; the final join has its own per-step miss policy:
//!
//! | step                      | on miss                         |
//! |---------------------------|---------------------------------|
//! | bridge port → port oid    | drop the FDB entry              |
//! | port oid → interface name | keep it, use the raw port oid   |
//! | bvid → VLAN number        | drop the FDB entry              |

use crate::db::{self, Database, DbFacade, Fields, TableSelector};
use crate::error::ShowResult;
use crate::naming::{is_valid_if_name, vlan_id};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, instrument};

pub const OID_PREFIX: &str = "oid:0x";

pub const COUNTERS_PORT_NAME_MAP: &str = "COUNTERS_PORT_NAME_MAP";
pub const COUNTERS_LAG_NAME_MAP: &str = "COUNTERS_LAG_NAME_MAP";
pub const ASIC_STATE_TABLE: &str = "ASIC_STATE";

const FDB_ENTRY_KEYS: &str = "SAI_OBJECT_TYPE_FDB_ENTRY:*";
const BRIDGE_PORT_KEYS: &str = "SAI_OBJECT_TYPE_BRIDGE_PORT:*";
const VLAN_KEYS: &str = "SAI_OBJECT_TYPE_VLAN:*";
const VLAN_KEY_PREFIX: &str = "SAI_OBJECT_TYPE_VLAN:";

const FDB_BRIDGE_PORT_ATTR: &str = "SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID";
const FDB_TYPE_ATTR: &str = "SAI_FDB_ENTRY_ATTR_TYPE";
const FDB_TYPE_STATIC: &str = "SAI_FDB_ENTRY_TYPE_STATIC";
const BRIDGE_PORT_PORT_ATTR: &str = "SAI_BRIDGE_PORT_ATTR_PORT_ID";
const VLAN_ID_ATTR: &str = "SAI_VLAN_ATTR_VLAN_ID";

/// VLAN column value for neighbors that are not on a VLAN interface.
pub const NO_VLAN: &str = "-";

/// Removes the `oid:0x` prefix, or `None` when it is absent.
fn strip_oid(value: &str) -> Option<&str> {
    value.strip_prefix(OID_PREFIX)
}

/// Stripped port oid → interface name, from the port and LAG name maps.
/// Names outside the known interface patterns and values without an oid
/// prefix are dropped.
pub fn interface_oid_map(port_names: &Fields, lag_names: &Fields) -> HashMap<String, String> {
    port_names
        .iter()
        .chain(lag_names.iter())
        .filter(|(name, _)| is_valid_if_name(name))
        .filter_map(|(name, oid)| strip_oid(oid).map(|oid| (oid.to_string(), name.clone())))
        .collect()
}

/// Stripped bridge port oid → stripped port oid, from ASIC_DB bridge port rows
/// keyed `SAI_OBJECT_TYPE_BRIDGE_PORT:oid:0x...`.
pub fn bridge_port_map(rows: &BTreeMap<String, Fields>) -> HashMap<String, String> {
    rows.iter()
        .filter_map(|(key, attrs)| {
            let (_, oid) = key.split_once(':')?;
            let bridge_port = strip_oid(oid)?;
            let port = strip_oid(attrs.get(BRIDGE_PORT_PORT_ATTR)?)?;
            Some((bridge_port.to_string(), port.to_string()))
        })
        .collect()
}

/// Bridge VLAN oid (`oid:0x...`, unstripped) → VLAN number, from ASIC_DB
/// VLAN rows.
pub fn bvid_map(rows: &BTreeMap<String, Fields>) -> HashMap<String, String> {
    rows.iter()
        .filter_map(|(key, attrs)| {
            let bvid = key.strip_prefix(VLAN_KEY_PREFIX)?;
            let vlan = attrs.get(VLAN_ID_ATTR)?;
            Some((bvid.to_string(), vlan.clone()))
        })
        .collect()
}

/// The three lookup maps, rebuilt for every request.
#[derive(Debug, Clone, Default)]
pub struct ResolutionMaps {
    pub if_oid: HashMap<String, String>,
    pub bridge_port: HashMap<String, String>,
    pub bvid: HashMap<String, String>,
}

impl ResolutionMaps {
    #[instrument(skip_all)]
    pub async fn build(facade: &dyn DbFacade) -> ShowResult<Self> {
        let port_names = db::hash(
            facade,
            TableSelector::table(Database::CountersDb, COUNTERS_PORT_NAME_MAP),
        )
        .await?;
        let lag_names = db::hash(
            facade,
            TableSelector::table(Database::CountersDb, COUNTERS_LAG_NAME_MAP),
        )
        .await?;
        let bridge_ports = db::rows(
            facade,
            TableSelector::table(Database::AsicDb, ASIC_STATE_TABLE).with_key(BRIDGE_PORT_KEYS),
        )
        .await?;
        let vlans = db::rows(
            facade,
            TableSelector::table(Database::AsicDb, ASIC_STATE_TABLE).with_key(VLAN_KEYS),
        )
        .await?;

        let maps = Self {
            if_oid: interface_oid_map(&port_names, &lag_names),
            bridge_port: bridge_port_map(&bridge_ports),
            bvid: bvid_map(&vlans),
        };
        debug!(
            interfaces = maps.if_oid.len(),
            bridge_ports = maps.bridge_port.len(),
            vlans = maps.bvid.len(),
            "Built resolution maps"
        );
        Ok(maps)
    }
}

/// How an FDB entry was installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FdbType {
    Dynamic,
    Static,
}

impl FdbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FdbType::Dynamic => "Dynamic",
            FdbType::Static => "Static",
        }
    }
}

impl fmt::Display for FdbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An FDB entry with every identifier resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BridgeMacEntry {
    pub vlan_id: u32,
    pub mac: String,
    pub if_name: String,
    pub entry_type: FdbType,
}

/// Joins raw FDB rows (keyed `SAI_OBJECT_TYPE_FDB_ENTRY:{json}`) against the
/// resolution maps.
pub fn resolve_fdb_entries(
    raw: &BTreeMap<String, Fields>,
    maps: &ResolutionMaps,
) -> Vec<BridgeMacEntry> {
    raw.iter()
        .filter_map(|(key, attrs)| resolve_fdb_entry(key, attrs, maps))
        .collect()
}

fn resolve_fdb_entry(key: &str, attrs: &Fields, maps: &ResolutionMaps) -> Option<BridgeMacEntry> {
    let (_, json) = key.split_once(':')?;
    let fdb: HashMap<String, String> = match serde_json::from_str(json) {
        Ok(fdb) => fdb,
        Err(e) => {
            debug!(key, error = %e, "Skipping FDB entry with malformed key");
            return None;
        }
    };

    let bridge_port = strip_oid(attrs.get(FDB_BRIDGE_PORT_ATTR)?)?;
    let Some(port) = maps.bridge_port.get(bridge_port) else {
        debug!(key, bridge_port, "Dropping FDB entry: unknown bridge port");
        return None;
    };
    let if_name = maps
        .if_oid
        .get(port)
        .cloned()
        .unwrap_or_else(|| port.clone());

    let vlan = match (fdb.get("vlan"), fdb.get("bvid")) {
        (Some(vlan), _) => vlan.as_str(),
        (None, Some(bvid)) => match maps.bvid.get(bvid) {
            Some(vlan) if !vlan.is_empty() => vlan.as_str(),
            _ => {
                debug!(key, bvid = %bvid, "Dropping FDB entry: unknown bvid");
                return None;
            }
        },
        (None, None) => return None,
    };
    let vlan_id = vlan.parse::<u32>().ok()?;

    let entry_type = match attrs.get(FDB_TYPE_ATTR).map(String::as_str) {
        Some(FDB_TYPE_STATIC) => FdbType::Static,
        _ => FdbType::Dynamic,
    };

    Some(BridgeMacEntry {
        vlan_id,
        mac: fdb.get("mac").cloned().unwrap_or_default(),
        if_name,
        entry_type,
    })
}

/// Reads and resolves the whole FDB.
#[instrument(skip_all)]
pub async fn fetch_fdb(facade: &dyn DbFacade) -> ShowResult<Vec<BridgeMacEntry>> {
    let raw = db::rows(
        facade,
        TableSelector::table(Database::AsicDb, ASIC_STATE_TABLE).with_key(FDB_ENTRY_KEYS),
    )
    .await?;
    let maps = ResolutionMaps::build(facade).await?;
    let entries = resolve_fdb_entries(&raw, &maps);
    debug!(raw = raw.len(), resolved = entries.len(), "Resolved FDB entries");
    Ok(entries)
}

/// A neighbor as reported by a host tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRecord {
    pub address: String,
    pub mac: String,
    pub iface: String,
    pub status: Option<String>,
}

/// A neighbor after the FDB merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborEntry {
    pub address: String,
    pub mac_address: String,
    pub iface: String,
    pub vlan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Replaces VLAN pseudo-interfaces with the member port that learned the MAC.
///
/// A neighbor on `VlanN` whose `(N, MAC)` is in the FDB takes the FDB
/// interface; one that is not keeps `VlanN`. Both carry `N` as the VLAN.
/// Neighbors on other interfaces carry [`NO_VLAN`].
pub fn merge_neighbors_with_fdb(
    neighbors: Vec<NeighborRecord>,
    fdb: &[BridgeMacEntry],
) -> Vec<NeighborEntry> {
    let lookup: HashMap<(String, String), &str> = fdb
        .iter()
        .map(|e| {
            (
                (e.vlan_id.to_string(), e.mac.to_uppercase()),
                e.if_name.as_str(),
            )
        })
        .collect();

    neighbors
        .into_iter()
        .map(|n| {
            let (iface, vlan) = match vlan_id(&n.iface) {
                Some(vlan) => {
                    let key = (vlan.to_string(), n.mac.to_uppercase());
                    let iface = lookup
                        .get(&key)
                        .map(|port| port.to_string())
                        .unwrap_or_else(|| n.iface.clone());
                    (iface, vlan.to_string())
                }
                None => (n.iface.clone(), NO_VLAN.to_string()),
            };
            NeighborEntry {
                address: n.address,
                mac_address: n.mac,
                iface,
                vlan,
                status: n.status,
            }
        })
        .collect()
}
