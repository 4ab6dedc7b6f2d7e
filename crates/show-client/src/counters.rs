//! Counter snapshots and the two-snapshot diff.
//!
//! A snapshot maps an entity (interface) to its named counter values, all
//! rendered as strings. Cumulative counters are diffed between two samples;
//! everything else (rates, utilization, state) is taken from the newer
//! sample. Values that cannot be read are the [`MISSING`] sentinel.

use crate::context::ShowContext;
use crate::db::{self, Database, DbFacade, Fields, TableSelector};
use crate::error::{ShowError, ShowResult};
use crate::resolve::COUNTERS_PORT_NAME_MAP;
use sonic_cli_dispatch::{CommandError, CommandResult, OptionMap};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Sentinel for a counter that is absent, unparsable or reset.
pub const MISSING: &str = "N/A";

/// Option carrying the sampling period in seconds.
pub const PERIOD_OPTION: &str = "period";

pub const COUNTERS_TABLE: &str = "COUNTERS";
pub const RATES_TABLE: &str = "RATES";
pub const COUNTERS_RIF_NAME_MAP: &str = "COUNTERS_RIF_NAME_MAP";
pub const APP_PORT_TABLE_NAME: &str = "PORT_TABLE";

/// Counter name → value for one entity.
pub type CounterSet = BTreeMap<String, String>;

/// Entity → counters.
pub type Snapshot = BTreeMap<String, CounterSet>;

/// What a decreasing cumulative counter turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffPolicy {
    /// Report the [`MISSING`] sentinel.
    Missing,
    /// Report zero.
    ClampZero,
}

/// A family of counters sharing a diff policy.
#[derive(Debug, Clone, Copy)]
pub struct CounterFamily {
    pub name: &'static str,
    /// Fields that are diffed. All other fields pass through.
    pub cumulative: &'static [&'static str],
    pub policy: DiffPolicy,
}

impl CounterFamily {
    pub fn is_cumulative(&self, field: &str) -> bool {
        self.cumulative.contains(&field)
    }
}

pub const PORT_COUNTERS: CounterFamily = CounterFamily {
    name: "port",
    cumulative: &[
        "RxOk", "RxErr", "RxDrp", "RxOvr", "TxOk", "TxErr", "TxDrp", "TxOvr",
    ],
    policy: DiffPolicy::Missing,
};

pub const RIF_COUNTERS: CounterFamily = CounterFamily {
    name: "rif",
    cumulative: &[
        "RxOkPackets",
        "RxErrPackets",
        "TxOkPackets",
        "TxErrPackets",
        "RxErrBits",
        "TxErrBits",
        "RxOkBits",
        "TxOkBits",
    ],
    policy: DiffPolicy::ClampZero,
};

/// Difference of one cumulative counter. Never negative.
pub fn diff_value(old: &str, new: &str, policy: DiffPolicy) -> String {
    if old == MISSING || new == MISSING {
        return MISSING.to_string();
    }
    let (Ok(old), Ok(new)) = (old.parse::<i64>(), new.parse::<i64>()) else {
        return MISSING.to_string();
    };
    if new < old {
        return match policy {
            DiffPolicy::Missing => MISSING.to_string(),
            DiffPolicy::ClampZero => "0".to_string(),
        };
    }
    (new - old).to_string()
}

/// Diffs two snapshots. Entities only in `old` are dropped; entities only in
/// `new` are diffed against zero.
pub fn diff(old: &Snapshot, new: &Snapshot, family: &CounterFamily) -> Snapshot {
    new.iter()
        .map(|(entity, counters)| {
            let base = old.get(entity);
            let diffed = counters
                .iter()
                .map(|(field, value)| {
                    let value = if family.is_cumulative(field) {
                        let old_value = base
                            .and_then(|b| b.get(field))
                            .map(String::as_str)
                            .unwrap_or("0");
                        diff_value(old_value, value, family.policy)
                    } else {
                        value.clone()
                    };
                    (field.clone(), value)
                })
                .collect();
            (entity.clone(), diffed)
        })
        .collect()
}

/// Reads and bounds the `period` option. `None` means a single snapshot.
pub fn validate_period(options: &OptionMap, max_period: u64) -> CommandResult<Option<u64>> {
    let Some(period) = options.int(PERIOD_OPTION) else {
        return Ok(None);
    };
    match u64::try_from(period) {
        Ok(p) if p <= max_period => Ok(Some(p)),
        _ => Err(CommandError::invalid_argument(format!(
            "period value must be between 0 and {}, got {}",
            max_period, period
        ))),
    }
}

/// Sleeps for `period` unless the request is cancelled first.
pub async fn wait(cancel: &CancellationToken, period: Duration) -> CommandResult<()> {
    if period.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(CommandError::cancelled(
            "request cancelled while waiting between counter snapshots",
        )),
        _ = tokio::time::sleep(period) => Ok(()),
    }
}

/// Takes one snapshot, or two `period` seconds apart and returns their diff.
#[instrument(skip(ctx, options, family, snapshot), fields(family = family.name))]
pub async fn sample<F, Fut>(
    ctx: &ShowContext,
    options: &OptionMap,
    family: &CounterFamily,
    snapshot: F,
) -> CommandResult<Snapshot>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ShowResult<Snapshot>>,
{
    let period = validate_period(options, ctx.max_period)?;

    let first = snapshot().await?;
    let Some(period) = period else {
        return Ok(first);
    };

    debug!(period, entities = first.len(), "Waiting for second snapshot");
    wait(&ctx.cancel, Duration::from_secs(period)).await?;

    let second = snapshot().await?;
    Ok(diff(&first, &second, family))
}

/// Formats a byte rate as `B/s`, `KB/s` or `MB/s`.
pub fn format_bps(rate: &str) -> String {
    let Ok(value) = rate.parse::<f64>() else {
        return MISSING.to_string();
    };
    if value > 10.0 * 1e6 {
        format!("{:.2} MB/s", value / 1e6)
    } else if value > 10.0 * 1e3 {
        format!("{:.2} KB/s", value / 1e3)
    } else {
        format!("{:.2} B/s", value)
    }
}

/// Utilization of a port running at `speed` Mb/s given a byte rate.
pub fn utilization(rate: &str, speed: &str) -> String {
    match (rate.parse::<f64>(), speed.parse::<f64>()) {
        (Ok(rate), Ok(speed)) => {
            let util = rate / (speed * 1e6 / 8.0) * 100.0;
            format!("{:.2}%", util)
        }
        _ => MISSING.to_string(),
    }
}

/// One-letter port state: `U` up, `D` admin up but oper down, `X` otherwise.
pub fn compute_state(port: Option<&Fields>) -> &'static str {
    let Some(port) = port else {
        return "X";
    };
    let admin = port.get("admin_status").map(String::as_str);
    let oper = port.get("oper_status").map(String::as_str);
    match (admin, oper) {
        (Some("up"), Some("up")) => "U",
        (Some("up"), Some("down")) => "D",
        _ => "X",
    }
}

/// Sum of several integer counters, or [`MISSING`] if any is unusable.
pub fn sum_fields(counters: &Fields, names: &[&str]) -> String {
    let mut total: i64 = 0;
    for name in names {
        match counters.get(*name).and_then(|v| v.parse::<i64>().ok()) {
            Some(v) => total = total.saturating_add(v),
            None => return MISSING.to_string(),
        }
    }
    total.to_string()
}

/// A field's value, or [`MISSING`] when absent.
pub fn field_or_missing(fields: &Fields, name: &str) -> String {
    fields
        .get(name)
        .cloned()
        .unwrap_or_else(|| MISSING.to_string())
}

/// A field's value if it is a base-10 integer, else [`MISSING`].
pub fn int_field_or_missing(fields: &Fields, name: &str) -> String {
    match fields.get(name) {
        Some(v) if v.parse::<i64>().is_ok() => v.clone(),
        Some(v) => {
            warn!(field = name, value = %v, "Invalid counter value");
            MISSING.to_string()
        }
        None => MISSING.to_string(),
    }
}

async fn counters_for(facade: &dyn DbFacade, table: &str, oid: &str) -> ShowResult<Fields> {
    db::hash(
        facade,
        TableSelector::table(Database::CountersDb, table).with_key(oid),
    )
    .await
}

/// Port counter snapshot. An empty `interfaces` means every front panel
/// port; requested names that have no counters are dropped.
#[instrument(skip(facade))]
pub async fn port_snapshot(facade: &dyn DbFacade, interfaces: &[String]) -> ShowResult<Snapshot> {
    let names = db::hash(
        facade,
        TableSelector::table(Database::CountersDb, COUNTERS_PORT_NAME_MAP),
    )
    .await?;
    let port_table = db::rows(
        facade,
        TableSelector::table(Database::ApplDb, APP_PORT_TABLE_NAME),
    )
    .await?;

    let ports: Vec<(&String, &String)> = if interfaces.is_empty() {
        names
            .iter()
            .filter(|(name, _)| name.starts_with("Ethernet"))
            .collect()
    } else {
        interfaces
            .iter()
            .filter_map(|name| names.get_key_value(name))
            .collect()
    };

    let mut snapshot = Snapshot::new();
    for (name, oid) in ports {
        let counters = counters_for(facade, COUNTERS_TABLE, oid).await?;
        let rates = counters_for(facade, RATES_TABLE, oid).await?;
        let port = port_table.get(name.as_str());
        let speed = port
            .and_then(|p| p.get("speed"))
            .map(String::as_str)
            .unwrap_or(MISSING);
        let rx_bps = rates.get("RX_BPS").map(String::as_str).unwrap_or(MISSING);
        let tx_bps = rates.get("TX_BPS").map(String::as_str).unwrap_or(MISSING);

        let entry: CounterSet = [
            ("State", compute_state(port).to_string()),
            (
                "RxOk",
                sum_fields(
                    &counters,
                    &["SAI_PORT_STAT_IF_IN_UCAST_PKTS", "SAI_PORT_STAT_IF_IN_NON_UCAST_PKTS"],
                ),
            ),
            ("RxBps", format_bps(rx_bps)),
            ("RxUtil", utilization(rx_bps, speed)),
            ("RxErr", field_or_missing(&counters, "SAI_PORT_STAT_IF_IN_ERRORS")),
            ("RxDrp", field_or_missing(&counters, "SAI_PORT_STAT_IF_IN_DISCARDS")),
            ("RxOvr", field_or_missing(&counters, "SAI_PORT_STAT_ETHER_RX_OVERSIZE_PKTS")),
            (
                "TxOk",
                sum_fields(
                    &counters,
                    &["SAI_PORT_STAT_IF_OUT_UCAST_PKTS", "SAI_PORT_STAT_IF_OUT_NON_UCAST_PKTS"],
                ),
            ),
            ("TxBps", format_bps(tx_bps)),
            ("TxUtil", utilization(tx_bps, speed)),
            ("TxErr", field_or_missing(&counters, "SAI_PORT_STAT_IF_OUT_ERRORS")),
            ("TxDrp", field_or_missing(&counters, "SAI_PORT_STAT_IF_OUT_DISCARDS")),
            ("TxOvr", field_or_missing(&counters, "SAI_PORT_STAT_ETHER_TX_OVERSIZE_PKTS")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        snapshot.insert(name.clone(), entry);
    }

    debug!(entities = snapshot.len(), "Took port counter snapshot");
    Ok(snapshot)
}

/// Router interface name → counters oid. An empty map is an error.
pub async fn rif_name_map(facade: &dyn DbFacade) -> ShowResult<Fields> {
    let map = db::hash(
        facade,
        TableSelector::table(Database::CountersDb, COUNTERS_RIF_NAME_MAP),
    )
    .await?;
    if map.is_empty() {
        return Err(ShowError::database(
            "hgetall",
            format!("No {} in DB", COUNTERS_RIF_NAME_MAP),
        ));
    }
    Ok(map)
}

/// Router interface counter snapshot, for one interface or all of them.
#[instrument(skip(facade))]
pub async fn rif_snapshot(facade: &dyn DbFacade, interface: Option<&str>) -> ShowResult<Snapshot> {
    const PREFIX: &str = "SAI_ROUTER_INTERFACE_STAT_";
    let rif_names = rif_name_map(facade).await?;

    let mut snapshot = Snapshot::new();
    for (name, oid) in &rif_names {
        if interface.is_some_and(|i| i != name.as_str()) {
            continue;
        }
        if oid.is_empty() {
            warn!(rif = %name, "Empty OID for router interface");
            continue;
        }

        let counters = counters_for(facade, COUNTERS_TABLE, oid).await?;
        let rates = counters_for(facade, RATES_TABLE, oid).await?;
        let stat = |suffix: &str| int_field_or_missing(&counters, &format!("{}{}", PREFIX, suffix));

        let entry: CounterSet = [
            ("RxOkPackets", stat("IN_PACKETS")),
            ("RxBps", field_or_missing(&rates, "RX_BPS")),
            ("RxPps", field_or_missing(&rates, "RX_PPS")),
            ("RxErrPackets", stat("IN_ERROR_PACKETS")),
            ("TxOkPackets", stat("OUT_PACKETS")),
            ("TxBps", field_or_missing(&rates, "TX_BPS")),
            ("TxPps", field_or_missing(&rates, "TX_PPS")),
            ("TxErrPackets", stat("OUT_ERROR_PACKETS")),
            ("RxErrBits", stat("IN_ERROR_OCTETS")),
            ("TxErrBits", stat("OUT_ERROR_OCTETS")),
            ("RxOkBits", stat("IN_OCTETS")),
            ("TxOkBits", stat("OUT_OCTETS")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        snapshot.insert(name.clone(), entry);
    }

    debug!(entities = snapshot.len(), "Took router interface counter snapshot");
    Ok(snapshot)
}
