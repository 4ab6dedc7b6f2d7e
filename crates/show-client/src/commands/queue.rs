//! `show queue counters` and `show queue watermark`.
//!
//! Queues are named `<port><sep><index>` in COUNTERS_QUEUE_NAME_MAP, where
//! `<sep>` is the COUNTERS_DB key separator.

use super::{
    requested_interfaces, resolve_interfaces, OPTION_INTERFACES, OPTION_NONZERO,
    OPTION_QUEUE_TYPE, OPTION_TRIM,
};
use crate::cache::{QueueType, COUNTERS_QUEUE_NAME_MAP};
use crate::context::ShowContext;
use crate::counters::{field_or_missing, COUNTERS_TABLE};
use crate::db::{self, Database, DbFacade, Fields, TableSelector};
use crate::error::ShowResult;
use crate::naming::NamingMode;
use crate::response::to_json;
use sonic_cli_dispatch::{CmdArgs, CommandError, CommandResult, OptionMap};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

const USER_WATERMARKS_TABLE: &str = "USER_WATERMARKS";
const SHARED_WATERMARK_BYTES: &str = "SAI_QUEUE_STAT_SHARED_WATERMARK_BYTES";
const QUEUE_STAT_PREFIX: &str = "SAI_QUEUE_STAT_";
const PERIODIC_SUFFIX: &str = "periodic";

/// Output column, source stat and whether it belongs to the trimming group.
const QUEUE_COUNTERS: [(&str, &str, bool); 11] = [
    ("Counter/pkts", "PACKETS", false),
    ("Counter/bytes", "BYTES", false),
    ("Drop/pkts", "DROPPED_PACKETS", false),
    ("Drop/bytes", "DROPPED_BYTES", false),
    ("Trim/pkts", "TRIM_PACKETS", true),
    ("TrimSent/pkts", "TX_TRIM_PACKETS", true),
    ("TrimDrop/pkts", "DROPPED_TRIM_PACKETS", true),
    ("WredDrp/pkts", "WRED_DROPPED_PACKETS", false),
    ("WredDrp/bytes", "WRED_DROPPED_BYTES", false),
    ("EcnMarked/pkts", "WRED_ECN_MARKED_PACKETS", false),
    ("EcnMarked/bytes", "WRED_ECN_MARKED_BYTES", false),
];

type QueueRow = BTreeMap<&'static str, String>;

/// Renders one queue's counters. With `nonzero`, absent and zero values are
/// left out instead of reported.
pub fn queue_counter_row(counters: &Fields, only_trim: bool, only_nonzero: bool) -> QueueRow {
    QUEUE_COUNTERS
        .iter()
        .filter(|(_, _, trim)| !only_trim || *trim)
        .filter_map(|(column, stat, _)| {
            let stat = format!("{}{}", QUEUE_STAT_PREFIX, stat);
            if only_nonzero {
                counters
                    .get(&stat)
                    .filter(|v| !v.is_empty() && v.as_str() != "0")
                    .map(|v| (*column, v.clone()))
            } else {
                Some((*column, field_or_missing(counters, &stat)))
            }
        })
        .collect()
}

/// Queues of the selected ports. No ports means every front panel port.
async fn selected_queues(
    facade: &dyn DbFacade,
    separator: &str,
    ports: &[String],
) -> ShowResult<Vec<(String, String)>> {
    let names = db::hash(
        facade,
        TableSelector::table(Database::CountersDb, COUNTERS_QUEUE_NAME_MAP),
    )
    .await?;
    Ok(names
        .into_iter()
        .filter(|(queue, _)| {
            let port = queue.split(separator).next().unwrap_or_default();
            if ports.is_empty() {
                port.starts_with("Ethernet")
            } else {
                ports.iter().any(|p| p == port)
            }
        })
        .collect())
}

async fn stats_for(facade: &dyn DbFacade, table: &str, oid: &str) -> ShowResult<Fields> {
    db::hash(
        facade,
        TableSelector::table(Database::CountersDb, table).with_key(oid),
    )
    .await
}

pub async fn get_queue_counters(
    ctx: Arc<ShowContext>,
    args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let mode = NamingMode::from_options(&options)?;
    let ports = resolve_interfaces(&ctx, &requested_interfaces(&args, &options), mode).await?;
    let only_nonzero = options.bool(OPTION_NONZERO).unwrap_or(false);
    let only_trim = options.bool(OPTION_TRIM).unwrap_or(false);

    let facade = ctx.db.as_ref();
    let separator = ctx.caches.counters_separator(facade).await;
    let queues = selected_queues(facade, separator, &ports).await?;

    let mut out: BTreeMap<String, QueueRow> = BTreeMap::new();
    for (queue, oid) in queues {
        if queue.ends_with(PERIODIC_SUFFIX) {
            continue;
        }
        let counters = stats_for(facade, COUNTERS_TABLE, &oid).await?;
        out.insert(queue, queue_counter_row(&counters, only_trim, only_nonzero));
    }

    debug!(queues = out.len(), "Assembled queue counters");
    to_json(&out)
}

/// Which queues a watermark request covers.
fn requested_queue_type(options: &OptionMap) -> CommandResult<Option<QueueType>> {
    match options.string(OPTION_QUEUE_TYPE).unwrap_or("") {
        "all" => Ok(None),
        "unicast" => Ok(Some(QueueType::Unicast)),
        "multicast" => Ok(Some(QueueType::Multicast)),
        other => Err(CommandError::invalid_argument(format!(
            "Invalid queue-type option '{}'. Valid values are 'all', 'unicast', and 'multicast'",
            other
        ))),
    }
}

pub async fn get_queue_user_watermarks(
    ctx: Arc<ShowContext>,
    _args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let wanted = requested_queue_type(&options)?;
    let mode = NamingMode::from_options(&options)?;
    let requested = options.strings(OPTION_INTERFACES).unwrap_or_default();
    let ports = resolve_interfaces(&ctx, requested, mode).await?;

    let facade = ctx.db.as_ref();
    let queue_types = ctx.caches.queue_types(facade).await?;
    let separator = ctx.caches.counters_separator(facade).await;
    let queues = selected_queues(facade, separator, &ports).await?;

    let mut out: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (queue, oid) in queues {
        let Some((port, index)) = queue.split_once(separator) else {
            continue;
        };
        let port_entry = out.entry(port.to_string()).or_default();
        let Some(queue_type) = queue_types.get(&queue) else {
            warn!(queue = %queue, "Queue not found in queue-type map");
            continue;
        };
        if wanted.is_some_and(|w| w != *queue_type) {
            continue;
        }
        let watermarks = stats_for(facade, USER_WATERMARKS_TABLE, &oid).await?;
        port_entry.insert(
            format!("{}{}", queue_type.as_str(), index),
            field_or_missing(&watermarks, SHARED_WATERMARK_BYTES),
        );
    }

    debug!(ports = out.len(), "Assembled queue user watermarks");
    to_json(&out)
}
