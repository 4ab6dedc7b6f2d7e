//! `show ndp`: the kernel IPv6 neighbor table.

use super::OPTION_IFACE;
use crate::context::ShowContext;
use crate::host::{shellquote, IP_CMD};
use crate::resolve::{fetch_fdb, merge_neighbors_with_fdb, NeighborRecord};
use crate::response::{to_json, NeighborResponse};
use sonic_cli_dispatch::{CmdArgs, CommandError, CommandResult, OptionMap};
use std::net::Ipv6Addr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parses `ip -6 neigh show` output.
///
/// Lines without `lladdr` (FAILED, INCOMPLETE) are skipped. The kernel omits
/// `dev <iface>` when the query was already filtered by device, in which case
/// `iface` fills in.
pub fn parse_ndp_output(output: &str, iface: &str) -> Vec<NeighborRecord> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if !fields.contains(&"lladdr") {
                return None;
            }
            let after = |tag: &str| {
                fields
                    .iter()
                    .position(|f| *f == tag)
                    .and_then(|i| fields.get(i + 1))
                    .copied()
            };
            let dev = after("dev").unwrap_or(iface);
            Some(NeighborRecord {
                address: fields[0].to_string(),
                mac: after("lladdr").unwrap_or_default().to_uppercase(),
                iface: dev.to_string(),
                status: fields.last().map(|s| s.to_string()),
            })
        })
        .collect()
}

fn ndp_command(args: &CmdArgs, iface: &str) -> CommandResult<String> {
    let mut cmd = format!("{} -6 neigh show", IP_CMD);

    let ip = args.at(0);
    if !ip.is_empty() {
        let addr = ip
            .parse::<Ipv6Addr>()
            .ok()
            .filter(|a| a.to_ipv4_mapped().is_none())
            .ok_or_else(|| {
                CommandError::invalid_argument(format!("invalid IPv6 address: {}", ip))
            })?;
        cmd.push_str(&format!(" {}", addr));
    }
    if !iface.is_empty() {
        cmd.push_str(&format!(" dev {}", shellquote(iface)));
    }
    Ok(cmd)
}

pub async fn get_ndp(
    ctx: Arc<ShowContext>,
    args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let iface = options.string(OPTION_IFACE).unwrap_or("");
    let cmd = ndp_command(&args, iface)?;

    let output = ctx.host.run(&cmd).await?;
    if output.trim().is_empty() {
        return to_json(&NeighborResponse::default());
    }

    let records = parse_ndp_output(&output, iface);
    let fdb = fetch_fdb(ctx.db.as_ref()).await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to fetch FDB data");
        Vec::new()
    });
    let entries = merge_neighbors_with_fdb(records, &fdb);
    debug!(entries = entries.len(), "Assembled NDP table");

    to_json(&NeighborResponse::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryFacade;
    use crate::host::MockHostCommand;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use sonic_cli_dispatch::{ErrorKind, OptionValue};

    const NDP_OUTPUT: &str = "\
fc00::2 dev Ethernet0 lladdr 6e:1f:37:5f:bf:26 router REACHABLE
fe80::7a5f:6cff:fe30:d7dc dev Vlan1000 lladdr 78:5f:6c:30:d7:dc router STALE
fc00::99 dev Ethernet8 FAILED
";

    #[test]
    fn test_parse_ndp_output() {
        let records = parse_ndp_output(NDP_OUTPUT, "");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mac, "6E:1F:37:5F:BF:26");
        assert_eq!(records[0].status.as_deref(), Some("REACHABLE"));
        assert_eq!(records[1].iface, "Vlan1000");
    }

    #[test]
    fn test_parse_without_dev_uses_requested_iface() {
        let records = parse_ndp_output("fc00::2 lladdr 6e:1f:37:5f:bf:26 REACHABLE", "Ethernet0");
        assert_eq!(records[0].iface, "Ethernet0");
    }

    #[test]
    fn test_command_line() {
        let args: CmdArgs = ["fc00::2"].into_iter().collect();
        assert_eq!(
            ndp_command(&args, "Ethernet0").unwrap(),
            "/bin/ip -6 neigh show fc00::2 dev \"Ethernet0\""
        );
        assert_eq!(
            ndp_command(&CmdArgs::default(), "").unwrap(),
            "/bin/ip -6 neigh show"
        );
        let args: CmdArgs = ["10.0.0.1"].into_iter().collect();
        assert_eq!(
            ndp_command(&args, "").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        let args: CmdArgs = ["::ffff:10.0.0.1"].into_iter().collect();
        assert!(ndp_command(&args, "").is_err());
    }

    #[tokio::test]
    async fn test_get_ndp() {
        let mut host = MockHostCommand::new();
        host.expect_run()
            .withf(|cmd| cmd.to_string() == "/bin/ip -6 neigh show dev \"Ethernet0\"")
            .times(1)
            .returning(|_| Ok("fc00::2 lladdr 6e:1f:37:5f:bf:26 router REACHABLE\n".to_string()));
        let ctx = Arc::new(ShowContext::new(Arc::new(MemoryFacade::new()), Arc::new(host)));
        let options = OptionMap::new().with(OPTION_IFACE, OptionValue::String("Ethernet0".into()));

        let body = get_ndp(ctx, CmdArgs::default(), options).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "entries": [{
                    "address": "fc00::2",
                    "mac_address": "6E:1F:37:5F:BF:26",
                    "iface": "Ethernet0",
                    "vlan": "-",
                    "status": "REACHABLE"
                }],
                "total_entries": 1
            })
        );
    }
}
