//! Integration tests for the show command tree
//!
//! Covers:
//! - Help nodes answering with their subcommand hints
//! - Option validation shared by every registered command
//! - Interface alias, naming mode, errors, description and flap
//! - Queue counters and user watermarks

mod common;

use common::{context, json, port_fixture, query, FakeHost};
use pretty_assertions::assert_eq;
use serde_json::json;
use sonic_cli_dispatch::ErrorKind;
use sonic_show_client::{Database, MemoryFacade, ShowContext};
use std::sync::Arc;

/// One valid invocation of every registered command.
const COMMANDS: [&str; 12] = [
    "SHOW/arp",
    "SHOW/ndp",
    "SHOW/mac",
    "SHOW/interfaces/counters",
    "SHOW/interfaces/counters/rif",
    "SHOW/interfaces/alias",
    "SHOW/interfaces/naming_mode",
    "SHOW/interfaces/errors/Ethernet0",
    "SHOW/interfaces/description",
    "SHOW/interfaces/flap",
    "SHOW/queue/counters",
    "SHOW/queue/watermark",
];

fn queue_fixture() -> MemoryFacade {
    port_fixture()
        .with_row(
            Database::CountersDb,
            "COUNTERS_QUEUE_NAME_MAP",
            [
                ("Ethernet0:0", "oid:0x15000000000001"),
                ("Ethernet0:1", "oid:0x15000000000002"),
                ("Ethernet4:0", "oid:0x15000000000003"),
            ],
        )
        .with_row(
            Database::CountersDb,
            "COUNTERS_QUEUE_TYPE_MAP",
            [
                ("oid:0x15000000000001", "SAI_QUEUE_TYPE_UNICAST"),
                ("oid:0x15000000000002", "SAI_QUEUE_TYPE_MULTICAST"),
            ],
        )
        .with_row(
            Database::CountersDb,
            "COUNTERS:oid:0x15000000000001",
            [
                ("SAI_QUEUE_STAT_PACKETS", "10"),
                ("SAI_QUEUE_STAT_BYTES", "1000"),
                ("SAI_QUEUE_STAT_DROPPED_PACKETS", "0"),
            ],
        )
        .with_row(
            Database::CountersDb,
            "USER_WATERMARKS:oid:0x15000000000001",
            [("SAI_QUEUE_STAT_SHARED_WATERMARK_BYTES", "256")],
        )
}

fn ctx_with(db: MemoryFacade) -> Arc<ShowContext> {
    context(Arc::new(db), Arc::new(FakeHost::new("")))
}

#[tokio::test]
async fn test_interfaces_help_node() {
    let out = json(&query(ctx_with(port_fixture()), "SHOW/interfaces").await.unwrap());

    let names: Vec<&String> = out["subcommands"].as_object().unwrap().keys().collect();
    assert_eq!(
        names,
        vec!["alias", "counters", "description", "errors", "flap", "naming_mode"]
    );
    assert_eq!(
        out["subcommands"]["errors"],
        "show/interfaces/errors: Show Interface Errors <interfacename>"
    );
}

#[tokio::test]
async fn test_queue_help_node() {
    let out = json(&query(ctx_with(port_fixture()), "SHOW/queue").await.unwrap());
    assert_eq!(
        out,
        json!({
            "subcommands": {
                "counters": "show/queue/counters: Show queue counters",
                "watermark": "show/queue/watermark: Show user WM for queues"
            }
        })
    );
}

#[tokio::test]
async fn test_unrecognized_option_rejected_everywhere() {
    let host = Arc::new(FakeHost::new(""));
    let ctx = context(Arc::new(port_fixture()), host.clone());

    for path in COMMANDS {
        let path = format!("{}[no-such-option=1]", path);
        let err = query(ctx.clone(), &path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{}", path);
    }
    assert!(host.commands().is_empty());
}

#[tokio::test]
async fn test_option_validation() {
    let ctx = ctx_with(queue_fixture());

    for path in [
        // Declared but not implemented
        "SHOW/interfaces/counters[namespace=asic0]",
        "SHOW/interfaces/description[display=all]",
        // Required
        "SHOW/queue/watermark",
        "SHOW/queue/watermark[queue-type=lossless]",
        "SHOW/interfaces/naming_mode[SONIC_CLI_IFACE_MODE=vendor]",
        // Arity
        "SHOW/interfaces/errors",
        "SHOW/mac/100",
    ] {
        let err = query(ctx.clone(), path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{}", path);
    }

    let err = query(ctx, "SHOW/bgp").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_interface_alias() {
    let ctx = ctx_with(port_fixture());

    let out = json(&query(ctx.clone(), "SHOW/interfaces/alias").await.unwrap());
    assert_eq!(
        out,
        json!({
            "Ethernet0": {"alias": "etp1"},
            "Ethernet4": {"alias": "etp2"}
        })
    );

    let out = json(
        &query(ctx.clone(), "SHOW/interfaces/alias/etp2[SONIC_CLI_IFACE_MODE=alias]")
            .await
            .unwrap(),
    );
    assert_eq!(out, json!({"Ethernet4": {"alias": "etp2"}}));

    let err = query(ctx, "SHOW/interfaces/alias/Ethernet8").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_naming_mode() {
    let ctx = ctx_with(port_fixture());

    let out = json(&query(ctx.clone(), "SHOW/interfaces/naming_mode").await.unwrap());
    assert_eq!(out, json!({"naming_mode": "default"}));

    let out = json(
        &query(ctx, "SHOW/interfaces/naming_mode[SONIC_CLI_IFACE_MODE=alias]")
            .await
            .unwrap(),
    );
    assert_eq!(out, json!({"naming_mode": "alias"}));
}

#[tokio::test]
async fn test_interface_errors() {
    let db = port_fixture().with_row(
        Database::StateDb,
        "PORT_OPERR_TABLE|Ethernet0",
        [
            ("mac_local_fault_count", "2"),
            ("mac_local_fault_time", "2025-01-06 10:00:00"),
        ],
    );
    let ctx = ctx_with(db);

    let out = json(&query(ctx.clone(), "SHOW/interfaces/errors/Ethernet0").await.unwrap());
    let rows = out.as_array().unwrap();
    assert_eq!(rows.len(), 14);
    assert_eq!(
        rows[1],
        json!({
            "Port Errors": "mac local fault",
            "Count": "2",
            "Last timestamp(UTC)": "2025-01-06 10:00:00"
        })
    );
    assert_eq!(
        rows[0],
        json!({
            "Port Errors": "oper error status",
            "Count": "0",
            "Last timestamp(UTC)": "Never"
        })
    );

    // No recorded errors is not an error
    let out = json(&query(ctx, "SHOW/interfaces/errors/Ethernet4").await.unwrap());
    assert!(out
        .as_array()
        .unwrap()
        .iter()
        .all(|row| row["Count"] == "0" && row["Last timestamp(UTC)"] == "Never"));
}

#[tokio::test]
async fn test_interface_description() {
    let ctx = ctx_with(port_fixture());

    let out = json(&query(ctx.clone(), "SHOW/interfaces/description").await.unwrap());
    assert_eq!(
        out,
        json!({
            "Ethernet0": {"Oper": "up", "Admin": "up", "Alias": "etp1", "Description": "uplink"},
            "Ethernet4": {"Oper": "down", "Admin": "up", "Alias": "etp2", "Description": ""}
        })
    );

    let out = json(&query(ctx, "SHOW/interfaces/description/Ethernet4").await.unwrap());
    assert_eq!(out.as_object().unwrap().len(), 1);
    assert_eq!(out["Ethernet4"]["Oper"], "down");
}

#[tokio::test]
async fn test_interface_flap() {
    let ctx = ctx_with(port_fixture());

    let out = json(&query(ctx.clone(), "SHOW/interfaces/flap").await.unwrap());
    assert_eq!(
        out,
        json!([
            {
                "Interface": "Ethernet0",
                "Flap Count": "3",
                "Admin": "Up",
                "Oper": "Up",
                "Link Down TimeStamp(UTC)": "Mon Jan 06 10:00:00 2025",
                "Link Up TimeStamp(UTC)": "Mon Jan 06 10:00:05 2025"
            },
            {
                "Interface": "Ethernet4",
                "Flap Count": "Never",
                "Admin": "Up",
                "Oper": "Down",
                "Link Down TimeStamp(UTC)": "Never",
                "Link Up TimeStamp(UTC)": "Never"
            }
        ])
    );

    let err = query(ctx, "SHOW/interfaces/flap/Ethernet8").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_queue_counters() {
    let ctx = ctx_with(queue_fixture());

    let out = json(&query(ctx.clone(), "SHOW/queue/counters/Ethernet0[nonzero=true]").await.unwrap());
    assert_eq!(
        out,
        json!({
            "Ethernet0:0": {"Counter/pkts": "10", "Counter/bytes": "1000"},
            "Ethernet0:1": {}
        })
    );

    let out = json(&query(ctx.clone(), "SHOW/queue/counters").await.unwrap());
    assert_eq!(out.as_object().unwrap().len(), 3);
    assert_eq!(out["Ethernet0:0"]["Drop/pkts"], "0");
    assert_eq!(out["Ethernet0:0"]["Drop/bytes"], "N/A");

    let out = json(&query(ctx, "SHOW/queue/counters[interfaces=Ethernet4][trim=true]").await.unwrap());
    assert_eq!(
        out,
        json!({
            "Ethernet4:0": {"Trim/pkts": "N/A", "TrimSent/pkts": "N/A", "TrimDrop/pkts": "N/A"}
        })
    );
}

#[tokio::test]
async fn test_queue_watermarks() {
    let ctx = ctx_with(queue_fixture());

    let out = json(&query(ctx.clone(), "SHOW/queue/watermark[queue-type=all]").await.unwrap());
    assert_eq!(
        out,
        json!({
            "Ethernet0": {"UC0": "256", "MC1": "N/A"},
            "Ethernet4": {}
        })
    );

    let out = json(
        &query(ctx, "SHOW/queue/watermark[queue-type=unicast][interfaces=Ethernet0]")
            .await
            .unwrap(),
    );
    assert_eq!(out, json!({"Ethernet0": {"UC0": "256"}}));
}
