//! Shared fixtures for the show-client integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sonic_cli_dispatch::{CommandResult, Path};
use sonic_show_client::{
    build_dispatcher, Database, HostCommand, MemoryFacade, ShowContext, ShowResult,
};
use std::sync::Arc;

pub const ETHERNET0_OID: &str = "oid:0x1000000000002";
pub const ETHERNET4_OID: &str = "oid:0x1000000000003";
pub const ETH0_OID: &str = "oid:0x1000000000010";

/// Host runner answering every command with the same text and remembering
/// what it was asked to run.
#[derive(Debug, Default)]
pub struct FakeHost {
    output: String,
    commands: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl HostCommand for FakeHost {
    async fn run(&self, command: &str) -> ShowResult<String> {
        self.commands.lock().push(command.to_string());
        Ok(self.output.clone())
    }
}

/// Two front panel ports and the management port, with port configuration,
/// operational state and counters.
pub fn port_fixture() -> MemoryFacade {
    MemoryFacade::new()
        .with_row(Database::ConfigDb, "PORT|Ethernet0", [("alias", "etp1")])
        .with_row(Database::ConfigDb, "PORT|Ethernet4", [("alias", "etp2")])
        .with_row(
            Database::ApplDb,
            "PORT_TABLE:Ethernet0",
            [
                ("admin_status", "up"),
                ("oper_status", "up"),
                ("speed", "100000"),
                ("alias", "etp1"),
                ("description", "uplink"),
                ("flap_count", "3"),
                ("last_down_time", "Mon Jan 06 10:00:00 2025"),
                ("last_up_time", "Mon Jan 06 10:00:05 2025"),
            ],
        )
        .with_row(
            Database::ApplDb,
            "PORT_TABLE:Ethernet4",
            [
                ("admin_status", "up"),
                ("oper_status", "down"),
                ("speed", "100000"),
                ("alias", "etp2"),
            ],
        )
        .with_row(
            Database::CountersDb,
            "COUNTERS_PORT_NAME_MAP",
            [
                ("Ethernet0", ETHERNET0_OID),
                ("Ethernet4", ETHERNET4_OID),
                ("eth0", ETH0_OID),
            ],
        )
        .with_row(
            Database::CountersDb,
            format!("COUNTERS:{}", ETHERNET0_OID),
            [
                ("SAI_PORT_STAT_IF_IN_UCAST_PKTS", "100"),
                ("SAI_PORT_STAT_IF_IN_NON_UCAST_PKTS", "20"),
                ("SAI_PORT_STAT_IF_IN_ERRORS", "1"),
                ("SAI_PORT_STAT_IF_IN_DISCARDS", "2"),
                ("SAI_PORT_STAT_ETHER_RX_OVERSIZE_PKTS", "0"),
                ("SAI_PORT_STAT_IF_OUT_UCAST_PKTS", "50"),
                ("SAI_PORT_STAT_IF_OUT_NON_UCAST_PKTS", "5"),
                ("SAI_PORT_STAT_IF_OUT_ERRORS", "0"),
                ("SAI_PORT_STAT_IF_OUT_DISCARDS", "0"),
                ("SAI_PORT_STAT_ETHER_TX_OVERSIZE_PKTS", "0"),
            ],
        )
        .with_row(
            Database::CountersDb,
            format!("RATES:{}", ETHERNET0_OID),
            [("RX_BPS", "12500000"), ("TX_BPS", "500")],
        )
        .with_row(
            Database::CountersDb,
            format!("COUNTERS:{}", ETHERNET4_OID),
            [
                ("SAI_PORT_STAT_IF_IN_UCAST_PKTS", "7"),
                ("SAI_PORT_STAT_IF_IN_NON_UCAST_PKTS", "0"),
            ],
        )
}

/// Port fixture plus an FDB that places `AA:BB:CC:DD:EE:FF` on VLAN 100
/// behind `eth0`.
pub fn fdb_fixture() -> MemoryFacade {
    port_fixture()
        .with_row(
            Database::AsicDb,
            "ASIC_STATE:SAI_OBJECT_TYPE_BRIDGE_PORT:oid:0x3a000000000010",
            [("SAI_BRIDGE_PORT_ATTR_PORT_ID", ETH0_OID)],
        )
        .with_row(
            Database::AsicDb,
            "ASIC_STATE:SAI_OBJECT_TYPE_VLAN:oid:0x26000000000064",
            [("SAI_VLAN_ATTR_VLAN_ID", "100")],
        )
        .with_row(
            Database::AsicDb,
            r#"ASIC_STATE:SAI_OBJECT_TYPE_FDB_ENTRY:{"bvid":"oid:0x26000000000064","mac":"AA:BB:CC:DD:EE:FF","switch_id":"oid:0x21000000000000"}"#,
            [
                ("SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID", "oid:0x3a000000000010"),
                ("SAI_FDB_ENTRY_ATTR_TYPE", "SAI_FDB_ENTRY_TYPE_DYNAMIC"),
            ],
        )
}

pub fn context(db: Arc<MemoryFacade>, host: Arc<FakeHost>) -> Arc<ShowContext> {
    Arc::new(ShowContext::new(db, host))
}

/// Parses `path` and dispatches it through the full show dispatcher.
pub async fn query(ctx: Arc<ShowContext>, path: &str) -> CommandResult<Vec<u8>> {
    let dispatcher = build_dispatcher().expect("registry builds");
    let path = Path::parse(path)?;
    dispatcher.dispatch(ctx, &path).await
}

pub fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("handler returns JSON")
}
