//! Response assembly.
//!
//! Field names in these structures are part of the wire contract. Mapping
//! order is not.

use crate::resolve::NeighborEntry;
use serde::Serialize;
use sonic_cli_dispatch::{CommandError, CommandResult};

/// Serializes a response body. Failure is a logic defect.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> CommandResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| CommandError::internal(format!("failed to serialize response: {}", e)))
}

/// Body of the ARP and NDP commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NeighborResponse {
    pub entries: Vec<NeighborEntry>,
    pub total_entries: usize,
}

impl NeighborResponse {
    pub fn new(entries: Vec<NeighborEntry>) -> Self {
        Self {
            total_entries: entries.len(),
            entries,
        }
    }
}

/// Body of `show mac` with `count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountResponse {
    pub total_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_empty_neighbor_response() {
        let body = to_json(&NeighborResponse::default()).unwrap();
        assert_eq!(body, br#"{"entries":[],"total_entries":0}"#.to_vec());
    }

    #[test]
    fn test_neighbor_response_shape() {
        let response = NeighborResponse::new(vec![NeighborEntry {
            address: "10.0.0.1".to_string(),
            mac_address: "AA:BB:CC:DD:EE:FF".to_string(),
            iface: "eth0".to_string(),
            vlan: "100".to_string(),
            status: None,
        }]);
        let value: Value = serde_json::from_slice(&to_json(&response).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"entries":[{"address":"10.0.0.1","mac_address":"AA:BB:CC:DD:EE:FF","iface":"eth0","vlan":"100"}],"total_entries":1})
        );
    }
}
