//! Interface naming: SONiC names, vendor aliases and natural ordering.

use crate::db::{self, Database, DbFacade, TableSelector};
use crate::error::ShowResult;
use once_cell::sync::Lazy;
use regex::Regex;
use sonic_cli_dispatch::{CommandError, CommandResult, OptionMap};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Global option selecting how interface names are shown and accepted.
pub const SONIC_CLI_IFACE_MODE: &str = "SONIC_CLI_IFACE_MODE";

/// CONFIG_DB table holding port configuration, including aliases.
pub const CFG_PORT_TABLE_NAME: &str = "PORT";

const VLAN_SUB_INTERFACE_SEPARATOR: char = '.';

static ETHERNET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Ethernet\d+$").expect("Invalid regex pattern"));
static PORTCHANNEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PortChannel\d+$").expect("Invalid regex pattern"));
static VLAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Vlan(\d+)$").expect("Invalid regex pattern"));
static MGMT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^eth\d+$").expect("Invalid regex pattern"));

/// True for the interface names the resolution chains accept.
pub fn is_valid_if_name(name: &str) -> bool {
    ETHERNET_RE.is_match(name)
        || PORTCHANNEL_RE.is_match(name)
        || VLAN_RE.is_match(name)
        || MGMT_RE.is_match(name)
}

/// VLAN number of a `VlanN` interface.
pub fn vlan_id(name: &str) -> Option<&str> {
    VLAN_RE
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// How interface names are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingMode {
    #[default]
    Default,
    Alias,
}

impl NamingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingMode::Default => "default",
            NamingMode::Alias => "alias",
        }
    }

    /// Reads the naming mode from the request options. Absent or empty means
    /// default.
    pub fn from_options(options: &OptionMap) -> CommandResult<Self> {
        match options.string(SONIC_CLI_IFACE_MODE).unwrap_or("") {
            "" | "default" => Ok(NamingMode::Default),
            "alias" => Ok(NamingMode::Alias),
            other => Err(CommandError::invalid_argument(format!(
                "invalid {} '{}', expected 'default' or 'alias'",
                SONIC_CLI_IFACE_MODE, other
            ))),
        }
    }
}

impl fmt::Display for NamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bidirectional port name ↔ alias map built from CONFIG_DB `PORT`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    name_to_alias: BTreeMap<String, String>,
    alias_to_name: BTreeMap<String, String>,
}

impl AliasMap {
    pub async fn load(facade: &dyn DbFacade) -> ShowResult<Self> {
        let ports = db::rows(
            facade,
            TableSelector::table(Database::ConfigDb, CFG_PORT_TABLE_NAME),
        )
        .await?;
        Ok(Self::from_pairs(ports.into_iter().map(|(name, fields)| {
            let alias = fields.get("alias").cloned().unwrap_or_else(|| name.clone());
            (name, alias)
        })))
    }

    pub fn from_pairs<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut map = Self::default();
        for (name, alias) in pairs {
            map.alias_to_name.insert(alias.clone(), name.clone());
            map.name_to_alias.insert(name, alias);
        }
        map
    }

    pub fn alias_of(&self, name: &str) -> Option<&str> {
        self.name_to_alias.get(name).map(String::as_str)
    }

    pub fn name_of(&self, alias: &str) -> Option<&str> {
        self.alias_to_name.get(alias).map(String::as_str)
    }

    /// Name as shown to the caller. Sub-interface suffixes (`.100`) survive.
    pub fn to_display(&self, name: &str, mode: NamingMode) -> String {
        if mode != NamingMode::Alias || name.is_empty() {
            return name.to_string();
        }
        let (base, suffix) = match name.find(VLAN_SUB_INTERFACE_SEPARATOR) {
            Some(i) => name.split_at(i),
            None => (name, ""),
        };
        match self.alias_of(base) {
            Some(alias) => format!("{}{}", alias, suffix),
            None => name.to_string(),
        }
    }

    /// Name supplied by the caller converted to a SONiC name.
    pub fn resolve_input(&self, input: &str, mode: NamingMode) -> CommandResult<String> {
        if mode != NamingMode::Alias {
            return Ok(input.to_string());
        }
        match self.name_of(input) {
            Some(name) if !name.is_empty() && name != input => Ok(name.to_string()),
            _ => Err(CommandError::not_found(format!(
                "Cannot find interface name for alias {}",
                input
            ))),
        }
    }
}

/// Compares strings treating runs of digits as numbers (`Ethernet4` <
/// `Ethernet12`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a;
    let mut b = b;
    loop {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        let (ca, ra) = split_chunk(a);
        let (cb, rb) = split_chunk(b);
        let a_digits = ca.starts_with(|c: char| c.is_ascii_digit());
        let b_digits = cb.starts_with(|c: char| c.is_ascii_digit());

        let ord = match (a_digits, b_digits) {
            (true, true) => {
                let ta = ca.trim_start_matches('0');
                let tb = cb.trim_start_matches('0');
                ta.len()
                    .cmp(&tb.len())
                    .then_with(|| ta.cmp(tb))
                    .then_with(|| ca.len().cmp(&cb.len()))
            }
            _ => ca.cmp(cb),
        };
        if ord != Ordering::Equal {
            return ord;
        }
        a = ra;
        b = rb;
    }
}

/// Splits off the leading run of digits or non-digits.
fn split_chunk(s: &str) -> (&str, &str) {
    let digits = s.starts_with(|c: char| c.is_ascii_digit());
    let end = s
        .find(|c: char| c.is_ascii_digit() != digits)
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Sorts interface names in natural order.
pub fn natsort<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}
