//! Typed command options.
//!
//! Options arrive as raw strings on path elements. They are parsed exactly
//! once, against the kind the command declared, into an [`OptionValue`].
//! Handlers read them back through [`OptionMap`], whose accessors return
//! `None` for options that were not supplied so that "absent" never reads as
//! an empty string or zero.

use crate::error::{CommandError, CommandResult};
use std::collections::BTreeMap;

/// Separator for string-list options (`interfaces=Ethernet0,Ethernet4`).
pub const LIST_DELIMITER: char = ',';

/// The value type an option is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    String,
    Int,
    Bool,
    StringList,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::String => "string",
            OptionKind::Int => "int",
            OptionKind::Bool => "bool",
            OptionKind::StringList => "string-list",
        }
    }
}

/// Whether an option must, may, or must not be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    Optional,
    Required,
    /// Declared so it is recognized, but rejected whenever it is supplied.
    Unimplemented,
}

/// Declaration of one option accepted by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: String,
    pub kind: OptionKind,
    pub presence: Presence,
    pub default: Option<String>,
    pub description: String,
}

impl OptionSpec {
    /// Creates an optional option of the given kind.
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            presence: Presence::Optional,
            default: None,
            description: String::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Int)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Bool)
    }

    pub fn string_list(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::StringList)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Value inserted into the option map when the caller omits the option.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn unimplemented(mut self) -> Self {
        self.presence = Presence::Unimplemented;
        self
    }

    /// Parses a raw value against this option's declared kind.
    pub fn parse(&self, raw: &str) -> CommandResult<OptionValue> {
        OptionValue::parse(self.kind, raw).ok_or_else(|| {
            CommandError::invalid_argument(format!(
                "option '{}' expects a {} value, got '{}'",
                self.name,
                self.kind.as_str(),
                raw
            ))
        })
    }
}

/// A parsed option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    String(String),
    Int(i64),
    Bool(bool),
    StringList(Vec<String>),
}

impl OptionValue {
    /// Parses `raw` as `kind`. Returns `None` when the text does not fit the kind.
    pub fn parse(kind: OptionKind, raw: &str) -> Option<Self> {
        match kind {
            OptionKind::String => Some(OptionValue::String(raw.to_string())),
            OptionKind::Int => raw.trim().parse::<i64>().ok().map(OptionValue::Int),
            OptionKind::Bool => parse_bool(raw).map(OptionValue::Bool),
            OptionKind::StringList => Some(OptionValue::StringList(
                raw.split(LIST_DELIMITER)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            )),
        }
    }

    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::String(_) => OptionKind::String,
            OptionValue::Int(_) => OptionKind::Int,
            OptionValue::Bool(_) => OptionKind::Bool,
            OptionValue::StringList(_) => OptionKind::StringList,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            OptionValue::StringList(v) => Some(v),
            _ => None,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Options supplied to one command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    values: BTreeMap<String, OptionValue>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
        self.values.insert(name.into(), value);
    }

    /// Builder form of [`OptionMap::insert`].
    pub fn with(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(OptionValue::as_int)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(OptionValue::as_bool)
    }

    pub fn strings(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(OptionValue::as_strings)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.values.iter()
    }
}

impl FromIterator<(String, OptionValue)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
