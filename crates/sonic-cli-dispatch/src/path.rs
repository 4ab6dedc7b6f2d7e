//! Query paths and positional arguments.
//!
//! A query is an ordered list of [`PathElem`]s. Element names route the query
//! through the registry; element keys carry option values. The text form
//! follows gNMI path strings:
//!
//! ```text
//! SHOW/interfaces/counters[interfaces=Ethernet0,Ethernet4][period=5]
//! ```

use crate::error::{CommandError, CommandResult};
use std::collections::BTreeMap;
use std::fmt;

/// One element of a query path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathElem {
    pub name: String,
    pub keys: BTreeMap<String, String>,
}

impl PathElem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: BTreeMap::new(),
        }
    }

    /// Adds an option key to this element.
    pub fn key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.insert(key.into(), value.into());
        self
    }
}

/// An ordered query path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    pub elems: Vec<PathElem>,
}

impl Path {
    pub fn new(elems: Vec<PathElem>) -> Self {
        Self { elems }
    }

    /// Builds a path of bare element names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elems: names.into_iter().map(PathElem::new).collect(),
        }
    }

    /// Parses the gNMI-style text form.
    ///
    /// `/` separates elements outside of brackets, `[k=v]` groups attach keys
    /// to the preceding element, and `\` escapes the next character.
    pub fn parse(text: &str) -> CommandResult<Self> {
        let mut elems = Vec::new();
        let mut name = String::new();
        let mut keys = BTreeMap::new();
        let mut chars = text.trim().trim_start_matches('/').chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        name.push(next);
                    }
                }
                '/' => {
                    push_elem(&mut elems, &mut name, &mut keys, text)?;
                }
                '[' => {
                    let mut group = String::new();
                    let mut closed = false;
                    while let Some(c) = chars.next() {
                        match c {
                            '\\' => {
                                if let Some(next) = chars.next() {
                                    group.push(next);
                                }
                            }
                            ']' => {
                                closed = true;
                                break;
                            }
                            _ => group.push(c),
                        }
                    }
                    if !closed {
                        return Err(CommandError::invalid_argument(format!(
                            "unterminated key in path '{}'",
                            text
                        )));
                    }
                    let (key, value) = group.split_once('=').ok_or_else(|| {
                        CommandError::invalid_argument(format!(
                            "malformed key '{}' in path '{}'",
                            group, text
                        ))
                    })?;
                    if key.is_empty() {
                        return Err(CommandError::invalid_argument(format!(
                            "empty key name in path '{}'",
                            text
                        )));
                    }
                    if keys.insert(key.to_string(), value.to_string()).is_some() {
                        return Err(CommandError::invalid_argument(format!(
                            "duplicate key '{}' in path '{}'",
                            key, text
                        )));
                    }
                }
                _ => name.push(c),
            }
        }
        if !name.is_empty() || !keys.is_empty() {
            push_elem(&mut elems, &mut name, &mut keys, text)?;
        }

        Ok(Self { elems })
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Element names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elems.iter().map(|e| e.name.as_str())
    }
}

fn push_elem(
    elems: &mut Vec<PathElem>,
    name: &mut String,
    keys: &mut BTreeMap<String, String>,
    text: &str,
) -> CommandResult<()> {
    if name.is_empty() {
        return Err(CommandError::invalid_argument(format!(
            "empty element in path '{}'",
            text
        )));
    }
    elems.push(PathElem {
        name: std::mem::take(name),
        keys: std::mem::take(keys),
    });
    Ok(())
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, elem) in self.elems.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&elem.name)?;
            for (k, v) in &elem.keys {
                write!(f, "[{}={}]", k, v)?;
            }
        }
        Ok(())
    }
}

/// Positional arguments left over after the routing prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdArgs(Vec<String>);

impl CmdArgs {
    pub fn new(args: Vec<String>) -> Self {
        Self(args)
    }

    /// Argument at `index`, or `""` when absent.
    pub fn at(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CmdArgs {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
