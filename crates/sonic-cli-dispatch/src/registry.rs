//! Path registry.
//!
//! A trie keyed by path element names. Each node may carry a
//! [`CommandDescriptor`] (a leaf handler with its argument bounds and option
//! declarations) or a set of subcommand hints that documents what lives below
//! it. Registration happens once at start-up; lookups afterwards are
//! read-only and may run concurrently.

use crate::error::{CommandError, CommandResult, RegistryError};
use crate::handler::CommandHandler;
use crate::option::OptionSpec;
use crate::path::Path;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A registered command.
pub struct CommandDescriptor<C> {
    path: Vec<String>,
    handler: Arc<dyn CommandHandler<C>>,
    pub description: String,
    pub min_args: usize,
    /// `None` means no upper bound.
    pub max_args: Option<usize>,
    pub options: BTreeMap<String, OptionSpec>,
    pub subcommands: BTreeMap<String, String>,
}

impl<C> CommandDescriptor<C> {
    /// Creates a descriptor taking no positional arguments and no options.
    pub fn new<H>(handler: H) -> Self
    where
        H: CommandHandler<C> + 'static,
    {
        Self {
            path: Vec::new(),
            handler: Arc::new(handler),
            description: String::new(),
            min_args: 0,
            max_args: Some(0),
            options: BTreeMap::new(),
            subcommands: BTreeMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Inclusive bounds on positional arguments.
    pub fn args(mut self, min: usize, max: usize) -> Self {
        self.min_args = min;
        self.max_args = Some(max);
        self
    }

    /// At least `min` positional arguments, no upper bound.
    pub fn unbounded_args(mut self, min: usize) -> Self {
        self.min_args = min;
        self.max_args = None;
        self
    }

    pub fn subcommand(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.subcommands.insert(name.into(), description.into());
        self
    }

    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.options.insert(spec.name.clone(), spec);
        self
    }

    pub fn options<I>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = OptionSpec>,
    {
        for spec in specs {
            self.options.insert(spec.name.clone(), spec);
        }
        self
    }

    /// The exact path this descriptor was registered under.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn handler(&self) -> &Arc<dyn CommandHandler<C>> {
        &self.handler
    }

    /// Whether `count` positional arguments satisfy the declared bounds.
    pub fn accepts_arg_count(&self, count: usize) -> bool {
        if count < self.min_args {
            return false;
        }
        match self.max_args {
            Some(max) => count <= max,
            None => true,
        }
    }
}

impl<C> fmt::Debug for CommandDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("path", &self.path.join("/"))
            .field("description", &self.description)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("options", &self.options.keys().collect::<Vec<_>>())
            .field("subcommands", &self.subcommands)
            .finish()
    }
}

/// Help attached to a node that has no handler of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintNode {
    pub description: String,
    pub subcommands: BTreeMap<String, String>,
}

/// Outcome of a registry lookup.
pub enum Resolution<C> {
    /// A handler matched; `consumed` leading elements formed the routing prefix.
    Command {
        descriptor: Arc<CommandDescriptor<C>>,
        consumed: usize,
    },
    /// The path stopped exactly at a help-only node.
    Hints(HintNode),
}

impl<C> fmt::Debug for Resolution<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Command {
                descriptor,
                consumed,
            } => f
                .debug_struct("Command")
                .field("descriptor", descriptor)
                .field("consumed", consumed)
                .finish(),
            Resolution::Hints(hints) => f.debug_tuple("Hints").field(hints).finish(),
        }
    }
}

struct Node<C> {
    children: BTreeMap<String, Node<C>>,
    command: Option<Arc<CommandDescriptor<C>>>,
    hints: Option<HintNode>,
}

impl<C> Node<C> {
    fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            command: None,
            hints: None,
        }
    }

    fn is_registered(&self) -> bool {
        self.command.is_some() || self.hints.is_some()
    }
}

/// Process-wide table of registered paths.
pub struct Registry<C> {
    root: Node<C>,
    commands: usize,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Registry<C> {
    pub fn new() -> Self {
        Self {
            root: Node::new(),
            commands: 0,
        }
    }

    /// Registers a handler at an exact path.
    pub fn register(
        &mut self,
        path: &[&str],
        mut descriptor: CommandDescriptor<C>,
    ) -> Result<(), RegistryError> {
        let key = path.join("/");
        if let Some(max) = descriptor.max_args {
            if descriptor.min_args > max {
                return Err(RegistryError::InvalidBounds {
                    path: key,
                    min: descriptor.min_args,
                    max,
                });
            }
        }
        let node = self.node_for(path)?;
        if node.is_registered() {
            return Err(RegistryError::Duplicate(key));
        }
        descriptor.path = path.iter().map(|s| s.to_string()).collect();
        node.command = Some(Arc::new(descriptor));
        self.commands += 1;
        debug!(path = %key, "Registered command");
        Ok(())
    }

    /// Registers a handler-less node that answers with its subcommand hints.
    pub fn register_hints<I, N, D>(
        &mut self,
        path: &[&str],
        description: impl Into<String>,
        hints: I,
    ) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        let key = path.join("/");
        let node = self.node_for(path)?;
        if node.is_registered() {
            return Err(RegistryError::Duplicate(key));
        }
        node.hints = Some(HintNode {
            description: description.into(),
            subcommands: hints
                .into_iter()
                .map(|(n, d)| (n.into(), d.into()))
                .collect(),
        });
        debug!(path = %key, "Registered subcommand hints");
        Ok(())
    }

    fn node_for(&mut self, path: &[&str]) -> Result<&mut Node<C>, RegistryError> {
        if path.is_empty() || path.iter().any(|s| s.is_empty()) {
            return Err(RegistryError::InvalidPath(path.join("/")));
        }
        let mut node = &mut self.root;
        for name in path {
            node = node
                .children
                .entry(name.to_string())
                .or_insert_with(Node::new);
        }
        Ok(node)
    }

    /// Resolves a query path to the longest registered prefix.
    ///
    /// Element keys are ignored; only names route.
    pub fn resolve(&self, path: &Path) -> CommandResult<Resolution<C>> {
        let mut node = &self.root;
        let mut depth = 0;
        let mut best: Option<(Arc<CommandDescriptor<C>>, usize)> = None;

        for name in path.names() {
            match node.children.get(name) {
                Some(child) => {
                    node = child;
                    depth += 1;
                    if let Some(command) = &node.command {
                        best = Some((Arc::clone(command), depth));
                    }
                }
                None => break,
            }
        }

        if depth > 0 && depth == path.len() && node.command.is_none() {
            if let Some(hints) = &node.hints {
                return Ok(Resolution::Hints(hints.clone()));
            }
        }

        match best {
            Some((descriptor, consumed)) => Ok(Resolution::Command {
                descriptor,
                consumed,
            }),
            None => Err(CommandError::not_found(format!("unknown path '{}'", path))),
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands == 0
    }

    /// All registered handlers, depth first in name order.
    pub fn commands(&self) -> Vec<Arc<CommandDescriptor<C>>> {
        let mut out = Vec::with_capacity(self.commands);
        collect(&self.root, &mut out);
        out
    }
}

fn collect<C>(node: &Node<C>, out: &mut Vec<Arc<CommandDescriptor<C>>>) {
    if let Some(command) = &node.command {
        out.push(Arc::clone(command));
    }
    for child in node.children.values() {
        collect(child, out);
    }
}
