//! Request dispatcher.
//!
//! Turns a query path into a handler invocation: resolve against the
//! registry, split the routing prefix from positional arguments, validate
//! arity and options, then run the handler and hand back its bytes untouched.

use crate::error::{CommandError, CommandResult};
use crate::option::{OptionMap, OptionSpec, Presence};
use crate::path::{CmdArgs, Path};
use crate::registry::{CommandDescriptor, HintNode, Registry, Resolution};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Serialize)]
struct HintsResponse<'a> {
    subcommands: &'a BTreeMap<String, String>,
}

/// Routes queries to registered handlers.
pub struct Dispatcher<C> {
    registry: Registry<C>,
    global_options: BTreeMap<String, OptionSpec>,
}

impl<C> Dispatcher<C>
where
    C: Send + Sync + 'static,
{
    pub fn new(registry: Registry<C>) -> Self {
        Self {
            registry,
            global_options: BTreeMap::new(),
        }
    }

    /// Declares an option that every command accepts.
    pub fn with_global_option(mut self, spec: OptionSpec) -> Self {
        self.global_options.insert(spec.name.clone(), spec);
        self
    }

    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    pub fn global_options(&self) -> impl Iterator<Item = &OptionSpec> {
        self.global_options.values()
    }

    /// Resolves, validates and runs one query.
    #[instrument(skip(self, ctx, path), fields(path = %path))]
    pub async fn dispatch(&self, ctx: Arc<C>, path: &Path) -> CommandResult<Vec<u8>> {
        let (descriptor, consumed) = match self.registry.resolve(path)? {
            Resolution::Hints(hints) => {
                debug!(count = hints.subcommands.len(), "Returning subcommand hints");
                return render_hints(&hints);
            }
            Resolution::Command {
                descriptor,
                consumed,
            } => (descriptor, consumed),
        };

        let args: CmdArgs = path.elems[consumed..]
            .iter()
            .map(|e| e.name.clone())
            .collect();

        if !descriptor.accepts_arg_count(args.len()) {
            return Err(CommandError::invalid_argument(format!(
                "'{}' expects {} argument(s), got {}",
                descriptor.path().join("/"),
                describe_bounds(descriptor.min_args, descriptor.max_args),
                args.len()
            )));
        }

        let options = self.build_options(&descriptor, path)?;
        debug!(
            command = %descriptor.path().join("/"),
            args = args.len(),
            options = options.len(),
            "Invoking handler"
        );

        let result = descriptor.handler().call(ctx, args, options).await;
        if let Err(e) = &result {
            warn!(kind = %e.kind, error = %e.message, "Command failed");
        }
        result
    }

    /// Merges element keys left to right, first write wins, then validates
    /// them against the command's and the global declarations.
    fn build_options(
        &self,
        descriptor: &CommandDescriptor<C>,
        path: &Path,
    ) -> CommandResult<OptionMap> {
        let mut raw: BTreeMap<&str, &str> = BTreeMap::new();
        for elem in &path.elems {
            for (k, v) in &elem.keys {
                raw.entry(k.as_str()).or_insert(v.as_str());
            }
        }

        let mut options = OptionMap::new();
        for (name, value) in raw {
            let spec = self.lookup(descriptor, name).ok_or_else(|| {
                CommandError::invalid_argument(format!("unrecognized option '{}'", name))
            })?;
            if spec.presence == Presence::Unimplemented {
                return Err(CommandError::invalid_argument(format!(
                    "option '{}' is not implemented",
                    name
                )));
            }
            options.insert(name, spec.parse(value)?);
        }

        for spec in descriptor.options.values().chain(self.global_options.values()) {
            if options.contains(&spec.name) {
                continue;
            }
            if spec.presence == Presence::Required {
                return Err(CommandError::invalid_argument(format!(
                    "missing required option '{}'",
                    spec.name
                )));
            }
            if let Some(default) = &spec.default {
                options.insert(spec.name.clone(), spec.parse(default)?);
            }
        }

        Ok(options)
    }

    fn lookup<'a>(&'a self, descriptor: &'a CommandDescriptor<C>, name: &str) -> Option<&'a OptionSpec> {
        descriptor
            .options
            .get(name)
            .or_else(|| self.global_options.get(name))
    }
}

fn render_hints(hints: &HintNode) -> CommandResult<Vec<u8>> {
    Ok(serde_json::to_vec(&HintsResponse {
        subcommands: &hints.subcommands,
    })?)
}

fn describe_bounds(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{}..{}", min, max),
        None => format!("at least {}", min),
    }
}
