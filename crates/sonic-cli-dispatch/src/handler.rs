//! Command handler seam.
//!
//! Handlers are plain `async fn`s taking the request context, positional
//! arguments and options:
//!
//! ```ignore
//! async fn get_uptime(ctx: Arc<ShowContext>, args: CmdArgs, options: OptionMap)
//!     -> CommandResult<Vec<u8>>
//! ```
//!
//! The blanket impl below lets such functions be registered directly.

use crate::error::CommandResult;
use crate::option::OptionMap;
use crate::path::CmdArgs;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// A registered command implementation.
pub trait CommandHandler<C>: Send + Sync {
    fn call(
        &self,
        ctx: Arc<C>,
        args: CmdArgs,
        options: OptionMap,
    ) -> BoxFuture<'static, CommandResult<Vec<u8>>>;
}

impl<C, F, Fut> CommandHandler<C> for F
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, CmdArgs, OptionMap) -> Fut + Send + Sync,
    Fut: Future<Output = CommandResult<Vec<u8>>> + Send + 'static,
{
    fn call(
        &self,
        ctx: Arc<C>,
        args: CmdArgs,
        options: OptionMap,
    ) -> BoxFuture<'static, CommandResult<Vec<u8>>> {
        Box::pin(self(ctx, args, options))
    }
}
