//! Per-request context handed to every show handler.

use crate::cache::SharedCaches;
use crate::config::MAX_SHOW_COMMAND_PERIOD;
use crate::db::DbFacade;
use crate::host::HostCommand;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Collaborators and request-scoped state for one query.
///
/// The facade, host runner and caches are shared across requests; the
/// cancellation token belongs to the request.
#[derive(Clone)]
pub struct ShowContext {
    pub db: Arc<dyn DbFacade>,
    pub host: Arc<dyn HostCommand>,
    pub caches: Arc<SharedCaches>,
    pub cancel: CancellationToken,
    pub max_period: u64,
}

impl ShowContext {
    pub fn new(db: Arc<dyn DbFacade>, host: Arc<dyn HostCommand>) -> Self {
        Self {
            db,
            host,
            caches: Arc::new(SharedCaches::new()),
            cancel: CancellationToken::new(),
            max_period: MAX_SHOW_COMMAND_PERIOD,
        }
    }

    pub fn with_caches(mut self, caches: Arc<SharedCaches>) -> Self {
        self.caches = caches;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_max_period(mut self, max_period: u64) -> Self {
        self.max_period = max_period;
        self
    }

    /// A context for a new request sharing this context's collaborators.
    pub fn for_request(&self, cancel: CancellationToken) -> Arc<Self> {
        Arc::new(self.clone().with_cancel(cancel))
    }
}

impl std::fmt::Debug for ShowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowContext")
            .field("max_period", &self.max_period)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
