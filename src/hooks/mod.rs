//! Request interception hooks.
//!
//! # Data Flow
//! ```text
//! MutableRequest (fresh snapshot)
//!     → HookChain::run
//!         → hook 1 (e.g. script binding)
//!         → hook 2 (e.g. rewrite.rs rules)
//!         → ...
//!     → MutableRequest (edited or untouched)
//! ```
//!
//! # Design Decisions
//! - Hooks see the request as plain mutable data and return nothing;
//!   the server asks the request itself whether it changed
//! - Hooks run in registration order on the same request
//! - A scripting engine plugs in by implementing `RequestHook`

pub mod rewrite;

use async_trait::async_trait;
use std::sync::Arc;

use crate::http::MutableRequest;

pub use rewrite::RewriteHook;

/// Something that inspects and edits requests in flight.
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Inspect or edit the request.
    async fn on_request(&self, request: &mut MutableRequest);
}

/// Ordered list of hooks shared across requests.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn RequestHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook after the existing ones.
    pub fn push(&mut self, hook: impl RequestHook + 'static) {
        self.hooks.push(Arc::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook on `request`, in order.
    pub async fn run(&self, request: &mut MutableRequest) {
        for hook in &self.hooks {
            hook.on_request(request).await;
            tracing::trace!(hook = hook.name(), modified = request.was_modified(), "Hook ran");
        }
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|hook| hook.name()))
            .finish()
    }
}
