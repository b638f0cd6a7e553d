//! Declarative request rewriting from config.
//!
//! Each rule optionally matches a path prefix, then removes headers, sets
//! headers, and replaces the body, in that order.

use async_trait::async_trait;

use crate::config::RewriteRule;
use crate::hooks::RequestHook;
use crate::http::MutableRequest;

/// Hook applying one `RewriteRule`.
#[derive(Debug, Clone)]
pub struct RewriteHook {
    rule: RewriteRule,
}

impl RewriteHook {
    pub fn new(rule: RewriteRule) -> Self {
        Self { rule }
    }

    /// Whether the rule applies to `path`. No prefix matches everything.
    pub fn matches(&self, path: &str) -> bool {
        self.rule
            .path_prefix
            .as_deref()
            .map_or(true, |prefix| path.starts_with(prefix))
    }
}

#[async_trait]
impl RequestHook for RewriteHook {
    fn name(&self) -> &str {
        &self.rule.name
    }

    async fn on_request(&self, request: &mut MutableRequest) {
        if !self.matches(&request.path) {
            return;
        }

        if self.rule.read_body {
            let body = request.read_body().await;
            tracing::debug!(rule = %self.rule.name, bytes = body.len(), "Body read for inspection");
        }

        for name in &self.rule.remove_headers {
            request.remove_header(name);
        }
        for header in &self.rule.set_headers {
            request.set_header(&header.name, &header.value);
        }
        if let Some(body) = &self.rule.set_body {
            request.set_body(body.clone());
        }
    }
}
