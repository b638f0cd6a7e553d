//! Intercepting HTTP proxy library.
//!
//! Inbound requests are snapshotted into a [`MutableRequest`], handed to a
//! chain of hooks that may rewrite any field, then forwarded either untouched
//! or rebuilt from the edited fields.

pub mod config;
pub mod hooks;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use hooks::{HookChain, RequestHook};
pub use http::{HttpServer, MutableRequest};
pub use lifecycle::Shutdown;
