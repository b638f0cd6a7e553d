//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!
//! Consumers:
//!     → stdout (fmt layer)
//! ```
//!
//! # Design Decisions
//! - Structured fields (client, method, path, modified) on every event
//! - Per-request spans come from tower-http's TraceLayer

pub mod logging;
