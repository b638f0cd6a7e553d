//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, proxy handler)
//!     → request.rs (MutableRequest snapshot)
//!         → headers.rs (ordered header lines, flat text form)
//!         → body.rs (one-shot stream, rebuffered on read)
//!         → form.rs (urlencoded body decoding)
//!     → [hooks edit the snapshot]
//!     → request.rs (original or rebuilt outbound request)
//!     → hyper client → response streamed back
//! ```

pub mod body;
pub mod form;
pub mod headers;
pub mod request;
pub mod server;

pub use headers::HeaderBlock;
pub use request::{MutableRequest, RebuildError};
pub use server::HttpServer;
