//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build hooks → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C received → broadcast → stop accepting → drain → exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
