//! Shared tracing setup for SessionGuard binaries
//!
//! Library code only emits events through the `tracing` macros; installing a
//! subscriber is left to the binary, which calls [`init::init_tracing`].

pub mod config;
pub mod init;

pub use config::InstrumentationConfig;
pub use init::init_tracing;
