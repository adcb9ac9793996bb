//! Coredump web application library.
//!
//! The binary only loads configuration and calls [`server::create_server`];
//! everything else lives here so integration tests can build the same `App`.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;

pub use middleware::Trace;
