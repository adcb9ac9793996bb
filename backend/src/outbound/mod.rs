//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-process store backing every data port.
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no business logic.

pub mod memory;

pub use memory::MemoryStore;
