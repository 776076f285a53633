//! TaskMap Store - Search backend port and adapters
//!
//! This crate defines the task search port consumed by the retrieval coordinator
//! and provides an in-memory adapter and an HTTP adapter for the task service.

pub mod http;
pub mod memory;
pub mod ports;

pub use http::HttpTaskBackend;
pub use memory::MemoryTaskBackend;
pub use ports::TaskSearchBackend;
