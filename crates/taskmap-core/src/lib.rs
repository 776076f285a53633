//! TaskMap Core - Domain models, errors, and configuration
//!
//! This crate contains the task, cluster, and search-criteria models shared by the
//! backend adapters and the retrieval coordinator, plus the layered configuration.

pub mod config;
pub mod error;
pub mod models;

pub use config::{CoordinatorConfig, LayeredConfig};
pub use error::{Result, TaskmapError};
