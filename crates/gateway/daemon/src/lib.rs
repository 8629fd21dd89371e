//! Gateway daemon library
//!
//! This module provides the components of the `gatewayd` binary:
//! - REST API handlers over the [`gateway_commit::Gateway`] facade
//! - Layered configuration
//! - A simulated network backing the node clients
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod sim;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
