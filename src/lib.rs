// ABOUTME: Library root for deploy-now - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logs;
pub mod output;
pub mod outputs;
pub mod provider;
pub mod reconcile;
pub mod status;
pub mod tracking;
pub mod types;
