//! Core shared library for the brewhouse workspace.
//!
//! This crate exposes the primitives the clock and any future service
//! depend on: the canonical error type, environment configuration
//! loading and logging setup.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{BrewhouseConfig, Environment};
pub use errors::{BrewhouseError, ConfigError, Result as CoreResult};
