//! Logging utilities.
//!
//! The engine itself only emits through the `log` facade. This module offers
//! an `env_logger` backend for hosts that do not install their own.

mod init;

pub use init::{init_logging, LoggingConfig};
