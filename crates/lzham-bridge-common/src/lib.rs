//! Common types, errors, and configuration for lzham-bridge.
//!
//! This crate provides the pieces shared by every codec backend:
//! - The buffer calling convention ([`dispatch`], [`CodecBackend`], [`CodecResult`])
//! - Error types using `thiserror` ([`CodecError`])
//! - Configuration structures for the sandbox backend and the CLI

pub mod config;
pub mod config_file;
pub mod contract;
pub mod error;

pub use config::{OptLevel, SandboxConfig};
pub use config_file::{ConfigFile, ConfigFileError, LoggingConfig};
pub use contract::{BackendKind, CodecBackend, CodecResult, Direction, dispatch, validate};
pub use error::CodecError;
