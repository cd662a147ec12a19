//! Configuration structures for lzham-bridge.
//!
//! - [`SandboxConfig`]: Wasmtime engine and guest limits for the sandbox backend

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Cranelift optimization level for the sandbox engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptLevel {
    /// No optimizations; fastest compilation.
    None,
    /// Optimize for execution speed.
    #[default]
    Speed,
    /// Optimize for speed and code size.
    SpeedAndSize,
}

/// Sandbox backend configuration.
///
/// These settings are read once, when the process-wide engine is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SandboxConfig {
    /// Maximum linear memory a single guest instance may grow to, in megabytes.
    ///
    /// The guest must hold both buffers plus its own working set, so this
    /// bounds the largest call the sandbox accepts.
    #[serde(default = "defaults::max_memory_mb")]
    pub max_memory_mb: u32,

    /// Cranelift optimization level used when compiling the guest module.
    #[serde(default)]
    pub opt_level: OptLevel,

    /// Load the guest module from this file instead of the embedded bytes.
    ///
    /// Files ending in `.cwasm` are treated as precompiled artifacts; anything
    /// else is compiled from `.wasm` or `.wat` source.
    #[serde(default)]
    pub module_path: Option<PathBuf>,

    /// Forward guest stdout/stderr to the host process.
    ///
    /// The codec only writes there when an internal assertion fires.
    #[serde(default)]
    pub inherit_stdio: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: defaults::max_memory_mb(),
            opt_level: OptLevel::default(),
            module_path: None,
            inherit_stdio: false,
        }
    }
}

impl SandboxConfig {
    /// Maximum guest memory in bytes, saturating at `usize::MAX`.
    pub fn max_memory_bytes(&self) -> usize {
        (self.max_memory_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// Default value functions for serde.
mod defaults {
    pub const fn max_memory_mb() -> u32 {
        256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SandboxConfig::default();

        assert_eq!(config.max_memory_mb, 256);
        assert_eq!(config.opt_level, OptLevel::Speed);
        assert!(config.module_path.is_none());
        assert!(!config.inherit_stdio);
        assert_eq!(config.max_memory_bytes(), 256 * 1024 * 1024);
    }

    #[test]
    fn test_config_serialization() {
        let config = SandboxConfig {
            opt_level: OptLevel::SpeedAndSize,
            module_path: Some("tf2lzham.wasm".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SandboxConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, deserialized);
        assert!(json.contains("speed_and_size"));
    }

    #[test]
    fn test_partial_deserialization() {
        let json = r#"{"max_memory_mb": 64}"#;
        let config: SandboxConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.max_memory_mb, 64);
        assert_eq!(config.opt_level, OptLevel::Speed);
    }

    #[test]
    fn test_max_memory_bytes_saturates() {
        let config = SandboxConfig {
            max_memory_mb: u32::MAX,
            ..Default::default()
        };

        let expected = (u32::MAX as usize)
            .checked_mul(1024 * 1024)
            .unwrap_or(usize::MAX);
        assert_eq!(config.max_memory_bytes(), expected);
    }
}
