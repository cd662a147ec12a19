//! Wasmtime engine configuration and creation.
//!
//! The [`SandboxEngine`] is built once per process and shared by every call.
//! It holds compilation settings only; all per-call state lives in the
//! store created for that call.

use tracing::info;
use wasmtime::{Config, Engine};

use lzham_bridge_common::{CodecError, OptLevel, SandboxConfig};

/// Thread-safe WebAssembly engine wrapper.
///
/// # Configuration
///
/// The engine is configured with:
/// - **Cranelift**: Optimization level taken from [`SandboxConfig::opt_level`]
/// - **Synchronous execution**: Codec calls block the calling thread; there
///   is no fuel or epoch interruption because calls cannot be cancelled
///
/// # Example
///
/// ```ignore
/// use lzham_bridge_common::SandboxConfig;
/// use lzham_bridge_sandbox::SandboxEngine;
///
/// let engine = SandboxEngine::new(&SandboxConfig::default())?;
/// ```
#[derive(Clone)]
pub struct SandboxEngine {
    engine: Engine,
    config: SandboxConfig,
}

impl SandboxEngine {
    /// Create a new engine with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Compilation`] if Wasmtime rejects the configuration.
    pub fn new(config: &SandboxConfig) -> Result<Self, CodecError> {
        let mut wasmtime_config = Config::new();

        wasmtime_config.cranelift_opt_level(match config.opt_level {
            OptLevel::None => wasmtime::OptLevel::None,
            OptLevel::Speed => wasmtime::OptLevel::Speed,
            OptLevel::SpeedAndSize => wasmtime::OptLevel::SpeedAndSize,
        });

        let engine = Engine::new(&wasmtime_config).map_err(|e| {
            CodecError::compilation(format!("Failed to create Wasmtime engine: {e}"))
        })?;

        info!(
            opt_level = ?config.opt_level,
            max_memory_mb = config.max_memory_mb,
            "Wasmtime engine initialized"
        );

        Ok(Self {
            engine,
            config: config.clone(),
        })
    }

    /// Get a reference to the inner Wasmtime engine.
    pub fn inner(&self) -> &Engine {
        &self.engine
    }

    /// Get the sandbox configuration.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }
}

impl std::fmt::Debug for SandboxEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxEngine")
            .field("opt_level", &self.config.opt_level)
            .field("max_memory_mb", &self.config.max_memory_mb)
            .finish_non_exhaustive()
    }
}
