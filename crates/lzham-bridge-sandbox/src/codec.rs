//! The sandbox codec backend and its process-wide instance.

use std::sync::OnceLock;
use std::time::Instant;

use tracing::{info, instrument};
use wasmtime::InstancePre;

use lzham_bridge_common::{
    BackendKind, CodecBackend, CodecError, CodecResult, Direction, SandboxConfig,
};

use crate::linker::{create_linker, prelink};
use crate::store::GuestContext;
use crate::{CompiledModule, SandboxEngine, SandboxInstance, embedded};

static GLOBAL_CONFIG: OnceLock<SandboxConfig> = OnceLock::new();
static GLOBAL: OnceLock<Result<SandboxCodec, CodecError>> = OnceLock::new();

/// Codec backend that runs the guest module inside Wasmtime.
///
/// Holds everything that is expensive to build and safe to share: the
/// engine, the compiled module, and its resolved imports. Each call
/// instantiates a fresh [`SandboxInstance`] from these, so any number of
/// threads may call into one `SandboxCodec` at once.
pub struct SandboxCodec {
    engine: SandboxEngine,
    module: CompiledModule,
    pre: InstancePre<GuestContext>,
}

impl SandboxCodec {
    /// Build a codec from the configured module source.
    ///
    /// The module is loaded from [`SandboxConfig::module_path`] when set, and
    /// from the bytes embedded at build time otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Compilation`] if there is no module, or it fails
    /// to compile or link.
    #[instrument(skip(config), fields(module_path = ?config.module_path))]
    pub fn new(config: &SandboxConfig) -> Result<Self, CodecError> {
        let start = Instant::now();
        let engine = SandboxEngine::new(config)?;

        let module = match (&config.module_path, embedded::MODULE) {
            (Some(path), _) => CompiledModule::from_file(engine.inner(), path)?,
            (None, Some(bytes)) => CompiledModule::from_bytes(engine.inner(), bytes)?,
            (None, None) => {
                return Err(CodecError::compilation(
                    "no guest module: set sandbox.module_path or build with LZHAM_BRIDGE_WASM_MODULE",
                ));
            }
        };

        let codec = Self::from_compiled(engine, module)?;

        info!(
            content_hash = %codec.module.content_hash(),
            duration_ms = start.elapsed().as_millis(),
            "Sandbox codec ready"
        );

        Ok(codec)
    }

    /// Build a codec from WebAssembly binary or text bytes.
    pub fn from_module_bytes(config: &SandboxConfig, bytes: &[u8]) -> Result<Self, CodecError> {
        let engine = SandboxEngine::new(config)?;
        let module = if bytes.starts_with(b"\0asm") {
            CompiledModule::from_bytes(engine.inner(), bytes)?
        } else {
            let wat = std::str::from_utf8(bytes).map_err(|e| {
                CodecError::compilation(format!("Guest module is neither Wasm nor UTF-8 WAT: {e}"))
            })?;
            CompiledModule::from_wat(engine.inner(), wat)?
        };
        Self::from_compiled(engine, module)
    }

    /// Link an already compiled module.
    ///
    /// `module` must have been compiled with `engine`.
    pub fn from_compiled(engine: SandboxEngine, module: CompiledModule) -> Result<Self, CodecError> {
        let linker = create_linker(&engine)?;
        let pre = prelink(&linker, &module)?;

        Ok(Self {
            engine,
            module,
            pre,
        })
    }

    /// The process-wide codec, built on first use.
    ///
    /// Concurrent first callers block until one of them finishes compiling;
    /// everyone then shares the result. A failed build is cached too: every
    /// later call gets the same [`CodecError::Compilation`] and nothing is
    /// retried.
    pub fn global() -> Result<&'static SandboxCodec, CodecError> {
        GLOBAL
            .get_or_init(|| {
                let config = GLOBAL_CONFIG.get_or_init(SandboxConfig::default);
                Self::new(config)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Set the configuration used by [`SandboxCodec::global`].
    ///
    /// Only the first call before the global codec is built takes effect; the
    /// rejected config is handed back otherwise.
    pub fn configure_global(config: SandboxConfig) -> Result<(), SandboxConfig> {
        if GLOBAL.get().is_some() {
            return Err(config);
        }
        GLOBAL_CONFIG.set(config)
    }

    /// Returns `true` once the global codec build has run, successfully or not.
    pub fn is_global_initialized() -> bool {
        GLOBAL.get().is_some()
    }

    /// Run one call in a fresh guest instance.
    pub fn call(
        &self,
        direction: Direction,
        destination: &mut [u8],
        source: &[u8],
    ) -> Result<CodecResult, CodecError> {
        SandboxInstance::new(&self.engine, &self.pre, direction)?.run(destination, source)
    }

    /// Get the compiled guest module.
    pub fn module(&self) -> &CompiledModule {
        &self.module
    }
}

impl CodecBackend for SandboxCodec {
    fn kind(&self) -> BackendKind {
        BackendKind::Sandbox
    }

    fn invoke(
        &self,
        direction: Direction,
        destination: &mut [u8],
        source: &[u8],
    ) -> Result<CodecResult, CodecError> {
        self.call(direction, destination, source)
    }
}

impl std::fmt::Debug for SandboxCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxCodec")
            .field("engine", &self.engine)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_codec_is_shareable() {
        assert_send_sync::<SandboxCodec>();
    }

    #[test]
    fn test_missing_module_file() {
        let config = SandboxConfig {
            module_path: Some("/nonexistent/tf2lzham.wasm".into()),
            ..Default::default()
        };

        let err = SandboxCodec::new(&config).unwrap_err();
        assert!(matches!(err, CodecError::Compilation { .. }));
    }

    #[test]
    fn test_module_bytes_neither_wasm_nor_wat() {
        let err = SandboxCodec::from_module_bytes(&SandboxConfig::default(), &[0xff, 0xfe, 0x00])
            .unwrap_err();
        assert!(matches!(err, CodecError::Compilation { .. }));
    }
}
