//! Guest module compilation and precompiled artifacts.
//!
//! This module provides [`CompiledModule`], a wrapper around Wasmtime's
//! [`Module`] that handles compilation, serialization, and deserialization of
//! the codec's WebAssembly module.
//!
//! # Compilation Strategies
//!
//! - **JIT**: Compile from Wasm bytes on first use (slower cold start)
//! - **AOT**: Load a `.cwasm` artifact produced by [`CompiledModule::serialize`]

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, instrument};
use wasmtime::{Engine, Module};

use lzham_bridge_common::CodecError;

/// File extension of precompiled artifacts.
pub const PRECOMPILED_EXTENSION: &str = "cwasm";

/// A compiled guest module.
///
/// `CompiledModule` is cheap to clone and can be instantiated from any
/// number of threads at once.
#[derive(Clone)]
pub struct CompiledModule {
    inner: Module,

    /// Hash of the original Wasm bytes, or the artifact's file stem.
    content_hash: String,
}

impl CompiledModule {
    /// Compile a module from WebAssembly binary bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Compilation`] if the bytes are not a valid module.
    #[instrument(skip(engine, bytes), fields(bytes_len = bytes.len()))]
    pub fn from_bytes(engine: &Engine, bytes: &[u8]) -> Result<Self, CodecError> {
        let start = Instant::now();

        Self::validate_wasm_header(bytes)?;

        let module = Module::new(engine, bytes).map_err(|e| {
            CodecError::compilation(format!("Guest module compilation failed: {e}"))
        })?;

        let content_hash = compute_hash(bytes);

        info!(
            content_hash = %content_hash,
            duration_ms = start.elapsed().as_millis(),
            "Guest module compiled"
        );

        Ok(Self {
            inner: module,
            content_hash,
        })
    }

    /// Compile a module from WAT (WebAssembly Text Format).
    #[instrument(skip(engine, wat))]
    pub fn from_wat(engine: &Engine, wat: &str) -> Result<Self, CodecError> {
        let start = Instant::now();

        let module = Module::new(engine, wat)
            .map_err(|e| CodecError::compilation(format!("WAT compilation failed: {e}")))?;

        let content_hash = compute_hash(wat.as_bytes());

        info!(
            content_hash = %content_hash,
            duration_ms = start.elapsed().as_millis(),
            "WAT module compiled"
        );

        Ok(Self {
            inner: module,
            content_hash,
        })
    }

    /// Load a precompiled module from disk.
    ///
    /// The artifact must have been produced by [`CompiledModule::serialize`]
    /// with the same Wasmtime version and engine settings; Wasmtime rejects
    /// anything else.
    #[allow(unsafe_code)]
    #[instrument(skip(engine, path))]
    pub fn from_precompiled(engine: &Engine, path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let start = Instant::now();

        // SAFETY: artifacts are only produced by our own `serialize`, and
        // Wasmtime verifies the version and engine settings before loading.
        let module = unsafe { Module::deserialize_file(engine, path) }.map_err(|e| {
            CodecError::compilation(format!(
                "Failed to load precompiled module from {}: {e}",
                path.display()
            ))
        })?;

        let content_hash = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        debug!(
            path = %path.display(),
            content_hash = %content_hash,
            duration_us = start.elapsed().as_micros(),
            "Precompiled module loaded"
        );

        Ok(Self {
            inner: module,
            content_hash,
        })
    }

    /// Load a module from a file, choosing the loader by extension.
    ///
    /// - `.cwasm`: precompiled artifact
    /// - `.wat`: text format
    /// - anything else: WebAssembly binary
    pub fn from_file(engine: &Engine, path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str());

        if extension == Some(PRECOMPILED_EXTENSION) {
            return Self::from_precompiled(engine, path);
        }

        let read_error = |e: std::io::Error| {
            CodecError::compilation(format!(
                "Failed to read guest module {}: {e}",
                path.display()
            ))
        };

        if extension == Some("wat") {
            let wat = std::fs::read_to_string(path).map_err(read_error)?;
            Self::from_wat(engine, &wat)
        } else {
            let bytes = std::fs::read(path).map_err(read_error)?;
            Self::from_bytes(engine, &bytes)
        }
    }

    /// Serialize the compiled module for AOT loading.
    pub fn serialize(&self) -> Result<Vec<u8>, CodecError> {
        self.inner
            .serialize()
            .map_err(|e| CodecError::compilation(format!("Module serialization failed: {e}")))
    }

    /// Get the content hash of the original Wasm bytes.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Get the inner Wasmtime module.
    pub fn inner(&self) -> &Module {
        &self.inner
    }

    /// Validate WebAssembly header (magic number).
    fn validate_wasm_header(bytes: &[u8]) -> Result<(), CodecError> {
        if bytes.len() < 8 {
            return Err(CodecError::compilation("Invalid Wasm: file too small"));
        }

        // Check magic number: \0asm
        if &bytes[0..4] != b"\0asm" {
            return Err(CodecError::compilation("Invalid Wasm: bad magic number"));
        }

        Ok(())
    }
}

impl std::fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledModule")
            .field("content_hash", &self.content_hash)
            .finish_non_exhaustive()
    }
}

/// Compute a hash of the given bytes.
fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
