//! The buffer calling convention shared by every backend.
//!
//! A call lends the backend a read-only source slice and a writable
//! destination slice. The backend writes at most `destination.len()` bytes and
//! reports how many it wrote together with the adler32 and crc32 of the
//! uncompressed payload.

use std::fmt;

use tracing::{debug, warn};

use crate::CodecError;

/// Which codec entry point a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Compress the source into the destination.
    Compress,
    /// Decompress the source into the destination.
    Decompress,
}

impl Direction {
    /// The entry point suffix used by both the native library and the guest module.
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Compress => "compress",
            Direction::Decompress => "decompress",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful codec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecResult {
    /// Number of bytes written to the front of the destination buffer.
    pub written: usize,

    /// Adler-32 of the uncompressed payload.
    pub adler32: u32,

    /// CRC-32 of the uncompressed payload.
    pub crc32: u32,
}

/// Identifies a backend implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Direct FFI call into a natively compiled library.
    Native,
    /// WebAssembly module running inside a Wasmtime sandbox.
    Sandbox,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => f.write_str("native"),
            BackendKind::Sandbox => f.write_str("sandbox"),
        }
    }
}

/// A codec execution strategy.
///
/// Implementations may assume both buffers are non-empty; [`dispatch`]
/// enforces that before calling [`CodecBackend::invoke`].
pub trait CodecBackend: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> BackendKind;

    /// Run one codec call.
    fn invoke(
        &self,
        direction: Direction,
        destination: &mut [u8],
        source: &[u8],
    ) -> Result<CodecResult, CodecError>;
}

/// Check that a call's buffers satisfy the calling convention.
pub fn validate(destination: &[u8], source: &[u8]) -> Result<(), CodecError> {
    if source.is_empty() {
        return Err(CodecError::input_validation("zero-length source buffer"));
    }
    if destination.is_empty() {
        return Err(CodecError::input_validation(
            "zero-length destination buffer",
        ));
    }
    Ok(())
}

/// Validate a call and run it on `backend`.
///
/// Zero-length buffers are rejected before the backend is touched. A backend
/// that claims to have written more than the destination holds is reported
/// as a [`CodecError::Protocol`] error.
pub fn dispatch(
    backend: &dyn CodecBackend,
    direction: Direction,
    destination: &mut [u8],
    source: &[u8],
) -> Result<CodecResult, CodecError> {
    validate(destination, source)?;

    let capacity = destination.len();
    debug!(
        backend = %backend.kind(),
        direction = %direction,
        source_len = source.len(),
        capacity,
        "Dispatching codec call"
    );

    let result = backend
        .invoke(direction, destination, source)
        .inspect_err(|e| {
            warn!(
                backend = %backend.kind(),
                direction = %direction,
                error = %e,
                "Codec call failed"
            );
        })?;

    if result.written > capacity {
        return Err(CodecError::protocol(format!(
            "backend reported {} bytes written into a {capacity}-byte destination",
            result.written
        )));
    }

    Ok(result)
}
