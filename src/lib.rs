//! LZHAM buffer compression with a build-time choice of backend.
//!
//! [`compress`] and [`decompress`] have the same contract whichever backend
//! the crate was built with:
//!
//! | features                      | backend                         |
//! |-------------------------------|---------------------------------|
//! | `force-sandbox`               | Wasmtime sandbox                |
//! | `native`                      | libtf2lzham over FFI            |
//! | `sandbox` (default)           | Wasmtime sandbox                |
//! | none                          | every call is `BackendUnavailable` |
//!
//! # Example
//!
//! ```ignore
//! let mut compressed = vec![0u8; 1024];
//! let packed = lzham_bridge::compress(&mut compressed, b"hello world")?;
//!
//! let mut restored = vec![0u8; 11];
//! let unpacked = lzham_bridge::decompress(&mut restored, &compressed[..packed.written])?;
//! assert_eq!(packed.crc32, unpacked.crc32);
//! ```

pub use lzham_bridge_common::{
    BackendKind, CodecBackend, CodecError, CodecResult, Direction, SandboxConfig,
};

/// The backend compiled into this build, if any.
pub const BACKEND: Option<BackendKind> = selected::BACKEND;

/// Compress `source` into `destination`.
///
/// Returns the number of bytes written and the checksums of `source`.
pub fn compress(destination: &mut [u8], source: &[u8]) -> Result<CodecResult, CodecError> {
    run(Direction::Compress, destination, source)
}

/// Decompress `source` into `destination`.
///
/// Returns the number of bytes written and the checksums of the output.
pub fn decompress(destination: &mut [u8], source: &[u8]) -> Result<CodecResult, CodecError> {
    run(Direction::Decompress, destination, source)
}

/// Returns `true` if calls run inside the WebAssembly sandbox.
pub const fn is_sandboxed() -> bool {
    matches!(BACKEND, Some(BackendKind::Sandbox))
}

/// Build the backend now instead of on the first call.
///
/// For the sandbox this compiles the guest module; for native it does nothing.
pub fn prepare() -> Result<(), CodecError> {
    selected::backend().map(|_| ())
}

/// Configure the sandbox before its first use.
///
/// Hands the config back if the sandbox has already been built. Builds
/// without the sandbox accept and ignore it.
pub fn configure(config: SandboxConfig) -> Result<(), SandboxConfig> {
    selected::configure(config)
}

fn run(
    direction: Direction,
    destination: &mut [u8],
    source: &[u8],
) -> Result<CodecResult, CodecError> {
    // Reject bad input before the backend is resolved, so it never triggers
    // sandbox compilation.
    lzham_bridge_common::validate(destination, source)?;
    let backend = selected::backend()?;
    lzham_bridge_common::dispatch(backend, direction, destination, source)
}

#[cfg(any(
    feature = "force-sandbox",
    all(feature = "sandbox", not(feature = "native"))
))]
mod selected {
    use lzham_bridge_common::{BackendKind, CodecBackend, CodecError, SandboxConfig};
    use lzham_bridge_sandbox::SandboxCodec;

    pub const BACKEND: Option<BackendKind> = Some(BackendKind::Sandbox);

    pub fn backend() -> Result<&'static dyn CodecBackend, CodecError> {
        SandboxCodec::global().map(|codec| codec as &dyn CodecBackend)
    }

    pub fn configure(config: SandboxConfig) -> Result<(), SandboxConfig> {
        SandboxCodec::configure_global(config)
    }
}

#[cfg(all(feature = "native", not(feature = "force-sandbox")))]
mod selected {
    use lzham_bridge_common::{BackendKind, CodecBackend, CodecError, SandboxConfig};
    use lzham_bridge_native::NativeCodec;

    static NATIVE: NativeCodec = NativeCodec::linked();

    pub const BACKEND: Option<BackendKind> = Some(BackendKind::Native);

    #[allow(clippy::unnecessary_wraps)]
    pub fn backend() -> Result<&'static dyn CodecBackend, CodecError> {
        Ok(&NATIVE)
    }

    #[allow(clippy::unnecessary_wraps, clippy::needless_pass_by_value)]
    pub fn configure(_config: SandboxConfig) -> Result<(), SandboxConfig> {
        Ok(())
    }
}

#[cfg(not(any(feature = "native", feature = "sandbox")))]
mod selected {
    use lzham_bridge_common::{BackendKind, CodecBackend, CodecError, SandboxConfig};

    pub const BACKEND: Option<BackendKind> = None;

    pub fn backend() -> Result<&'static dyn CodecBackend, CodecError> {
        Err(CodecError::backend_unavailable(
            "built without the `native` or `sandbox` feature",
        ))
    }

    #[allow(clippy::unnecessary_wraps, clippy::needless_pass_by_value)]
    pub fn configure(_config: SandboxConfig) -> Result<(), SandboxConfig> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_matches_features() {
        let expected = if cfg!(feature = "force-sandbox") {
            Some(BackendKind::Sandbox)
        } else if cfg!(feature = "native") {
            Some(BackendKind::Native)
        } else if cfg!(feature = "sandbox") {
            Some(BackendKind::Sandbox)
        } else {
            None
        };

        assert_eq!(BACKEND, expected);
        assert_eq!(is_sandboxed(), expected == Some(BackendKind::Sandbox));
    }

    #[test]
    fn test_zero_length_rejected_before_backend() {
        let mut dst = [0u8; 16];
        assert!(matches!(
            compress(&mut dst, &[]),
            Err(CodecError::InputValidation { .. })
        ));

        let mut empty: [u8; 0] = [];
        assert!(matches!(
            decompress(&mut empty, b"abc"),
            Err(CodecError::InputValidation { .. })
        ));
    }

    #[cfg(not(any(feature = "native", feature = "sandbox")))]
    #[test]
    fn test_no_backend_is_unavailable() {
        let mut dst = [0u8; 16];

        let err = compress(&mut dst, b"abc").unwrap_err();
        assert!(matches!(err, CodecError::BackendUnavailable { .. }));

        let err = decompress(&mut dst, b"abc").unwrap_err();
        assert!(matches!(err, CodecError::BackendUnavailable { .. }));
        assert!(prepare().is_err());
        assert!(dst.iter().all(|&b| b == 0));
    }
}
