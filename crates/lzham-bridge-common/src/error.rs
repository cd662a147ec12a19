//! Error types for lzham-bridge.
//!
//! [`CodecError`] is the single error surfaced by every backend. Its variants
//! split into two groups:
//! - Call-scoped errors ([`CodecError::InputValidation`], [`CodecError::Instantiation`],
//!   [`CodecError::Codec`], [`CodecError::Protocol`], [`CodecError::Trap`]) leave
//!   the backend usable for the next call.
//! - Sticky errors ([`CodecError::BackendUnavailable`], [`CodecError::Compilation`])
//!   are returned for every call for the rest of the process.

use thiserror::Error;

use crate::contract::Direction;

/// Errors returned by the codec backends.
///
/// The type is `Clone` so that a cached initialization failure can be handed
/// out to every caller that hits it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A source or destination buffer was rejected before any backend ran.
    #[error("Invalid input: {reason}")]
    InputValidation {
        /// Why the buffers were rejected.
        reason: String,
    },

    /// This build contains no usable codec backend.
    #[error("Backend unavailable: {reason}")]
    BackendUnavailable {
        /// What is missing from the build.
        reason: String,
    },

    /// The sandbox engine or guest module failed to initialize.
    #[error("Compilation failed: {reason}")]
    Compilation {
        /// Description of the compilation failure.
        reason: String,
    },

    /// A single call could not create its isolated guest instance.
    #[error("Instantiation failed: {reason}")]
    Instantiation {
        /// Description of the instantiation failure.
        reason: String,
    },

    /// The codec itself reported a failure.
    #[error("lzham: {direction} failed: {message}")]
    Codec {
        /// Which entry point failed.
        direction: Direction,
        /// Raw status code returned by the codec.
        status: u32,
        /// Message returned by the codec's strerror lookup, verbatim.
        message: String,
    },

    /// The codec broke the calling convention (bad error string, overlong result).
    #[error("Protocol violation: {reason}")]
    Protocol {
        /// Description of the violation.
        reason: String,
    },

    /// The guest trapped while running a call.
    #[error("Wasm trap: {message}")]
    Trap {
        /// Description of the trap.
        message: String,
    },
}

impl CodecError {
    /// Create a new `InputValidation` error.
    pub fn input_validation(reason: impl Into<String>) -> Self {
        Self::InputValidation {
            reason: reason.into(),
        }
    }

    /// Create a new `BackendUnavailable` error.
    pub fn backend_unavailable(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a new `Compilation` error.
    pub fn compilation(reason: impl Into<String>) -> Self {
        Self::Compilation {
            reason: reason.into(),
        }
    }

    /// Create a new `Instantiation` error.
    pub fn instantiation(reason: impl Into<String>) -> Self {
        Self::Instantiation {
            reason: reason.into(),
        }
    }

    /// Create a new `Codec` error.
    pub fn codec(direction: Direction, status: u32, message: impl Into<String>) -> Self {
        Self::Codec {
            direction,
            status,
            message: message.into(),
        }
    }

    /// Create a new `Protocol` error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Create a new `Trap` error.
    pub fn trap(message: impl Into<String>) -> Self {
        Self::Trap {
            message: message.into(),
        }
    }

    /// Returns `true` if this error only affects the call that produced it.
    pub fn is_call_scoped(&self) -> bool {
        !matches!(
            self,
            Self::BackendUnavailable { .. } | Self::Compilation { .. }
        )
    }

    /// Returns the codec-provided message, if the codec itself failed.
    pub fn codec_message(&self) -> Option<&str> {
        match self {
            Self::Codec { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodecError::input_validation("zero-length buffer");
        assert_eq!(err.to_string(), "Invalid input: zero-length buffer");

        let err = CodecError::codec(Direction::Decompress, 9, "bad code");
        assert_eq!(err.to_string(), "lzham: decompress failed: bad code");
    }

    #[test]
    fn test_is_call_scoped() {
        assert!(CodecError::input_validation("x").is_call_scoped());
        assert!(CodecError::instantiation("x").is_call_scoped());
        assert!(CodecError::codec(Direction::Compress, 1, "x").is_call_scoped());
        assert!(CodecError::protocol("x").is_call_scoped());
        assert!(CodecError::trap("x").is_call_scoped());
        assert!(!CodecError::compilation("x").is_call_scoped());
        assert!(!CodecError::backend_unavailable("x").is_call_scoped());
    }

    #[test]
    fn test_codec_message() {
        let err = CodecError::codec(Direction::Compress, 7, "output buffer too small");
        assert_eq!(err.codec_message(), Some("output buffer too small"));
        assert_eq!(CodecError::trap("unreachable").codec_message(), None);
    }

    #[test]
    fn test_error_clone_eq() {
        let err = CodecError::compilation("no guest module");
        assert_eq!(err.clone(), err);
    }
}
