//! Invocation of a native codec library over borrowed buffers.

use std::ffi::CStr;

use libc::size_t;
use tracing::debug;

use lzham_bridge_common::{BackendKind, CodecBackend, CodecError, CodecResult, Direction};

use crate::EntryPoints;

/// Codec backend that calls a native library directly.
///
/// The codec holds no state besides its entry-point table. Every call borrows
/// the caller's slices for exactly as long as the foreign function runs; no
/// pointer outlives the call.
///
/// This layer adds no locking. Concurrent calls are as safe as the library
/// itself makes them.
#[derive(Debug, Clone, Copy)]
pub struct NativeCodec {
    entry: EntryPoints,
}

impl NativeCodec {
    /// Create a codec over an arbitrary entry-point table.
    ///
    /// # Safety
    ///
    /// Every function in `entry` must honor the codec contract: write no more
    /// than `*dst_len` bytes into `dst`, read no more than `src_len` bytes from
    /// `src`, retain neither pointer after returning, and have the strerror
    /// functions return either null or a pointer to a NUL-terminated string
    /// that stays valid for the life of the process.
    #[allow(unsafe_code)]
    pub const unsafe fn new(entry: EntryPoints) -> Self {
        Self { entry }
    }

    /// A codec bound to the linked libtf2lzham.
    #[cfg(feature = "link")]
    pub const fn linked() -> Self {
        Self {
            entry: EntryPoints::linked(),
        }
    }

    /// Run one call against the library.
    ///
    /// Callers normally go through [`lzham_bridge_common::dispatch`], which
    /// rejects empty buffers first.
    #[allow(unsafe_code)]
    pub fn call(
        &self,
        direction: Direction,
        destination: &mut [u8],
        source: &[u8],
    ) -> Result<CodecResult, CodecError> {
        let (codec, strerror) = self.entry.select(direction);

        let capacity = destination.len();
        let mut dst_len: size_t = capacity;
        let mut adler32: u32 = 0;
        let mut crc32: u32 = 0;

        // SAFETY: both pointers come from live slices whose lengths are passed
        // alongside them, and the `new` contract forbids the library from
        // touching anything past those extents or after it returns.
        let status = unsafe {
            codec(
                destination.as_mut_ptr(),
                &raw mut dst_len,
                source.as_ptr(),
                source.len(),
                &raw mut adler32,
                &raw mut crc32,
            )
        };

        // SAFETY: strerror is a pure lookup into static strings.
        let message = unsafe { strerror(status) };
        if !message.is_null() {
            // SAFETY: non-null strerror results are NUL-terminated and static.
            let text = unsafe { CStr::from_ptr(message) }
                .to_str()
                .map_err(|e| {
                    CodecError::protocol(format!("strerror returned a non-UTF-8 string: {e}"))
                })?
                .to_owned();
            debug!(direction = %direction, status, message = %text, "Native codec returned an error");
            return Err(CodecError::codec(direction, status, text));
        }

        if dst_len > capacity {
            return Err(CodecError::protocol(format!(
                "native {direction} reported {dst_len} bytes for a {capacity}-byte destination"
            )));
        }

        debug!(
            direction = %direction,
            source_len = source.len(),
            written = dst_len,
            "Native codec call completed"
        );

        Ok(CodecResult {
            written: dst_len,
            adler32,
            crc32,
        })
    }
}

impl CodecBackend for NativeCodec {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
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
