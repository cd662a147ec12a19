//! Entry-point table for a C library implementing the codec contract.

use libc::{c_char, size_t};

use lzham_bridge_common::Direction;

/// `(dst, dst_len, src, src_len, adler32_out, crc32_out) -> status`.
///
/// `dst_len` holds the destination capacity on entry and the number of bytes
/// written on return.
pub type CodecFn = unsafe extern "C" fn(
    dst: *mut u8,
    dst_len: *mut size_t,
    src: *const u8,
    src_len: size_t,
    adler32_out: *mut u32,
    crc32_out: *mut u32,
) -> u32;

/// Maps a status code to a NUL-terminated static message, or null on success.
pub type StrerrorFn = unsafe extern "C" fn(status: u32) -> *const c_char;

/// The four functions a native codec library exports.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoints {
    pub compress: CodecFn,
    pub decompress: CodecFn,
    pub compress_strerror: StrerrorFn,
    pub decompress_strerror: StrerrorFn,
}

impl EntryPoints {
    /// The codec and strerror pair for one direction.
    pub fn select(&self, direction: Direction) -> (CodecFn, StrerrorFn) {
        match direction {
            Direction::Compress => (self.compress, self.compress_strerror),
            Direction::Decompress => (self.decompress, self.decompress_strerror),
        }
    }

    /// The symbols of the linked libtf2lzham.
    #[cfg(feature = "link")]
    pub const fn linked() -> Self {
        use crate::ffi;

        Self {
            compress: ffi::tf2lzham_compress,
            decompress: ffi::tf2lzham_decompress,
            compress_strerror: ffi::tf2lzham_compress_strerror,
            decompress_strerror: ffi::tf2lzham_decompress_strerror,
        }
    }
}
