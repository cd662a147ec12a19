//! Raw bindings to the `tf2lzham_*` symbols of libtf2lzham.
//!
//! Linking is configured by the build script; see `LZHAM_BRIDGE_NATIVE_LIB_DIR`.

use libc::{c_char, size_t};

#[allow(unsafe_code)]
unsafe extern "C" {
    pub fn tf2lzham_compress(
        dst: *mut u8,
        dst_len: *mut size_t,
        src: *const u8,
        src_len: size_t,
        adler32_out: *mut u32,
        crc32_out: *mut u32,
    ) -> u32;

    pub fn tf2lzham_decompress(
        dst: *mut u8,
        dst_len: *mut size_t,
        src: *const u8,
        src_len: size_t,
        adler32_out: *mut u32,
        crc32_out: *mut u32,
    ) -> u32;

    pub fn tf2lzham_compress_strerror(status: u32) -> *const c_char;

    pub fn tf2lzham_decompress_strerror(status: u32) -> *const c_char;
}
