//! Native FFI backend for lzham-bridge.
//!
//! [`NativeCodec`] lends the caller's buffers to a C library for the duration
//! of a single call:
//!
//! ```text
//!   &[u8] source ──────────► src, src_len
//!   &mut [u8] destination ─► dst, *dst_len = capacity
//!                                 │
//!                          tf2lzham_{compress,decompress}
//!                                 │
//!   CodecResult ◄────────── *dst_len, adler32, crc32
//!                                 │ status != 0
//!   CodecError::Codec ◄──── tf2lzham_*_strerror(status)
//! ```
//!
//! With the `link` feature the crate links against libtf2lzham and
//! [`NativeCodec::linked`] binds its symbols. Without it, callers supply
//! their own [`EntryPoints`].

pub mod codec;
pub mod entry;
#[cfg(feature = "link")]
mod ffi;

pub use codec::NativeCodec;
pub use entry::{CodecFn, EntryPoints, StrerrorFn};
