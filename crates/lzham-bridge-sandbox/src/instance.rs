//! Per-call guest instance lifecycle.
//!
//! A [`SandboxInstance`] lives for exactly one codec call:
//!
//! 1. Create a fresh store and instantiate the pre-linked module
//! 2. Resolve the allocator, codec, and strerror exports
//! 3. Allocate the call's region and copy the source in
//! 4. Run the codec and translate its status
//! 5. Copy the output back; the store is dropped with the instance
//!
//! Instances are never pooled or reused. The guest grows its memory to fit
//! each call's buffers, and a reused instance would carry that memory and
//! whatever its allocator left behind into the next call.

use std::time::Instant;

use tracing::{debug, instrument};
use wasmtime::{Instance, InstancePre, Memory, Store, Trap, TypedFunc};

use lzham_bridge_common::{CodecError, CodecResult, Direction};

use crate::layout::{GuestHeader, GuestLayout, HEADER_LEN, read_error_message};
use crate::store::{GuestContext, create_store};
use crate::SandboxEngine;

/// Prefix shared by every codec export.
pub const EXPORT_PREFIX: &str = "tf2lzham_";

/// Name of the guest allocator export.
pub const MALLOC_EXPORT: &str = "tf2lzham_malloc";

/// Name of the exported linear memory.
pub const MEMORY_EXPORT: &str = "memory";

/// `(dst, len_ptr, src, src_len, adler_ptr, crc_ptr) -> status`
type CodecParams = (u32, u32, u32, u32, u32, u32);

/// Export name of the codec entry point for `direction`.
pub fn codec_export(direction: Direction) -> String {
    format!("{EXPORT_PREFIX}{direction}")
}

/// Export name of the strerror entry point for `direction`.
pub fn strerror_export(direction: Direction) -> String {
    format!("{EXPORT_PREFIX}{direction}_strerror")
}

/// The guest exports one call needs.
struct GuestExports {
    memory: Memory,
    malloc: TypedFunc<u32, u32>,
    codec: TypedFunc<CodecParams, u32>,
    strerror: TypedFunc<u32, u32>,
}

impl GuestExports {
    fn resolve(
        store: &mut Store<GuestContext>,
        instance: &Instance,
        direction: Direction,
    ) -> Result<Self, CodecError> {
        let missing = |name: &str, e: wasmtime::Error| {
            CodecError::instantiation(format!("missing expected export '{name}': {e}"))
        };

        let memory = instance
            .get_memory(&mut *store, MEMORY_EXPORT)
            .ok_or_else(|| {
                CodecError::instantiation(format!("missing expected export '{MEMORY_EXPORT}'"))
            })?;

        let malloc = instance
            .get_typed_func::<u32, u32>(&mut *store, MALLOC_EXPORT)
            .map_err(|e| missing(MALLOC_EXPORT, e))?;

        let codec_name = codec_export(direction);
        let codec = instance
            .get_typed_func::<CodecParams, u32>(&mut *store, &codec_name)
            .map_err(|e| missing(&codec_name, e))?;

        let strerror_name = strerror_export(direction);
        let strerror = instance
            .get_typed_func::<u32, u32>(&mut *store, &strerror_name)
            .map_err(|e| missing(&strerror_name, e))?;

        Ok(Self {
            memory,
            malloc,
            codec,
            strerror,
        })
    }
}

/// One isolated execution of the guest codec.
///
/// Owns its [`Store`], and with it the guest's linear memory. Consumed by
/// [`SandboxInstance::run`], so teardown happens on every path out of a call.
pub struct SandboxInstance {
    store: Store<GuestContext>,
    exports: GuestExports,
    direction: Direction,
    created_at: Instant,
}

impl SandboxInstance {
    /// Instantiate a fresh guest for one call.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Instantiation`] if the instance cannot be created
    /// or lacks one of the required exports.
    pub fn new(
        engine: &SandboxEngine,
        pre: &InstancePre<GuestContext>,
        direction: Direction,
    ) -> Result<Self, CodecError> {
        let created_at = Instant::now();
        let mut store = create_store(engine);

        let instance = pre
            .instantiate(&mut store)
            .map_err(|e| CodecError::instantiation(format!("Instantiation failed: {e}")))?;

        let exports = GuestExports::resolve(&mut store, &instance, direction)?;

        debug!(
            call_id = %store.data().call_id,
            duration_us = created_at.elapsed().as_micros(),
            "Guest instance created"
        );

        Ok(Self {
            store,
            exports,
            direction,
            created_at,
        })
    }

    /// Run the call and tear the instance down.
    ///
    /// On success, exactly `written` bytes of `destination` have been
    /// overwritten; the rest is untouched.
    #[instrument(
        skip_all,
        fields(
            call_id = %self.store.data().call_id,
            direction = %self.direction,
            source_len = source.len(),
            capacity = destination.len(),
        )
    )]
    pub fn run(
        mut self,
        destination: &mut [u8],
        source: &[u8],
    ) -> Result<CodecResult, CodecError> {
        let direction = self.direction;
        let size = GuestLayout::allocation_size(destination.len(), source.len())?;

        let base = self
            .exports
            .malloc
            .call(&mut self.store, size)
            .map_err(|e| guest_trap(MALLOC_EXPORT, &e))?;
        if base == 0 {
            return Err(CodecError::instantiation(format!(
                "guest could not allocate {size} bytes"
            )));
        }

        let layout = GuestLayout::new(base, destination.len(), source.len())?;
        let memory = self.exports.memory;

        memory
            .write(&mut self.store, layout.length() as usize, &layout.initial_header())
            .map_err(|e| out_of_bounds("header", &e))?;
        memory
            .write(&mut self.store, layout.source() as usize, source)
            .map_err(|e| out_of_bounds("source", &e))?;

        let status = self
            .exports
            .codec
            .call(
                &mut self.store,
                (
                    layout.destination(),
                    layout.length(),
                    layout.source(),
                    layout.source_len(),
                    layout.adler32(),
                    layout.crc32(),
                ),
            )
            .map_err(|e| guest_trap(&codec_export(direction), &e))?;

        let message_ptr = self
            .exports
            .strerror
            .call(&mut self.store, status)
            .map_err(|e| guest_trap(&strerror_export(direction), &e))?;

        if message_ptr != 0 {
            let message = read_error_message(memory.data(&self.store), message_ptr)?;
            debug!(status, message = %message, "Guest codec returned an error");
            return Err(CodecError::codec(direction, status, message));
        }

        let mut header = [0u8; HEADER_LEN as usize];
        memory
            .read(&self.store, layout.length() as usize, &mut header)
            .map_err(|e| out_of_bounds("header", &e))?;
        let header = GuestHeader::decode(&header);

        if header.length > layout.capacity() {
            return Err(CodecError::protocol(format!(
                "guest {direction} reported {} bytes for a {}-byte destination",
                header.length,
                layout.capacity()
            )));
        }

        let written = header.length as usize;
        memory
            .read(
                &self.store,
                layout.destination() as usize,
                &mut destination[..written],
            )
            .map_err(|e| out_of_bounds("destination", &e))?;

        debug!(
            written,
            memory_bytes = memory.data_size(&self.store),
            duration_us = self.created_at.elapsed().as_micros(),
            "Guest codec call completed"
        );

        Ok(CodecResult {
            written,
            adler32: header.adler32,
            crc32: header.crc32,
        })
    }
}

impl std::fmt::Debug for SandboxInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxInstance")
            .field("call_id", &self.store.data().call_id)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

/// Describe a trap (or host exit) raised while a guest export ran.
fn guest_trap(export: &str, error: &wasmtime::Error) -> CodecError {
    match error.downcast_ref::<Trap>() {
        Some(trap) => CodecError::trap(format!("{export}: {trap}")),
        None => CodecError::trap(format!("{export}: {error}")),
    }
}

/// The guest handed out a region that is not inside its own memory.
fn out_of_bounds(region: &str, error: &wasmtime::MemoryAccessError) -> CodecError {
    CodecError::protocol(format!("guest {region} region out of bounds: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_names() {
        assert_eq!(codec_export(Direction::Compress), "tf2lzham_compress");
        assert_eq!(codec_export(Direction::Decompress), "tf2lzham_decompress");
        assert_eq!(
            strerror_export(Direction::Compress),
            "tf2lzham_compress_strerror"
        );
        assert_eq!(
            strerror_export(Direction::Decompress),
            "tf2lzham_decompress_strerror"
        );
    }

    #[test]
    fn test_guest_trap_message() {
        let error = wasmtime::Error::new(Trap::UnreachableCodeReached);
        let err = guest_trap("tf2lzham_decompress", &error);

        match err {
            CodecError::Trap { message } => assert!(message.starts_with("tf2lzham_decompress: ")),
            other => panic!("expected trap, got {other:?}"),
        }
    }
}
