//! Per-call guest context and store management.
//!
//! Every codec call gets its own [`Store`] holding a [`GuestContext`]. The
//! store owns the instance's linear memory, so dropping it releases the
//! guest's entire address space.

use uuid::Uuid;
use wasmtime::{Store, StoreLimits, StoreLimitsBuilder};
use wasmtime_wasi::WasiCtxBuilder;
use wasmtime_wasi::preview1::WasiP1Ctx;

use crate::SandboxEngine;

/// Per-call execution context.
///
/// # Contents
///
/// - `wasi`: WASI preview1 context backing the guest's system-interface imports
/// - `limits`: Memory cap enforced on the guest's linear memory
/// - `call_id`: Unique identifier for tracing
pub struct GuestContext {
    wasi: WasiP1Ctx,

    limits: StoreLimits,

    /// Unique call identifier for tracing.
    pub call_id: Uuid,
}

impl GuestContext {
    /// Create a new context.
    ///
    /// The guest gets no arguments, environment, or preopened directories.
    /// Its stdio is discarded unless `inherit_stdio` is set.
    pub fn new(max_memory_bytes: usize, inherit_stdio: bool) -> Self {
        let mut builder = WasiCtxBuilder::new();
        if inherit_stdio {
            builder.inherit_stdout().inherit_stderr();
        }

        let limits = StoreLimitsBuilder::new()
            .memory_size(max_memory_bytes)
            .instances(1)
            .build();

        Self {
            wasi: builder.build_p1(),
            limits,
            call_id: Uuid::new_v4(),
        }
    }

    /// Get the WASI preview1 context.
    pub fn wasi_mut(&mut self) -> &mut WasiP1Ctx {
        &mut self.wasi
    }
}

/// Create a new Wasmtime store for one call.
///
/// The store's memory limit comes from the engine's [`SandboxConfig`].
///
/// [`SandboxConfig`]: lzham_bridge_common::SandboxConfig
pub fn create_store(engine: &SandboxEngine) -> Store<GuestContext> {
    let config = engine.config();
    let context = GuestContext::new(config.max_memory_bytes(), config.inherit_stdio);

    let mut store = Store::new(engine.inner(), context);
    store.limiter(|ctx| &mut ctx.limits);
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use lzham_bridge_common::SandboxConfig;

    #[test]
    fn test_guest_context_creation() {
        let a = GuestContext::new(1024 * 1024, false);
        let b = GuestContext::new(1024 * 1024, false);

        assert_ne!(a.call_id, b.call_id);
    }

    #[test]
    fn test_store_creation() {
        let engine = SandboxEngine::new(&SandboxConfig::default()).unwrap();

        let store = create_store(&engine);
        assert!(!store.data().call_id.is_nil());
    }
}
