//! Host import registration for the guest module.
//!
//! The codec is built with a WASI toolchain, so the module imports a handful
//! of `wasi_snapshot_preview1` functions (stdio, `proc_exit`, clocks). They
//! are served from the per-call [`GuestContext`], which grants the guest no
//! filesystem, network, or environment access.

use tracing::debug;
use wasmtime::{InstancePre, Linker};

use lzham_bridge_common::CodecError;

use crate::store::GuestContext;
use crate::{CompiledModule, SandboxEngine};

/// Create a linker with every host import the guest may need.
pub fn create_linker(engine: &SandboxEngine) -> Result<Linker<GuestContext>, CodecError> {
    let mut linker = Linker::new(engine.inner());
    register_wasi(&mut linker)?;
    Ok(linker)
}

/// Register the WASI preview1 shims.
pub fn register_wasi(linker: &mut Linker<GuestContext>) -> Result<(), CodecError> {
    wasmtime_wasi::preview1::add_to_linker_sync(linker, GuestContext::wasi_mut).map_err(|e| {
        CodecError::compilation(format!("Failed to register WASI preview1 imports: {e}"))
    })
}

/// Resolve the module's imports once so each call only has to instantiate.
///
/// # Errors
///
/// Returns [`CodecError::Compilation`] if the module imports anything the
/// linker does not provide.
pub fn prelink(
    linker: &Linker<GuestContext>,
    module: &CompiledModule,
) -> Result<InstancePre<GuestContext>, CodecError> {
    let pre = linker.instantiate_pre(module.inner()).map_err(|e| {
        CodecError::compilation(format!("Failed to link guest module imports: {e}"))
    })?;

    debug!(
        content_hash = %module.content_hash(),
        imports = module.inner().imports().len(),
        "Guest module pre-linked"
    );

    Ok(pre)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lzham_bridge_common::SandboxConfig;

    fn engine() -> SandboxEngine {
        SandboxEngine::new(&SandboxConfig::default()).unwrap()
    }

    #[test]
    fn test_create_linker() {
        assert!(create_linker(&engine()).is_ok());
    }

    #[test]
    fn test_prelink_wasi_import() {
        let engine = engine();
        let linker = create_linker(&engine).unwrap();
        let module = CompiledModule::from_wat(
            engine.inner(),
            r#"(module (import "wasi_snapshot_preview1" "proc_exit" (func (param i32))))"#,
        )
        .unwrap();

        assert!(prelink(&linker, &module).is_ok());
    }

    #[test]
    fn test_prelink_unknown_import() {
        let engine = engine();
        let linker = create_linker(&engine).unwrap();
        let module = CompiledModule::from_wat(
            engine.inner(),
            r#"(module (import "env" "missing" (func)))"#,
        )
        .unwrap();

        let result = prelink(&linker, &module);
        assert!(matches!(result, Err(CodecError::Compilation { .. })));
    }
}
