//! Guest module bytes embedded at build time.
//!
//! Set `LZHAM_BRIDGE_WASM_MODULE` to the path of a `tf2lzham.wasm` when
//! building to embed it; otherwise the sandbox needs
//! `SandboxConfig::module_path`.

/// The embedded guest module, if the build provided one.
#[cfg(embedded_module)]
pub const MODULE: Option<&[u8]> = Some(include_bytes!(env!("LZHAM_BRIDGE_EMBEDDED_MODULE")));

/// The embedded guest module, if the build provided one.
#[cfg(not(embedded_module))]
pub const MODULE: Option<&[u8]> = None;
