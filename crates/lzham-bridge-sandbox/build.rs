// build.rs

use std::env;
use std::path::PathBuf;

/// Path to a `tf2lzham.wasm` to embed in the crate.
const MODULE_VAR: &str = "LZHAM_BRIDGE_WASM_MODULE";

fn main() {
    println!("cargo:rerun-if-env-changed={MODULE_VAR}");
    println!("cargo::rustc-check-cfg=cfg(embedded_module)");

    let Some(path) = env::var_os(MODULE_VAR) else {
        return;
    };

    let path = PathBuf::from(path);
    let path = if path.is_relative() {
        let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_default();
        PathBuf::from(manifest_dir).join(path)
    } else {
        path
    };

    if !path.is_file() {
        println!(
            "cargo:warning={MODULE_VAR} points at {}, which is not a file; building without an embedded module",
            path.display()
        );
        return;
    }

    println!("cargo:rerun-if-changed={}", path.display());
    println!("cargo:rustc-cfg=embedded_module");
    println!("cargo:rustc-env=LZHAM_BRIDGE_EMBEDDED_MODULE={}", path.display());
}
