// build.rs

use std::env;

const LIB_DIR_VAR: &str = "LZHAM_BRIDGE_NATIVE_LIB_DIR";
const STATIC_VAR: &str = "LZHAM_BRIDGE_NATIVE_STATIC";

fn main() {
    println!("cargo:rerun-if-env-changed={LIB_DIR_VAR}");
    println!("cargo:rerun-if-env-changed={STATIC_VAR}");

    if env::var_os("CARGO_FEATURE_LINK").is_none() {
        return;
    }

    if let Some(dir) = env::var_os(LIB_DIR_VAR) {
        println!(
            "cargo:rustc-link-search=native={}",
            std::path::Path::new(&dir).display()
        );
    }

    // A static archive pulls in the C++ runtime the codec was built against.
    if env::var_os(STATIC_VAR).is_some() {
        println!("cargo:rustc-link-lib=static=tf2lzham");
        let target = env::var("TARGET").unwrap_or_default();
        if target.contains("apple") {
            println!("cargo:rustc-link-lib=dylib=c++");
        } else if !target.contains("msvc") {
            println!("cargo:rustc-link-lib=dylib=stdc++");
        }
    } else {
        println!("cargo:rustc-link-lib=dylib=tf2lzham");
    }
}
