//! Build script - copies the linker script into the output directory
//! so that the linker can find it at link time.
//!
//! Only the embedded build links against `memory.x`; host builds skip it.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os("CARGO_FEATURE_EMBEDDED").is_none() {
        return;
    }

    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        println!("cargo:warning=OUT_DIR not set, skipping memory.x");
        return;
    };

    // Copy memory.x to OUT_DIR
    if let Err(e) = fs::copy("memory.x", out_dir.join("memory.x")) {
        println!("cargo:warning=failed to copy memory.x: {e}");
        return;
    }

    // Tell cargo to look for linker scripts in OUT_DIR
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
