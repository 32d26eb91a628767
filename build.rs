//! Link configuration for the `native` feature.
//!
//! `VSHIP_LIB_DIR` adds a search path for `libvship` when it is not installed
//! in a default linker location.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=VSHIP_LIB_DIR");
    println!("cargo:rerun-if-env-changed=VSHIP_STATIC");

    if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("VSHIP_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }

    let kind = if env::var_os("VSHIP_STATIC").is_some() { "static" } else { "dylib" };
    println!("cargo:rustc-link-lib={kind}=vship");
}
