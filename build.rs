use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // Make memory.x visible to the cortex-m-rt link script when building the
    // firmware binary. Harmless for host builds, which never link it.
    let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::copy("memory.x", out.join("memory.x")).unwrap();
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");
}
