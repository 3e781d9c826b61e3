//! Build script for PriceGrid.
//!
//! Pattern files under `configs/` are embedded into the binary with rust-embed.
//! Release builds bake the files in at compile time, so any change to the
//! bundle has to trigger a rebuild.

use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=configs");

    let configs_dir = Path::new("configs");
    if !configs_dir.exists() {
        println!("cargo:warning=configs directory not found, embedded pattern bundle will be empty");
    }
}
