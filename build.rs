// build.rs

use chrono::Utc;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let Ok(out_dir) = env::var("OUT_DIR") else {
        panic!("OUT_DIR is not set by cargo");
    };
    let dest_path = Path::new(&out_dir).join("build_info.rs");

    let now = Utc::now();
    let build_date = now.format("%Y-%m-%d %H:%M:%S UTC").to_string();

    // BUILD_DATE and PKG_VERSION land in the boot message
    let contents = format!(
        "pub const BUILD_DATE: &str = \"{}\";\npub const PKG_VERSION: &str = \"{}\";\n",
        build_date,
        env::var("CARGO_PKG_VERSION").unwrap_or_default(),
    );
    if let Err(e) = fs::write(&dest_path, contents) {
        panic!("failed to write {}: {}", dest_path.display(), e);
    }

    println!("cargo:rerun-if-changed=build.rs");
}
