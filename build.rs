use std::env;
use std::path::PathBuf;

fn main() {
    // Get the target directory
    let out_dir = env::var("OUT_DIR").unwrap();
    let out_path = PathBuf::from(out_dir);
    let target_dir = out_path.parent().unwrap().parent().unwrap().parent().unwrap();

    // For iOS/macOS targets, link against system frameworks
    let target = env::var("TARGET").unwrap();
    if target.contains("apple") {
        println!("cargo:rustc-link-lib=framework=Foundation");
        println!("cargo:rustc-link-lib=framework=Security");
        println!("cargo:rustc-link-lib=framework=SystemConfiguration");
    }

    // Copy header file to target directory
    let header_src = "include/form_builder_core.h";
    let header_dst = target_dir.join("form_builder_core.h");

    if std::path::Path::new(header_src).exists() {
        if let Err(e) = std::fs::copy(header_src, &header_dst) {
            eprintln!("Warning: Failed to copy header file: {}", e);
        }
        println!("cargo:rerun-if-changed={}", header_src);
    }

    println!("cargo:rerun-if-changed=src/");
}
