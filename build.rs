use std::{env, fs, path::PathBuf};

// Place settings.json next to the built binary so `cargo run` finds it.
fn main() {
    println!("cargo:rerun-if-changed=settings.json");

    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        return;
    };
    let Some(target_dir) = out_dir.ancestors().nth(3) else {
        return;
    };

    if let Err(e) = fs::copy("settings.json", target_dir.join("settings.json")) {
        println!("cargo:warning=settings.json not copied: {e}");
    }
}
