//! Resolves the storage drivers and optional modules for this build.
//!
//! Inputs are the crate's Cargo features and the target chip. Output is a
//! pair of cfgs (`flash_fs`, `removable_fs`) and `$OUT_DIR/resolved_selection.rs`
//! holding the `RESOLVED` constant. A bad selection stops the build here.

use std::env;
use std::fs;
use std::path::PathBuf;

#[allow(dead_code, unused_imports)]
#[path = "src/config/selection/mod.rs"]
mod selection;

use selection::capability::HardwareFamily;
use selection::{FlashFs, RemovableFs, resolve_features};

fn main() {
    println!("cargo:rerun-if-changed=src/config/selection");
    println!("cargo:rerun-if-env-changed=MCU");

    declare_cfgs();

    let family = target_family();
    let features: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_").map(str::to_ascii_lowercase))
        .collect();

    let selection = match resolve_features(features.iter().map(String::as_str), family) {
        Ok(selection) => selection,
        Err(e) => {
            eprintln!("error: invalid firebase-esp feature selection: {e}");
            std::process::exit(1);
        }
    };

    for (name, value) in selection.cfg_pairs() {
        println!("cargo:rustc-cfg={name}=\"{value}\"");
    }

    let out = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out.join("resolved_selection.rs"), selection.to_rust_source())
        .expect("write resolved_selection.rs");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}

fn declare_cfgs() {
    let flash: Vec<String> = FlashFs::ALL.iter().map(|fs| format!("\"{}\"", fs.name())).collect();
    let removable: Vec<String> = RemovableFs::ALL
        .iter()
        .map(|fs| format!("\"{}\"", fs.name()))
        .collect();
    println!("cargo:rustc-check-cfg=cfg(flash_fs, values({}))", flash.join(", "));
    println!("cargo:rustc-check-cfg=cfg(removable_fs, values({}))", removable.join(", "));
}

/// `MCU` (set by the ESP-IDF tooling) wins over the target triple.
fn target_family() -> HardwareFamily {
    if let Ok(mcu) = env::var("MCU") {
        return mcu.parse::<HardwareFamily>().unwrap_or_else(|()| {
            eprintln!("error: MCU `{mcu}` is not a chip firebase-esp knows");
            std::process::exit(1);
        });
    }
    HardwareFamily::from_target(&env::var("TARGET").unwrap_or_default())
}
