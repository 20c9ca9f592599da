//! Fuzz target: selector bindings by name
//!
//! Splits the input into slot/value pairs and binds them in order. The
//! selector must never panic, every rejection must name a slot, and the
//! finalized selection must hold the last accepted value for each slot.
//!
//! cargo fuzz run fuzz_selector_names

#![no_main]

use firebase_esp::config::{FeatureSelector, FlashFs, HardwareFamily};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    let mut selector = FeatureSelector::new();
    let mut last_flash = None;

    for line in text.lines() {
        let Some((slot, value)) = line.split_once('=') else {
            continue;
        };
        let result = match slot {
            "flash" => selector.select_local_flash_filesystem(value).map(|_| ()),
            "card" => selector.select_removable_storage_filesystem(value).map(|_| ()),
            module => selector.set_module_enabled(module, value == "on").map(|_| ()),
        };
        match result {
            Ok(()) if slot == "flash" => last_flash = value.parse::<FlashFs>().ok(),
            Ok(()) => {}
            Err(e) => {
                let msg = e.to_string();
                assert!(
                    msg.starts_with("local_flash_fs:")
                        || msg.starts_with("removable_fs:")
                        || msg.starts_with("module:"),
                    "diagnostic must name the slot: {msg}"
                );
            }
        }
    }

    let sel = selector
        .finalize(HardwareFamily::Host)
        .expect("host supports every driver");
    assert_eq!(sel.local_flash, last_flash.unwrap_or(FlashFs::Spiffs));
});
