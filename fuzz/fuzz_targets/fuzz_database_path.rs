//! Fuzz target: `DatabasePath::new`
//!
//! Arbitrary strings must either be rejected or produce a path that
//! re-parses to itself and contains no forbidden key characters.
//!
//! cargo fuzz run fuzz_database_path

#![no_main]

use firebase_esp::rtdb::DatabasePath;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(path) = DatabasePath::new(&text) {
        let rendered = path.to_string();
        assert!(!rendered.contains(['.', '$', '#', '[', ']']));
        assert_eq!(DatabasePath::new(&rendered).ok(), Some(path.clone()));
        assert!(path.depth() <= 32);
        let _ = path.encoded();
    }
});
