//! Module toggles: a disabled module has no entry points, an enabled one does.
//!
//! The "absent" half of the contract (the paths do not resolve) is checked by
//! the `compile_fail` doctests in the crate docs. The tests here check the
//! resolved configuration agrees with what was compiled.

use firebase_esp::config::{Module, RESOLVED};

#[test]
fn resolved_toggles_follow_features() {
    assert_eq!(RESOLVED.module_enabled(Module::Rtdb), cfg!(feature = "rtdb"));
    assert_eq!(RESOLVED.module_enabled(Module::Fcm), cfg!(feature = "fcm"));
}

#[cfg(feature = "rtdb")]
#[test]
fn rtdb_entry_points_present() {
    use firebase_esp::config::ClientConfig;
    use firebase_esp::rtdb::{DatabasePath, Rtdb};

    use crate::mock_transport::MockTransport;

    let cfg = ClientConfig {
        database_url: "https://demo.firebaseio.com".into(),
        ..ClientConfig::default()
    };
    let mut db = Rtdb::new(MockTransport::new().reply(200, "1"), &cfg).unwrap();
    assert_eq!(db.get(&DatabasePath::new("n").unwrap()).unwrap(), serde_json::json!(1));
}

#[cfg(not(feature = "rtdb"))]
#[test]
fn rtdb_compiled_out() {
    assert!(!RESOLVED.rtdb);
}

#[cfg(feature = "fcm")]
#[test]
fn fcm_entry_points_present() {
    use firebase_esp::fcm::{FcmMessage, Target};

    let msg = FcmMessage::new(Target::topic("news").unwrap()).notification("t", "b");
    assert!(msg.to_json().is_ok());
}

#[cfg(not(feature = "fcm"))]
#[test]
fn fcm_compiled_out() {
    assert!(!RESOLVED.fcm);
}

#[test]
fn default_feature_set_is_the_documented_baseline() {
    if cfg!(all(
        feature = "rtdb",
        feature = "fcm",
        not(any(feature = "flash-littlefs", feature = "flash-fatfs", feature = "sd-mmc"))
    )) {
        use firebase_esp::config::Selection;
        assert_eq!(RESOLVED, Selection::baseline(RESOLVED.family));
    }
}
