//! Realtime Database client against the scripted transport.

use firebase_esp::Error;
use firebase_esp::config::{ClientConfig, FlashFs, HardwareFamily, RemovableFs, StorageConfig};
use firebase_esp::rtdb::{DatabasePath, Rtdb};
use firebase_esp::storage::sim::{SimBoard, SimFs};
use firebase_esp::storage::{FileSystem, StorageError};
use firebase_esp::transport::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::mock_transport::MockTransport;

const DB: &str = "https://demo-default-rtdb.firebaseio.com";

fn config() -> ClientConfig {
    ClientConfig {
        database_url: format!("{DB}/"),
        database_auth: Some("id-token".into()),
        ..ClientConfig::default()
    }
}

fn path(p: &str) -> DatabasePath {
    DatabasePath::new(p).unwrap()
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Reading {
    celsius: f32,
    humidity: u8,
}

#[test]
fn set_then_get_as() {
    let transport = MockTransport::new()
        .reply(200, r#"{"celsius":21.5,"humidity":40}"#)
        .reply(200, r#"{"celsius":21.5,"humidity":40}"#);
    let mut db = Rtdb::new(transport, &config()).unwrap();

    let reading = Reading {
        celsius: 21.5,
        humidity: 40,
    };
    db.set(&path("/sensors/kitchen"), &reading).unwrap();
    let back: Reading = db.get_as(&path("/sensors/kitchen")).unwrap();
    assert_eq!(back, reading);

    let t = db.into_transport();
    assert_eq!(t.methods(), vec![Method::Put, Method::Get]);
    assert_eq!(
        t.requests[0].url,
        format!("{DB}/sensors/kitchen.json?auth=id-token")
    );
    assert!(t.requests[0]
        .headers
        .contains(&("Content-Type", "application/json".to_string())));
}

#[test]
fn set_silent_adds_print_silent() {
    let mut db = Rtdb::new(MockTransport::new().reply(204, ""), &config()).unwrap();
    db.set_silent(&path("flags/led"), &true).unwrap();
    let t = db.into_transport();
    assert!(t.last().url.ends_with("flags/led.json?auth=id-token&print=silent"));
    assert_eq!(t.last_body_json(), json!(true));
}

#[test]
fn push_returns_generated_key() {
    let mut db = Rtdb::new(
        MockTransport::new().reply(200, r#"{"name":"-Nabc123"}"#),
        &config(),
    )
    .unwrap();
    let key = db.push(&path("logs"), &json!({"msg": "boot"})).unwrap();
    assert_eq!(key, "-Nabc123");
    assert_eq!(db.into_transport().last().method, Method::Post);
}

#[test]
fn push_reply_without_name_is_payload_error() {
    let mut db = Rtdb::new(MockTransport::new().reply(200, "{}"), &config()).unwrap();
    assert!(matches!(
        db.push(&path("logs"), &1),
        Err(Error::Payload(_))
    ));
}

#[test]
fn update_uses_patch() {
    let mut db = Rtdb::new(MockTransport::new().reply(200, r#"{"a":1}"#), &config()).unwrap();
    db.update(&path("cfg"), &json!({"a": 1})).unwrap();
    let t = db.into_transport();
    assert_eq!(t.last().method, Method::Patch);
    assert_eq!(t.last_body_json(), json!({"a": 1}));
}

#[test]
fn delete_and_http_errors() {
    let transport = MockTransport::new().reply(200, "null").reply(401, r#"{"error":"Permission denied"}"#);
    let mut db = Rtdb::new(transport, &config()).unwrap();
    db.delete(&path("old")).unwrap();
    assert_eq!(db.delete(&path("locked")), Err(Error::Http(401)));
}

#[test]
fn transport_failure_surfaces_as_error() {
    let mut db = Rtdb::new(MockTransport::new().fail(), &config()).unwrap();
    assert_eq!(db.get(&path("x")), Err(Error::Transport));
}

#[test]
fn backup_to_flash_and_restore_from_it() {
    let export = r#"{"a":{".value":1,".priority":2}}"#;
    let transport = MockTransport::new().reply(200, export).reply(204, "");
    let mut db = Rtdb::new(transport, &config()).unwrap();

    let board = SimBoard::for_family(HardwareFamily::Esp32);
    let mut flash = SimFs::mount_flash(&board, FlashFs::LittleFs, &StorageConfig::default()).unwrap();

    let written = db.backup(&path("/"), &mut flash, "/backup.json").unwrap();
    assert_eq!(written, export.len());
    assert_eq!(flash.read("/backup.json").unwrap(), export.as_bytes());

    db.restore(&path("/"), &flash, "/backup.json").unwrap();

    let t = db.into_transport();
    assert_eq!(t.requests[0].url, format!("{DB}/.json?auth=id-token&format=export"));
    assert_eq!(t.requests[1].method, Method::Put);
    assert_eq!(t.requests[1].body.as_deref(), Some(export.as_bytes()));
}

#[test]
fn backup_to_card_fails_cleanly_when_card_cannot_mount() {
    let board = SimBoard::for_family(HardwareFamily::Esp32S2);
    let card = SimFs::mount_removable(&board, RemovableFs::SdMmc, &StorageConfig::default());
    assert_eq!(card.unwrap_err(), StorageError::BusUnavailable);
}

#[test]
fn backup_to_sd_card() {
    let transport = MockTransport::new().reply(200, r#"{"k":"v"}"#);
    let mut db = Rtdb::new(transport, &config()).unwrap();
    let board = SimBoard::for_family(HardwareFamily::Esp32S3);
    let mut card =
        SimFs::mount_removable(&board, RemovableFs::SdMmc, &StorageConfig::default()).unwrap();
    db.backup(&path("settings"), &mut card, "/settings.json").unwrap();
    assert!(card.exists("/settings.json"));
}

#[test]
fn backup_refuses_non_json_reply() {
    let transport = MockTransport::new().reply(200, "<html>oops</html>");
    let mut db = Rtdb::new(transport, &config()).unwrap();
    let board = SimBoard::for_family(HardwareFamily::Esp32);
    let mut flash = SimFs::mount_flash(&board, FlashFs::Spiffs, &StorageConfig::default()).unwrap();
    flash.write("/b.json", b"{\"good\":1}").unwrap();

    assert!(matches!(
        db.backup(&path("/"), &mut flash, "/b.json"),
        Err(Error::Payload(_))
    ));
    assert_eq!(flash.read("/b.json").unwrap(), b"{\"good\":1}");
}

#[test]
fn restore_missing_file_sends_nothing() {
    let mut db = Rtdb::new(MockTransport::new(), &config()).unwrap();
    let board = SimBoard::for_family(HardwareFamily::Esp8266);
    let flash = SimFs::mount_flash(&board, FlashFs::Spiffs, &StorageConfig::default()).unwrap();
    assert_eq!(
        db.restore(&path("/"), &flash, "/none.json"),
        Err(Error::Storage(StorageError::NotFound))
    );
    assert!(db.into_transport().requests.is_empty());
}
