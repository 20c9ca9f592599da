//! Cloud Messaging sender against the scripted transport.

use firebase_esp::Error;
use firebase_esp::config::ClientConfig;
use firebase_esp::fcm::{FcmMessage, Messaging, Priority, SEND_URL, Target};
use firebase_esp::transport::Method;
use serde_json::json;

use crate::mock_transport::MockTransport;

fn config() -> ClientConfig {
    ClientConfig {
        fcm_server_key: Some("AAAA-server-key".into()),
        ..ClientConfig::default()
    }
}

#[test]
fn send_to_token() {
    let transport = MockTransport::new().reply(
        200,
        r#"{"multicast_id":7,"success":1,"failure":0,"canonical_ids":0,"results":[{"message_id":"0:99"}]}"#,
    );
    let mut fcm = Messaging::new(transport, &config()).unwrap();
    let msg = FcmMessage::new(Target::token("device-token").unwrap())
        .notification("Leak", "Water detected")
        .priority(Priority::High);

    let report = fcm.send(&msg).unwrap();
    assert_eq!(report.success, 1);
    assert_eq!(report.message_id.as_deref(), Some("0:99"));

    let t = fcm.into_transport();
    let req = t.last();
    assert_eq!(req.method, Method::Post);
    assert_eq!(req.url, SEND_URL);
    assert!(req.headers.contains(&("Authorization", "key=AAAA-server-key".to_string())));
    assert_eq!(
        t.last_body_json(),
        json!({
            "to": "device-token",
            "notification": {"title": "Leak", "body": "Water detected"},
            "priority": "high"
        })
    );
}

#[test]
fn multicast_partial_failure() {
    let transport = MockTransport::new().reply(
        200,
        r#"{"multicast_id":7,"success":1,"failure":1,"results":[{"message_id":"0:1"},{"error":"InvalidRegistration"}]}"#,
    );
    let mut fcm = Messaging::new(transport, &config()).unwrap();
    let msg = FcmMessage::new(Target::tokens(["a", "b"]).unwrap())
        .data(json!({"k": "v"}))
        .unwrap();
    let report = fcm.send(&msg).unwrap();
    assert_eq!((report.success, report.failure), (1, 1));
    assert_eq!(report.errors, vec!["InvalidRegistration".to_string()]);
}

#[test]
fn topic_send() {
    let transport = MockTransport::new().reply(200, r#"{"message_id":123}"#);
    let mut fcm = Messaging::new(transport, &config()).unwrap();
    let msg = FcmMessage::new(Target::topic("alerts").unwrap())
        .notification("t", "b")
        .time_to_live(60)
        .unwrap();
    let report = fcm.send(&msg).unwrap();
    assert_eq!(report.message_id.as_deref(), Some("123"));
    let body = fcm.into_transport().last_body_json();
    assert_eq!(body["to"], "/topics/alerts");
    assert_eq!(body["time_to_live"], 60);
}

#[test]
fn bad_server_key_is_http_401() {
    let transport = MockTransport::new().reply(401, "Unauthorized");
    let mut fcm = Messaging::new(transport, &config()).unwrap();
    let msg = FcmMessage::new(Target::token("x").unwrap()).notification("t", "b");
    assert_eq!(fcm.send(&msg), Err(Error::Http(401)));
}

#[test]
fn invalid_message_is_not_sent() {
    let mut fcm = Messaging::new(MockTransport::new(), &config()).unwrap();
    let msg = FcmMessage::new(Target::token("x").unwrap());
    assert!(matches!(fcm.send(&msg), Err(Error::Payload(_))));
    assert!(fcm.into_transport().requests.is_empty());
}
