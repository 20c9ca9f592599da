//! Cloud Messaging sender (compiled with the `fcm` feature).
//!
//! Uses the legacy HTTP endpoint with a server key. Token-based auth for the
//! v1 API is out of scope.

pub mod message;

use log::{info, warn};
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, Method, Request, execute};

pub use message::{FcmMessage, Notification, Priority, Target};

pub const SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

/// Outcome of one send.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SendReport {
    /// Message id for single-token and topic sends.
    pub message_id: Option<String>,
    pub success: u32,
    pub failure: u32,
    /// Per-recipient error codes (`NotRegistered`, `InvalidRegistration`, ...).
    pub errors: Vec<String>,
}

pub struct Messaging<T: HttpTransport> {
    transport: T,
    server_key: String,
    timeout_ms: u32,
}

impl<T: HttpTransport> Messaging<T> {
    pub fn new(transport: T, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let server_key = config
            .fcm_server_key
            .clone()
            .ok_or(Error::Config("fcm_server_key is required for fcm"))?;
        Ok(Self {
            transport,
            server_key,
            timeout_ms: config.request_timeout_ms,
        })
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn send(&mut self, message: &FcmMessage) -> Result<SendReport> {
        let request = Request::new(Method::Post, SEND_URL.to_owned(), self.timeout_ms)
            .header("Authorization", format!("key={}", self.server_key))
            .json(message.to_json()?);
        let response = execute(&mut self.transport, &request)?;
        let report = parse_reply(&response.body)?;
        if report.failure > 0 {
            warn!(
                "fcm: {} delivered, {} failed: {:?}",
                report.success, report.failure, report.errors
            );
        } else {
            info!("fcm: {} delivered", report.success);
        }
        Ok(report)
    }
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    success: Option<u32>,
    #[serde(default)]
    failure: Option<u32>,
    #[serde(default)]
    results: Vec<ReplyEntry>,
    #[serde(default)]
    message_id: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ReplyEntry {
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Interpret both reply shapes: per-token (`success`/`failure`/`results`) and
/// topic (`message_id` or `error`).
fn parse_reply(body: &[u8]) -> Result<SendReport> {
    let reply: Reply =
        serde_json::from_slice(body).map_err(|_| Error::Payload("unexpected FCM reply"))?;

    if let (Some(success), Some(failure)) = (reply.success, reply.failure) {
        let message_id = match reply.results.as_slice() {
            [only] => only.message_id.clone(),
            _ => None,
        };
        let errors = reply.results.into_iter().filter_map(|r| r.error).collect();
        return Ok(SendReport {
            message_id,
            success,
            failure,
            errors,
        });
    }

    match (reply.message_id, reply.error) {
        (Some(id), _) => Ok(SendReport {
            message_id: Some(match id {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            success: 1,
            failure: 0,
            errors: Vec::new(),
        }),
        (None, Some(error)) => Ok(SendReport {
            message_id: None,
            success: 0,
            failure: 1,
            errors: vec![error],
        }),
        (None, None) => Err(Error::Payload("unexpected FCM reply")),
    }
}
