//! HTTP transport abstraction.
//!
//! The protocol modules build [`Request`]s and hand them to an
//! [`HttpTransport`]. TLS, connection reuse and timeouts belong to the
//! implementation (on ESP-IDF, an `EspHttpConnection` wrapper), so the
//! modules stay testable on the host with a scripted mock.

use core::fmt;

use log::warn;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout_ms: u32,
}

impl Request {
    pub fn new(method: Method, url: String, timeout_ms: u32) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            timeout_ms,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Attach a JSON body and the matching content type.
    pub fn json(mut self, body: Vec<u8>) -> Self {
        self.headers.push(("Content-Type", "application/json".into()));
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Request/response channel to the backend.
pub trait HttpTransport {
    /// Error type for this transport.
    type Error: fmt::Debug;

    /// Perform one request and return the complete response.
    fn send(&mut self, request: &Request) -> core::result::Result<Response, Self::Error>;
}

/// Send `request`, log transport failures, and reject non-2xx statuses.
pub(crate) fn execute<T: HttpTransport>(transport: &mut T, request: &Request) -> Result<Response> {
    let response = transport.send(request).map_err(|e| {
        warn!("{} {}: transport error {:?}", request.method, redact(&request.url), e);
        Error::Transport
    })?;
    if let Err(e) = Error::check_status(response.status) {
        warn!(
            "{} {}: status {}",
            request.method,
            redact(&request.url),
            response.status
        );
        return Err(e);
    }
    Ok(response)
}

/// Strip credentials from a URL before it is logged.
pub fn redact(url: &str) -> String {
    match url.split_once("auth=") {
        Some((head, tail)) => {
            let rest = tail.find('&').map_or("", |i| &tail[i..]);
            format!("{head}auth=***{rest}")
        }
        None => url.to_owned(),
    }
}
