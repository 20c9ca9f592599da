//! Scripted HTTP transport for integration tests.
//!
//! Replies are served in order; every request is recorded so tests can
//! assert on method, URL, headers and body.

use std::collections::VecDeque;

use firebase_esp::transport::{HttpTransport, Method, Request, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unreachable;

#[derive(Default)]
pub struct MockTransport {
    replies: VecDeque<Result<Response, Unreachable>>,
    pub requests: Vec<Request>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, status: u16, body: &str) -> Self {
        self.replies.push_back(Ok(Response {
            status,
            body: body.as_bytes().to_vec(),
        }));
        self
    }

    pub fn fail(mut self) -> Self {
        self.replies.push_back(Err(Unreachable));
        self
    }

    pub fn last(&self) -> &Request {
        self.requests.last().expect("no request was sent")
    }

    pub fn last_body_json(&self) -> serde_json::Value {
        serde_json::from_slice(self.last().body.as_deref().unwrap_or(b"null"))
            .expect("request body is JSON")
    }

    pub fn methods(&self) -> Vec<Method> {
        self.requests.iter().map(|r| r.method).collect()
    }
}

impl HttpTransport for MockTransport {
    type Error = Unreachable;

    fn send(&mut self, request: &Request) -> Result<Response, Unreachable> {
        self.requests.push(request.clone());
        self.replies.pop_front().unwrap_or(Err(Unreachable))
    }
}
