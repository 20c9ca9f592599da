//! Realtime Database client (compiled with the `rtdb` feature).
//!
//! REST surface: every node is `<database_url>/<path>.json`, the HTTP method
//! picks the operation and the auth token rides in the `auth=` query
//! parameter.
//!
//! | Call         | Method | Query            | Body                 |
//! |--------------|--------|------------------|----------------------|
//! | `get`        | GET    |                  |                      |
//! | `set`        | PUT    |                  | value                |
//! | `set_silent` | PUT    | `print=silent`   | value                |
//! | `push`       | POST   |                  | value → `{"name"}`   |
//! | `update`     | PATCH  |                  | object               |
//! | `delete`     | DELETE |                  |                      |
//! | `backup`     | GET    | `format=export`  | → file               |
//! | `restore`    | PUT    |                  | file →               |
//!
//! Backups go to whichever [`FileSystem`] the caller passes: the local flash
//! or the removable card the build selected.

pub mod path;

use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::storage::FileSystem;
use crate::transport::{HttpTransport, Method, Request, Response, execute, redact};

pub use path::DatabasePath;

/// Realtime Database handle over a transport.
pub struct Rtdb<T: HttpTransport> {
    transport: T,
    root: String,
    auth: Option<String>,
    timeout_ms: u32,
}

impl<T: HttpTransport> Rtdb<T> {
    pub fn new(transport: T, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        if config.database_url.is_empty() {
            return Err(Error::Config("database_url is required for rtdb"));
        }
        Ok(Self {
            transport,
            root: config.database_root().to_owned(),
            auth: config.database_auth.clone(),
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Hand the transport back.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Read the value at `path` (JSON `null` if absent).
    pub fn get(&mut self, path: &DatabasePath) -> Result<Value> {
        let resp = self.call(Method::Get, path, &[], None)?;
        parse_json(&resp.body)
    }

    /// Read and deserialise the value at `path`.
    pub fn get_as<V: DeserializeOwned>(&mut self, path: &DatabasePath) -> Result<V> {
        let resp = self.call(Method::Get, path, &[], None)?;
        serde_json::from_slice(&resp.body).map_err(|_| Error::Payload("unexpected value shape"))
    }

    /// Replace the value at `path`; returns what the server stored.
    pub fn set<V: Serialize + ?Sized>(&mut self, path: &DatabasePath, value: &V) -> Result<Value> {
        let body = to_body(value)?;
        let resp = self.call(Method::Put, path, &[], Some(body))?;
        parse_json(&resp.body)
    }

    /// Replace the value at `path` without echoing it back.
    pub fn set_silent<V: Serialize + ?Sized>(&mut self, path: &DatabasePath, value: &V) -> Result<()> {
        let body = to_body(value)?;
        self.call(Method::Put, path, &["print=silent"], Some(body))?;
        Ok(())
    }

    /// Append under `path` with a server-generated key; returns the key.
    pub fn push<V: Serialize + ?Sized>(&mut self, path: &DatabasePath, value: &V) -> Result<String> {
        let body = to_body(value)?;
        let resp = self.call(Method::Post, path, &[], Some(body))?;
        match parse_json(&resp.body)? {
            Value::Object(mut obj) => match obj.remove("name") {
                Some(Value::String(name)) => Ok(name),
                _ => Err(Error::Payload("push reply has no name")),
            },
            _ => Err(Error::Payload("push reply is not an object")),
        }
    }

    /// Merge the children of `fields` into `path`.
    pub fn update(&mut self, path: &DatabasePath, fields: &Value) -> Result<Value> {
        if !fields.is_object() {
            return Err(Error::Payload("update body must be a JSON object"));
        }
        let body = to_body(fields)?;
        let resp = self.call(Method::Patch, path, &[], Some(body))?;
        parse_json(&resp.body)
    }

    pub fn delete(&mut self, path: &DatabasePath) -> Result<()> {
        self.call(Method::Delete, path, &[], None)?;
        Ok(())
    }

    /// Export the subtree at `path` (with priorities) into `file` on `fs`.
    /// Returns the number of bytes written.
    pub fn backup(
        &mut self,
        path: &DatabasePath,
        fs: &mut dyn FileSystem,
        file: &str,
    ) -> Result<usize> {
        let resp = self.call(Method::Get, path, &["format=export"], None)?;
        // Refuse to overwrite a good backup with garbage.
        parse_json(&resp.body)?;
        fs.write(file, &resp.body)?;
        info!(
            "rtdb: backed up {} to {}:{}{} ({} bytes)",
            path,
            fs.driver(),
            fs.mount_point(),
            file,
            resp.body.len()
        );
        Ok(resp.body.len())
    }

    /// Write the contents of `file` on `fs` back to `path`.
    pub fn restore(
        &mut self,
        path: &DatabasePath,
        fs: &dyn FileSystem,
        file: &str,
    ) -> Result<()> {
        let body = fs.read(file)?;
        parse_json(&body)?;
        let len = body.len();
        self.call(Method::Put, path, &["print=silent"], Some(body))?;
        info!(
            "rtdb: restored {} from {}:{}{} ({} bytes)",
            path,
            fs.driver(),
            fs.mount_point(),
            file,
            len
        );
        Ok(())
    }

    fn url(&self, path: &DatabasePath, query: &[&str]) -> String {
        let mut url = format!("{}/{}.json", self.root, path.encoded());
        let mut params: Vec<String> = Vec::with_capacity(query.len() + 1);
        if let Some(auth) = &self.auth {
            params.push(format!("auth={}", urlencoding::encode(auth)));
        }
        params.extend(query.iter().map(|q| (*q).to_owned()));
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }

    fn call(
        &mut self,
        method: Method,
        path: &DatabasePath,
        query: &[&str],
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let mut request = Request::new(method, self.url(path, query), self.timeout_ms);
        if let Some(body) = body {
            request = request.json(body);
        }
        debug!("rtdb: {} {}", method, redact(&request.url));
        execute(&mut self.transport, &request)
    }
}

fn to_body<V: Serialize + ?Sized>(value: &V) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|_| Error::Payload("value is not serialisable"))
}

fn parse_json(body: &[u8]) -> Result<Value> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|_| Error::Payload("reply is not JSON"))
}
