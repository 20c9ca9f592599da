//! Validated Realtime Database paths.

use core::fmt;

use crate::error::{Error, Result};

/// Deepest node the database accepts.
pub const MAX_DEPTH: usize = 32;
/// Longest key, in UTF-8 bytes.
pub const MAX_KEY_BYTES: usize = 768;

/// A database location, stored without leading or trailing `/`.
/// The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DatabasePath(String);

impl DatabasePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path. Leading and trailing slashes are ignored.
    pub fn new(path: &str) -> Result<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut depth = 0;
        for key in trimmed.split('/') {
            check_key(key)?;
            depth += 1;
        }
        if depth > MAX_DEPTH {
            return Err(Error::Payload("database path deeper than 32 levels"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Append one key.
    pub fn child(&self, key: &str) -> Result<Self> {
        check_key(key)?;
        if self.depth() + 1 > MAX_DEPTH {
            return Err(Error::Payload("database path deeper than 32 levels"));
        }
        if self.is_root() {
            Ok(Self(key.to_owned()))
        } else {
            Ok(Self(format!("{}/{}", self.0, key)))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        if self.is_root() { 0 } else { self.0.split('/').count() }
    }

    /// Last key, `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.0.rsplit('/').next().filter(|k| !k.is_empty())
    }

    /// Percent-encoded form for a REST URL, without the leading `/`.
    pub fn encoded(&self) -> String {
        self.0
            .split('/')
            .map(|key| urlencoding::encode(key).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for DatabasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::Payload("empty key in database path"));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(Error::Payload("database key longer than 768 bytes"));
    }
    if key
        .chars()
        .any(|c| matches!(c, '.' | '$' | '#' | '[' | ']' | '/') || c.is_control())
    {
        return Err(Error::Payload("database key contains . $ # [ ] / or a control character"));
    }
    Ok(())
}
