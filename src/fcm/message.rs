//! Message builder and the legacy HTTP JSON layout.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Most tokens one multicast request may carry.
pub const MAX_REGISTRATION_IDS: usize = 1000;
/// Longest time-to-live the service keeps a message (four weeks).
pub const MAX_TIME_TO_LIVE_SECS: u32 = 2_419_200;

/// Who receives the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Token(String),
    Tokens(Vec<String>),
    Topic(String),
}

impl Target {
    pub fn token(token: &str) -> Result<Self> {
        check_token(token)?;
        Ok(Self::Token(token.to_owned()))
    }

    pub fn tokens<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            return Err(Error::Payload("no registration tokens"));
        }
        if tokens.len() > MAX_REGISTRATION_IDS {
            return Err(Error::Payload("more than 1000 registration tokens"));
        }
        for t in &tokens {
            check_token(t)?;
        }
        Ok(Self::Tokens(tokens))
    }

    /// Topic name, with or without the `/topics/` prefix.
    pub fn topic(name: &str) -> Result<Self> {
        let name = name.strip_prefix("/topics/").unwrap_or(name);
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%'));
        if !valid {
            return Err(Error::Payload("topic must match [A-Za-z0-9-_.~%]+"));
        }
        Ok(Self::Topic(name.to_owned()))
    }
}

fn check_token(token: &str) -> Result<()> {
    if token.is_empty() || token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::Payload("malformed registration token"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

/// The user-visible part of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FcmMessage {
    target: Target,
    notification: Option<Notification>,
    data: Option<Value>,
    priority: Option<Priority>,
    time_to_live: Option<u32>,
}

impl FcmMessage {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            notification: None,
            data: None,
            priority: None,
            time_to_live: None,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn notification(mut self, title: &str, body: &str) -> Self {
        let n = self.notification.get_or_insert_with(Notification::default);
        n.title = Some(title.to_owned());
        n.body = Some(body.to_owned());
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.notification.get_or_insert_with(Notification::default).icon = Some(icon.to_owned());
        self
    }

    pub fn click_action(mut self, action: &str) -> Self {
        self.notification
            .get_or_insert_with(Notification::default)
            .click_action = Some(action.to_owned());
        self
    }

    /// Custom key/value payload; must be a JSON object.
    pub fn data(mut self, data: Value) -> Result<Self> {
        if !data.is_object() {
            return Err(Error::Payload("data must be a JSON object"));
        }
        self.data = Some(data);
        Ok(self)
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn time_to_live(mut self, secs: u32) -> Result<Self> {
        if secs > MAX_TIME_TO_LIVE_SECS {
            return Err(Error::Payload("time_to_live exceeds 2419200 seconds"));
        }
        self.time_to_live = Some(secs);
        Ok(self)
    }

    /// Request body in the legacy HTTP layout.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        if self.notification.is_none() && self.data.is_none() {
            return Err(Error::Payload("message has neither notification nor data"));
        }
        let (to, registration_ids) = match &self.target {
            Target::Token(t) => (Some(t.clone()), None),
            Target::Tokens(ts) => (None, Some(ts.as_slice())),
            Target::Topic(name) => (Some(format!("/topics/{name}")), None),
        };
        let wire = Wire {
            to,
            registration_ids,
            notification: self.notification.as_ref(),
            data: self.data.as_ref(),
            priority: self.priority,
            time_to_live: self.time_to_live,
        };
        serde_json::to_vec(&wire).map_err(|_| Error::Payload("message is not serialisable"))
    }
}

#[derive(Serialize)]
struct Wire<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    registration_ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<&'a Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_to_live: Option<u32>,
}
