//! JSON framing for login attempts and server replies.
//!
//! A request is `{"login": ..., "password": ...}`; a reply is
//! `{"result": ...}` where the result text is compared verbatim against the
//! configured sentinels.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single login attempt. `password` is empty when only probing logins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl LoginAttempt {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    pub fn login_only(login: impl Into<String>) -> Self {
        Self::new(login, "")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginReply {
    pub result: String,
}

pub fn encode(login: &str, password: &str) -> Result<String> {
    Ok(serde_json::to_string(&LoginAttempt::new(login, password))?)
}

/// Returns the `result` value of a reply. Fails on malformed JSON or a
/// missing `result` key.
pub fn decode(blob: &str) -> Result<String> {
    let reply: LoginReply = serde_json::from_str(blob)?;
    Ok(reply.result)
}
