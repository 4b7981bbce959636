//! Visitor session state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-visitor state restored by the session layer before the request runs.
///
/// sitekit only reads `username`; the remaining values are carried for the
/// application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Username recorded at sign-in.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, flatten)]
    values: BTreeMap<String, serde_json::Value>,
}

impl Session {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session belonging to `username`.
    pub fn signed_in(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// The signed-in username, ignoring blanks.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_username_is_absent() {
        let session = Session::signed_in("");
        assert_eq!(session.username(), None);
        assert_eq!(Session::signed_in("pat").username(), Some("pat"));
    }

    #[test]
    fn values_flatten_next_to_username() {
        let mut session = Session::signed_in("pat");
        session.insert("theme", "dark");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["username"], "pat");
        assert_eq!(json["theme"], "dark");

        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
        assert_eq!(back.get("theme"), Some(&serde_json::json!("dark")));
    }
}
