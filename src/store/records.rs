use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::secret::Secret;

/// Primary key of a stored record.
pub type RecordId = i64;

/// Account status as persisted by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    /// May sign in.
    #[default]
    #[serde(rename = "A")]
    Active,
    /// Disabled account.
    #[serde(rename = "I")]
    Inactive,
}

impl UserStatus {
    /// Single-letter code stored in the record.
    pub fn code(self) -> &'static str {
        match self {
            UserStatus::Active => "A",
            UserStatus::Inactive => "I",
        }
    }
}

/// A user row as the store keeps it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Primary key
    pub id: RecordId,
    /// Login name, unique
    pub username: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// E-mail address
    #[serde(default)]
    pub email: String,
    /// Argon2 PHC digest; empty when no password was ever set
    #[serde(default)]
    pub password: Secret<String>,
    /// Account status
    #[serde(default)]
    pub status: UserStatus,
    /// Last time the user made a request
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// A new active record with no password.
    pub fn new(id: RecordId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: Secret::default(),
            status: UserStatus::Active,
            last_seen: None,
        }
    }

    /// Sets first and last name.
    pub fn named(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }
}

/// What a group grants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    /// A group of users (also usable as a role).
    #[default]
    #[serde(rename = "U")]
    User,
    /// Access to an application.
    #[serde(rename = "A")]
    App,
}

/// A group row as the store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Primary key
    pub id: RecordId,
    /// Group name, unique
    pub name: String,
    /// User group or app group
    #[serde(default)]
    pub kind: GroupKind,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Group whose members administer this one
    #[serde(default)]
    pub admin_group_id: Option<RecordId>,
}

impl GroupRecord {
    /// A user group with no description.
    pub fn new(id: RecordId, name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            description: String::new(),
            admin_group_id: None,
        }
    }
}
