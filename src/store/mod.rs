//! Record store boundary.
//!
//! Users and groups are views over a [`RecordStore`]. The store owns the
//! persisted rows; every read hands back an independent copy. Absence is
//! `Ok(None)` (or an empty collection), never an error.
//!
//! [`MemoryStore`] is the in-process implementation used by tests and small
//! deployments; a database-backed store implements the same trait.

mod memory;
mod records;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::secret::Secret;

pub use memory::MemoryStore;
pub use records::{GroupKind, GroupRecord, RecordId, UserRecord, UserStatus};

/// Field-match criteria for [`RecordStore::find_user`].
///
/// Unset fields match anything.
///
/// ```
/// use sitekit::store::{UserCriteria, UserRecord, UserStatus};
///
/// let criteria = UserCriteria::username("admin").with_status(UserStatus::Active);
/// assert!(criteria.matches(&UserRecord::new(1, "admin")));
/// assert!(!criteria.matches(&UserRecord::new(2, "user")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserCriteria {
    /// Required login name.
    pub username: Option<String>,
    /// Required e-mail address.
    pub email: Option<String>,
    /// Required account status.
    pub status: Option<UserStatus>,
}

impl UserCriteria {
    /// Matches every record.
    pub fn any() -> Self {
        Self::default()
    }

    /// Matches by login name.
    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// Matches by e-mail address.
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    /// Additionally requires `status`.
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if `record` satisfies every set field.
    pub fn matches(&self, record: &UserRecord) -> bool {
        self.username.as_ref().map_or(true, |u| *u == record.username)
            && self.email.as_ref().map_or(true, |e| *e == record.email)
            && self.status.map_or(true, |s| s == record.status)
    }
}

/// A single-field write applied without touching the rest of the record.
#[derive(Debug, Clone)]
pub enum UserUpdate {
    /// Replace the password digest.
    Password(Secret<String>),
    /// Record the last time the user was seen.
    LastSeen(DateTime<Utc>),
}

/// Operations sitekit needs from a persistent store.
pub trait RecordStore {
    /// Fetches a user by primary key.
    fn user(&self, id: RecordId) -> Result<Option<UserRecord>, StoreError>;

    /// Fetches the first user (lowest id) matching `criteria`.
    fn find_user(&self, criteria: &UserCriteria) -> Result<Option<UserRecord>, StoreError>;

    /// Inserts or replaces the user with `record.id`.
    fn save_user(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Applies a targeted update to an existing user.
    fn update_user(&self, id: RecordId, update: UserUpdate) -> Result<(), StoreError>;

    /// Groups `user_id` belongs to, directly or through subgroup edges,
    /// ordered by group name.
    fn memberships(&self, user_id: RecordId) -> Result<Vec<GroupRecord>, StoreError>;

    /// Fetches a group by primary key.
    fn group(&self, id: RecordId) -> Result<Option<GroupRecord>, StoreError>;

    /// Fetches a group by name.
    fn find_group(&self, name: &str) -> Result<Option<GroupRecord>, StoreError>;

    /// Ids of users directly in `group_id`.
    fn member_ids(&self, group_id: RecordId) -> Result<BTreeSet<RecordId>, StoreError>;

    /// Adds a membership edge. Returns false if it already existed.
    fn add_member(&self, group_id: RecordId, user_id: RecordId) -> Result<bool, StoreError>;

    /// Ids of groups nested directly inside `group_id`.
    fn subgroup_ids(&self, group_id: RecordId) -> Result<BTreeSet<RecordId>, StoreError>;

    /// Groups that directly contain `subgroup_id`.
    fn supergroups(&self, subgroup_id: RecordId) -> Result<Vec<GroupRecord>, StoreError>;

    /// Nests `subgroup_id` inside `group_id`.
    fn add_subgroup(&self, group_id: RecordId, subgroup_id: RecordId) -> Result<(), StoreError>;

    /// Removes a nesting edge; missing edges are ignored.
    fn remove_subgroup(&self, group_id: RecordId, subgroup_id: RecordId)
        -> Result<(), StoreError>;
}
