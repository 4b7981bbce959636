//! Groups, their members, and group nesting.
//!
//! A group of kind [`GroupKind::User`] collects users and may be nested in
//! other user groups ("roles"). A group of kind [`GroupKind::App`] grants
//! access to an application to every group nested inside it.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::policy::Allows;
use crate::store::{GroupKind, GroupRecord, RecordId, RecordStore};
use crate::users::User;

/// Groups every site relies on; they may not be deleted.
pub const SYSTEM_GROUPS: [&str; 5] = ["administrators", "everyone", "guests", "managers", "users"];

/// A group view over the store.
#[derive(Clone)]
pub struct Group {
    record: GroupRecord,
    store: Rc<dyn RecordStore>,
}

impl Group {
    /// Primary key.
    pub fn id(&self) -> RecordId {
        self.record.id
    }

    /// Unique group name.
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Whether this is a user group or an app group.
    pub fn kind(&self) -> GroupKind {
        self.record.kind
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        &self.record.description
    }

    /// URL-friendly key.
    pub fn key(&self) -> String {
        self.record.id.to_string()
    }

    /// Returns true for the built-in groups in [`SYSTEM_GROUPS`].
    pub fn is_system(&self) -> bool {
        SYSTEM_GROUPS.contains(&self.record.name.as_str())
    }

    /// Ids of users directly in this group.
    pub fn user_ids(&self) -> Result<BTreeSet<RecordId>> {
        Ok(self.store.member_ids(self.record.id)?)
    }

    /// Adds `user` to this group; adding an existing member is a no-op.
    pub fn add_user(&self, user: &User) -> Result<()> {
        if self.store.add_member(self.record.id, user.id())? {
            tracing::info!(group = %self.record.name, user = %user.username(), "user added to group");
        }
        Ok(())
    }

    /// Ids of user groups nested in this one. App groups have none.
    pub fn subgroups(&self) -> Result<BTreeSet<RecordId>> {
        if self.record.kind != GroupKind::User {
            return Ok(BTreeSet::new());
        }
        Ok(self.store.subgroup_ids(self.record.id)?)
    }

    /// Ids of user groups this group is nested in.
    pub fn roles(&self) -> Result<BTreeSet<RecordId>> {
        self.supergroups_of_kind(GroupKind::User)
    }

    /// Ids of app groups this group grants access to.
    pub fn apps(&self) -> Result<BTreeSet<RecordId>> {
        self.supergroups_of_kind(GroupKind::App)
    }

    fn supergroups_of_kind(&self, kind: GroupKind) -> Result<BTreeSet<RecordId>> {
        Ok(self
            .store
            .supergroups(self.record.id)?
            .into_iter()
            .filter(|g| g.kind == kind)
            .map(|g| g.id)
            .collect())
    }

    /// Nests `subgroup` inside this group.
    pub fn add_subgroup(&self, subgroup: &Group) -> Result<()> {
        self.store.add_subgroup(self.record.id, subgroup.id())?;
        tracing::info!(group = %self.record.name, subgroup = %subgroup.name(), "add subgroup");
        Ok(())
    }

    /// Removes `subgroup` from this group.
    pub fn remove_subgroup(&self, subgroup: &Group) -> Result<()> {
        self.store.remove_subgroup(self.record.id, subgroup.id())?;
        tracing::info!(group = %self.record.name, subgroup = %subgroup.name(), "remove subgroup");
        Ok(())
    }

    /// Name of the group that administers this one, or `"nothing"`.
    pub fn administrators(&self) -> Result<String> {
        let admin = match self.record.admin_group_id {
            Some(id) => self.store.group(id)?,
            None => None,
        };
        Ok(admin.map_or_else(|| "nothing".to_string(), |g| g.name))
    }
}

impl Allows for Group {
    /// System groups can't be deleted; everything else is allowed.
    fn allows(&self, _user: &User, action: &str) -> bool {
        !self.is_system() || action != "delete"
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

/// How to find a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupLocator<'a> {
    /// By primary key.
    Id(RecordId),
    /// By group name.
    Name(&'a str),
}

impl From<RecordId> for GroupLocator<'_> {
    fn from(id: RecordId) -> Self {
        GroupLocator::Id(id)
    }
}

impl<'a> From<&'a str> for GroupLocator<'a> {
    fn from(name: &'a str) -> Self {
        GroupLocator::Name(name)
    }
}

/// Repository of [`Group`] views.
#[derive(Clone)]
pub struct Groups {
    store: Rc<dyn RecordStore>,
}

impl Groups {
    /// Creates a repository over `store`.
    pub fn new(store: Rc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Fetches a group by id.
    pub fn get(&self, id: RecordId) -> Result<Option<Group>> {
        Ok(self.store.group(id)?.map(|record| self.view(record)))
    }

    /// Fetches a group by name.
    pub fn first(&self, name: &str) -> Result<Option<Group>> {
        Ok(self.store.find_group(name)?.map(|record| self.view(record)))
    }

    /// Finds a group by id or by name.
    ///
    /// ```
    /// use std::rc::Rc;
    /// use sitekit::store::MemoryStore;
    /// use sitekit::groups::Groups;
    ///
    /// let groups = Groups::new(Rc::new(MemoryStore::seeded().unwrap()));
    /// let by_name = groups.locate("users").unwrap().unwrap();
    /// let by_id = groups.locate(by_name.id()).unwrap().unwrap();
    /// assert_eq!(by_id.name(), "users");
    /// ```
    pub fn locate<'a>(&self, locator: impl Into<GroupLocator<'a>>) -> Result<Option<Group>> {
        match locator.into() {
            GroupLocator::Id(id) => self.get(id),
            GroupLocator::Name(name) => self.first(name),
        }
    }

    fn view(&self, record: GroupRecord) -> Group {
        Group {
            record,
            store: Rc::clone(&self.store),
        }
    }
}

impl fmt::Debug for Groups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Groups").finish_non_exhaustive()
    }
}
