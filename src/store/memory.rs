use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::{
    GroupKind, GroupRecord, RecordId, RecordStore, UserCriteria, UserRecord, UserUpdate,
};
use crate::error::StoreError;
use crate::password::hash_password;

/// In-memory [`RecordStore`].
///
/// Rows live behind a `RefCell`, so a single store can be shared (via `Rc`)
/// by every user and group view of a request.
///
/// # Example
///
/// ```
/// use sitekit::store::{MemoryStore, RecordStore, UserCriteria};
///
/// let store = MemoryStore::seeded().unwrap();
/// let admin = store.find_user(&UserCriteria::username("admin")).unwrap().unwrap();
/// assert_eq!(admin.id, 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<State>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<RecordId, UserRecord>,
    groups: BTreeMap<RecordId, GroupRecord>,
    // (group_id, user_id)
    members: BTreeSet<(RecordId, RecordId)>,
    // (group_id, subgroup_id)
    subgroups: BTreeSet<(RecordId, RecordId)>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the standard site fixture.
    ///
    /// Users: `admin` (1, password `admin`), `user` (2, password `user`),
    /// `guest` (3, no password). User groups: `administrators` (1),
    /// `users` (2), `guests` (3), `everyone` (4, containing `users` and
    /// `guests`), `managers` (5), `developers` (6). App groups: `a_signup`
    /// and `a_passreset` (open to `guests`), `a_admin` (open to
    /// `administrators`), `a_home` (open to `users`).
    pub fn seeded() -> crate::Result<Self> {
        let store = Self::new();

        let mut admin = UserRecord::new(1, "admin").named("Admin", "User");
        admin.email = "admin@testco.com".to_string();
        admin.password = hash_password("admin")?;
        let mut user = UserRecord::new(2, "user").named("User", "Known");
        user.email = "user@testco.com".to_string();
        user.password = hash_password("user")?;
        let guest = UserRecord::new(3, "guest").named("Guest", "User");
        for record in [admin, user, guest] {
            store.insert_user(record);
        }

        let groups = [
            (1, "administrators", GroupKind::User, "System Administrators"),
            (2, "users", GroupKind::User, "Registered Users"),
            (3, "guests", GroupKind::User, "Guest Users"),
            (4, "everyone", GroupKind::User, "All users including guests"),
            (5, "managers", GroupKind::User, "Site content managers"),
            (6, "developers", GroupKind::User, "Site developers"),
            (7, "a_signup", GroupKind::App, "Sign up app"),
            (8, "a_passreset", GroupKind::App, "Password reset app"),
            (9, "a_admin", GroupKind::App, "Administration app"),
            (10, "a_home", GroupKind::App, "Home app"),
        ];
        for (id, name, kind, description) in groups {
            let mut group = GroupRecord::new(id, name, kind);
            group.description = description.to_string();
            group.admin_group_id = Some(1);
            store.insert_group(group);
        }

        {
            let mut state = store.state.borrow_mut();
            state.members.extend([(1, 1), (2, 1), (5, 1), (2, 2), (3, 3)]);
            state
                .subgroups
                .extend([(4, 2), (4, 3), (7, 3), (8, 3), (9, 1), (10, 2)]);
        }

        Ok(store)
    }

    /// Inserts or replaces a user row.
    pub fn insert_user(&self, record: UserRecord) {
        self.state.borrow_mut().users.insert(record.id, record);
    }

    /// Inserts or replaces a group row.
    pub fn insert_group(&self, record: GroupRecord) {
        self.state.borrow_mut().groups.insert(record.id, record);
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.state.borrow().users.len()
    }
}

impl RecordStore for MemoryStore {
    fn user(&self, id: RecordId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.state.borrow().users.get(&id).cloned())
    }

    fn find_user(&self, criteria: &UserCriteria) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .state
            .borrow()
            .users
            .values()
            .find(|record| criteria.matches(record))
            .cloned())
    }

    fn save_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.insert_user(record.clone());
        Ok(())
    }

    fn update_user(&self, id: RecordId, update: UserUpdate) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        let record = state
            .users
            .get_mut(&id)
            .ok_or(StoreError::Missing { entity: "user", id })?;
        match update {
            UserUpdate::Password(digest) => record.password = digest,
            UserUpdate::LastSeen(when) => record.last_seen = Some(when),
        }
        Ok(())
    }

    fn memberships(&self, user_id: RecordId) -> Result<Vec<GroupRecord>, StoreError> {
        let state = self.state.borrow();

        let mut pending: Vec<RecordId> = state
            .members
            .iter()
            .filter(|(_, member)| *member == user_id)
            .map(|(group, _)| *group)
            .collect();

        // Membership in a group implies membership in every user group
        // that contains it.
        let mut reached = BTreeSet::new();
        while let Some(group_id) = pending.pop() {
            if !reached.insert(group_id) {
                continue;
            }
            pending.extend(
                state
                    .subgroups
                    .iter()
                    .filter(|(_, sub)| *sub == group_id)
                    .map(|(parent, _)| *parent)
                    .filter(|parent| {
                        state
                            .groups
                            .get(parent)
                            .is_some_and(|g| g.kind == GroupKind::User)
                    }),
            );
        }

        let mut groups: Vec<GroupRecord> = reached
            .iter()
            .filter_map(|id| state.groups.get(id).cloned())
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    fn group(&self, id: RecordId) -> Result<Option<GroupRecord>, StoreError> {
        Ok(self.state.borrow().groups.get(&id).cloned())
    }

    fn find_group(&self, name: &str) -> Result<Option<GroupRecord>, StoreError> {
        Ok(self
            .state
            .borrow()
            .groups
            .values()
            .find(|g| g.name == name)
            .cloned())
    }

    fn member_ids(&self, group_id: RecordId) -> Result<BTreeSet<RecordId>, StoreError> {
        Ok(self
            .state
            .borrow()
            .members
            .iter()
            .filter(|(group, _)| *group == group_id)
            .map(|(_, user)| *user)
            .collect())
    }

    fn add_member(&self, group_id: RecordId, user_id: RecordId) -> Result<bool, StoreError> {
        let mut state = self.state.borrow_mut();
        if !state.groups.contains_key(&group_id) {
            return Err(StoreError::Missing {
                entity: "group",
                id: group_id,
            });
        }
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::Missing {
                entity: "user",
                id: user_id,
            });
        }
        Ok(state.members.insert((group_id, user_id)))
    }

    fn subgroup_ids(&self, group_id: RecordId) -> Result<BTreeSet<RecordId>, StoreError> {
        Ok(self
            .state
            .borrow()
            .subgroups
            .iter()
            .filter(|(group, _)| *group == group_id)
            .map(|(_, sub)| *sub)
            .collect())
    }

    fn supergroups(&self, subgroup_id: RecordId) -> Result<Vec<GroupRecord>, StoreError> {
        let state = self.state.borrow();
        Ok(state
            .subgroups
            .iter()
            .filter(|(_, sub)| *sub == subgroup_id)
            .filter_map(|(group, _)| state.groups.get(group).cloned())
            .collect())
    }

    fn add_subgroup(&self, group_id: RecordId, subgroup_id: RecordId) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        for id in [group_id, subgroup_id] {
            if !state.groups.contains_key(&id) {
                return Err(StoreError::Missing { entity: "group", id });
            }
        }
        state.subgroups.insert((group_id, subgroup_id));
        Ok(())
    }

    fn remove_subgroup(
        &self,
        group_id: RecordId,
        subgroup_id: RecordId,
    ) -> Result<(), StoreError> {
        self.state
            .borrow_mut()
            .subgroups
            .remove(&(group_id, subgroup_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(groups: &[GroupRecord]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    fn small_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_user(UserRecord::new(1, "pat"));
        store.insert_group(GroupRecord::new(1, "staff", GroupKind::User));
        store.insert_group(GroupRecord::new(2, "all", GroupKind::User));
        store.insert_group(GroupRecord::new(3, "a_app", GroupKind::App));
        store
    }

    #[test]
    fn memberships_follow_user_supergroups_only() {
        let store = small_store();
        store.add_member(1, 1).unwrap();
        store.add_subgroup(2, 1).unwrap();
        store.add_subgroup(3, 1).unwrap();

        let groups = store.memberships(1).unwrap();
        assert_eq!(names(&groups), ["all", "staff"]);
    }

    #[test]
    fn memberships_tolerate_cycles() {
        let store = small_store();
        store.add_member(1, 1).unwrap();
        store.add_subgroup(2, 1).unwrap();
        store.add_subgroup(1, 2).unwrap();
        assert_eq!(store.memberships(1).unwrap().len(), 2);
    }

    #[test]
    fn unknown_user_has_no_memberships() {
        let store = small_store();
        assert!(store.memberships(99).unwrap().is_empty());
    }

    #[test]
    fn add_member_reports_duplicates() {
        let store = small_store();
        assert!(store.add_member(1, 1).unwrap());
        assert!(!store.add_member(1, 1).unwrap());
        assert_eq!(
            store.add_member(42, 1),
            Err(StoreError::Missing {
                entity: "group",
                id: 42
            })
        );
    }

    #[test]
    fn update_missing_user_fails() {
        let store = small_store();
        let err = store
            .update_user(9, UserUpdate::LastSeen(chrono::Utc::now()))
            .unwrap_err();
        assert_eq!(err, StoreError::Missing { entity: "user", id: 9 });
    }

    #[test]
    fn find_user_returns_lowest_id_match() {
        let store = small_store();
        store.insert_user(UserRecord::new(5, "pat"));
        let found = store.find_user(&UserCriteria::username("pat")).unwrap();
        assert_eq!(found.map(|r| r.id), Some(1));
        assert!(store
            .find_user(&UserCriteria::username("nobody"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn remove_subgroup_ignores_missing_edges() {
        let store = small_store();
        store.add_subgroup(2, 1).unwrap();
        store.remove_subgroup(2, 1).unwrap();
        store.remove_subgroup(2, 1).unwrap();
        assert!(store.subgroup_ids(2).unwrap().is_empty());
    }
}
