//! User accounts as views over a record store.
//!
//! A [`User`] is a transient, mutable copy of a stored [`UserRecord`]. Edits
//! stay in memory until [`save`](User::save), with two write-through
//! exceptions: [`set_password`](User::set_password) and
//! [`update_last_seen`](User::update_last_seen) persist their single field
//! immediately without flushing other pending edits.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::context::RequestContext;
use crate::error::{Result, StoreError, Violation};
use crate::password::{hash_password, verify_password};
use crate::policy::Allows;
use crate::secret::Secret;
use crate::state::ContextState;
use crate::store::{RecordId, RecordStore, UserCriteria, UserRecord, UserStatus, UserUpdate};

/// A user account.
///
/// Group information is queried from the store on every call. The
/// request-scoped flags ([`is_admin`](Self::is_admin),
/// [`is_developer`](Self::is_developer),
/// [`is_authenticated`](Self::is_authenticated)) are false until
/// [`initialize`](Self::initialize) runs.
#[derive(Clone)]
pub struct User {
    record: UserRecord,
    store: Option<Rc<dyn RecordStore>>,
    // Set for the guest account, whose groups come from configuration.
    guest_groups: Option<Rc<[String]>>,
    is_admin: bool,
    is_developer: bool,
    is_authenticated: bool,
}

impl User {
    /// Primary key.
    pub fn id(&self) -> RecordId {
        self.record.id
    }

    /// Login name.
    pub fn username(&self) -> &str {
        &self.record.username
    }

    /// Given name.
    pub fn first_name(&self) -> &str {
        &self.record.first_name
    }

    /// Family name.
    pub fn last_name(&self) -> &str {
        &self.record.last_name
    }

    /// First and last name joined by a space, or the username if both are blank.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.record.first_name, self.record.last_name);
        match name.trim() {
            "" => self.record.username.clone(),
            trimmed => trimmed.to_string(),
        }
    }

    /// E-mail address.
    pub fn email(&self) -> &str {
        &self.record.email
    }

    /// Changes the given name. Call [`save`](Self::save) to persist.
    pub fn set_first_name(&mut self, name: impl Into<String>) {
        self.record.first_name = name.into();
    }

    /// Changes the family name. Call [`save`](Self::save) to persist.
    pub fn set_last_name(&mut self, name: impl Into<String>) {
        self.record.last_name = name.into();
    }

    /// Changes the e-mail address. Call [`save`](Self::save) to persist.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.record.email = email.into();
    }

    /// Stored password digest.
    pub fn password(&self) -> &Secret<String> {
        &self.record.password
    }

    /// Account status.
    pub fn status(&self) -> UserStatus {
        self.record.status
    }

    /// True when the account status is [`UserStatus::Active`].
    pub fn is_active(&self) -> bool {
        self.record.status == UserStatus::Active
    }

    /// Last time the user made a request, if ever.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.record.last_seen
    }

    /// The underlying record as it would be saved.
    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    /// Administrator of the current site. False before `initialize`.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Developer of the current site. False before `initialize`.
    pub fn is_developer(&self) -> bool {
        self.is_developer
    }

    /// Signed in as someone other than the guest. False before `initialize`.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Removes the store handle; later store-backed calls fail with
    /// [`StoreError::Detached`].
    pub fn detach_store(&mut self) -> Option<Rc<dyn RecordStore>> {
        self.store.take()
    }

    fn store(&self) -> Result<&dyn RecordStore> {
        self.store.as_deref().ok_or_else(|| StoreError::Detached.into())
    }

    /// Names of the groups this user belongs to.
    ///
    /// Ordered as the store returns them. The guest account uses the
    /// configured guest group list instead of querying the store.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or is detached.
    pub fn groups(&self) -> Result<Vec<String>> {
        if let Some(fallback) = &self.guest_groups {
            return Ok(fallback.to_vec());
        }
        let groups = self.store()?.memberships(self.record.id)?;
        Ok(groups.into_iter().map(|g| g.name).collect())
    }

    /// Ids of the groups this user belongs to.
    pub fn groups_ids(&self) -> Result<BTreeSet<RecordId>> {
        let store = self.store()?;
        if let Some(fallback) = &self.guest_groups {
            let mut ids = BTreeSet::new();
            for name in fallback.iter() {
                if let Some(group) = store.find_group(name)? {
                    ids.insert(group.id);
                }
            }
            return Ok(ids);
        }
        let groups = store.memberships(self.record.id)?;
        Ok(groups.into_iter().map(|g| g.id).collect())
    }

    /// Returns true if `group` is one of [`groups`](Self::groups).
    pub fn is_member(&self, group: &str) -> Result<bool> {
        Ok(self.groups()?.iter().any(|g| g == group))
    }

    /// Asks `target` whether this user may perform `action` on it.
    ///
    /// Evaluated on every call; nothing is cached.
    pub fn can<T: Allows + ?Sized>(&self, action: &str, target: &T) -> bool {
        target.allows(self, action)
    }

    /// Like [`can`](Self::can), but a denial is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`](crate::Error::Unauthorized) when
    /// `target` does not allow `action`.
    pub fn authorize<T: Allows + ?Sized>(&self, action: &str, target: &T) -> Result<()> {
        if self.can(action, target) {
            return Ok(());
        }
        tracing::info!(user = %self.record.username, action, "authorization denied");
        Err(Violation::unauthorized(&self.record.username, action).into())
    }

    /// Checks a plaintext password against the stored digest.
    pub fn authenticate(&self, password: &str) -> bool {
        let ok = verify_password(&self.record.password, password);
        if !ok {
            tracing::debug!(user = %self.record.username, "password did not verify");
        }
        ok
    }

    /// Replaces the password and writes the new digest to the store at once.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        let digest = hash_password(password)?;
        self.store()?
            .update_user(self.record.id, UserUpdate::Password(digest.clone()))?;
        self.record.password = digest;
        tracing::info!(user = %self.record.username, "password changed");
        Ok(())
    }

    /// Marks the account active. Call [`save`](Self::save) to persist.
    pub fn activate(&mut self) {
        self.record.status = UserStatus::Active;
    }

    /// Marks the account inactive. Call [`save`](Self::save) to persist.
    pub fn deactivate(&mut self) {
        self.record.status = UserStatus::Inactive;
    }

    /// Persists the whole record.
    pub fn save(&self) -> Result<()> {
        self.store()?.save_user(&self.record)?;
        tracing::debug!(user = %self.record.username, status = self.record.status.code(), "user saved");
        Ok(())
    }

    /// Stamps `last_seen` with the current time and persists it at once.
    pub fn update_last_seen(&mut self) -> Result<()> {
        let now = Utc::now();
        self.store()?
            .update_user(self.record.id, UserUpdate::LastSeen(now))?;
        self.record.last_seen = Some(now);
        Ok(())
    }

    /// Computes the request-scoped flags for the site serving `ctx`.
    pub fn initialize<S: ContextState>(&mut self, ctx: &RequestContext<S>) -> Result<()> {
        let config = ctx.site().config();
        let groups = self.groups()?;
        self.is_admin = groups.iter().any(|g| *g == config.administrators_group);
        self.is_developer = groups.iter().any(|g| *g == config.developers_group);
        self.is_authenticated = !config.is_guest(&self.record.username);
        ctx.log().debug(format_args!(
            "initialized user {} (admin={}, authenticated={})",
            self.record.username, self.is_admin, self.is_authenticated
        ));
        Ok(())
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("record", &self.record)
            .field("attached", &self.store.is_some())
            .field("is_admin", &self.is_admin)
            .field("is_authenticated", &self.is_authenticated)
            .finish_non_exhaustive()
    }
}

/// Repository of [`User`] views over a shared store.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use sitekit::store::{MemoryStore, UserCriteria};
/// use sitekit::Users;
///
/// let users = Users::new(Rc::new(MemoryStore::seeded().unwrap()));
/// let admin = users.first(&UserCriteria::username("admin")).unwrap().unwrap();
/// assert_eq!(admin.id(), 1);
/// assert!(users.get(999).unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct Users {
    store: Rc<dyn RecordStore>,
    guest: Option<String>,
    guest_groups: Rc<[String]>,
}

impl Users {
    /// Uses the default site configuration.
    pub fn new(store: Rc<dyn RecordStore>) -> Self {
        Self::with_config(store, &SiteConfig::default())
    }

    /// Uses the guest settings of `config`.
    pub fn with_config(store: Rc<dyn RecordStore>, config: &SiteConfig) -> Self {
        Self {
            store,
            guest: config.guest.clone(),
            guest_groups: config.guest_groups.clone().into(),
        }
    }

    /// The shared store.
    pub fn store(&self) -> Rc<dyn RecordStore> {
        Rc::clone(&self.store)
    }

    /// Fetches a user by id. `Ok(None)` if there is no such user.
    pub fn get(&self, id: RecordId) -> Result<Option<User>> {
        Ok(self.store.user(id)?.map(|record| self.view(record)))
    }

    /// Fetches the first user matching `criteria`. `Ok(None)` if none match.
    pub fn first(&self, criteria: &UserCriteria) -> Result<Option<User>> {
        Ok(self.store.find_user(criteria)?.map(|record| self.view(record)))
    }

    /// Fetches several users by id, skipping ids that do not exist.
    pub fn get_many(&self, ids: impl IntoIterator<Item = RecordId>) -> Result<Vec<User>> {
        let mut users = Vec::new();
        for id in ids {
            if let Some(user) = self.get(id)? {
                users.push(user);
            }
        }
        Ok(users)
    }

    fn view(&self, record: UserRecord) -> User {
        let is_guest = self.guest.as_deref() == Some(record.username.as_str());
        User {
            record,
            store: Some(Rc::clone(&self.store)),
            guest_groups: is_guest.then(|| Rc::clone(&self.guest_groups)),
            is_admin: false,
            is_developer: false,
            is_authenticated: false,
        }
    }
}

impl fmt::Debug for Users {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Users")
            .field("guest", &self.guest)
            .field("guest_groups", &self.guest_groups)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GroupKind, GroupRecord, MemoryStore};

    fn plain_store() -> Rc<MemoryStore> {
        let store = MemoryStore::new();
        store.insert_user(UserRecord::new(1, "pat").named("Pat", "Smith"));
        store.insert_user(UserRecord::new(2, "guest"));
        store.insert_user(UserRecord::new(3, "anon"));
        store.insert_group(GroupRecord::new(1, "everyone", GroupKind::User));
        store.insert_group(GroupRecord::new(2, "guests", GroupKind::User));
        store.add_member(1, 1).unwrap();
        Rc::new(store)
    }

    #[test]
    fn full_name_falls_back_to_username() {
        let users = Users::new(plain_store());
        assert_eq!(users.get(1).unwrap().unwrap().full_name(), "Pat Smith");
        assert_eq!(users.get(3).unwrap().unwrap().full_name(), "anon");
    }

    #[test]
    fn guest_groups_come_from_configuration() {
        let config = SiteConfig {
            guest_groups: vec!["guests".to_string(), "visitors".to_string()],
            ..SiteConfig::default()
        };
        let users = Users::with_config(plain_store(), &config);
        let guest = users.get(2).unwrap().unwrap();
        assert_eq!(guest.groups().unwrap(), ["guests", "visitors"]);
        // Unknown names have no id.
        assert_eq!(guest.groups_ids().unwrap(), BTreeSet::from([2]));
    }

    #[test]
    fn views_are_independent_copies() {
        let users = Users::new(plain_store());
        let mut a = users.get(1).unwrap().unwrap();
        let b = users.get(1).unwrap().unwrap();
        a.set_first_name("Changed");
        assert_eq!(b.first_name(), "Pat");
    }

    #[test]
    fn detached_user_cannot_save_or_query() {
        let users = Users::new(plain_store());
        let mut user = users.get(1).unwrap().unwrap();
        assert!(user.detach_store().is_some());
        assert!(matches!(
            user.save(),
            Err(crate::Error::Store(StoreError::Detached))
        ));
        assert!(matches!(
            user.update_last_seen(),
            Err(crate::Error::Store(StoreError::Detached))
        ));
        assert!(user.last_seen().is_none());
    }

    #[test]
    fn get_many_skips_missing_ids() {
        let users = Users::new(plain_store());
        let found = users.get_many([3, 42, 1]).unwrap();
        let names: Vec<&str> = found.iter().map(User::username).collect();
        assert_eq!(names, ["anon", "pat"]);
    }

    #[test]
    fn debug_output_redacts_password() {
        let users = Users::new(plain_store());
        let user = users.get(1).unwrap().unwrap();
        let debug = format!("{:?}", user);
        assert!(debug.contains("password: [REDACTED]"));
        assert!(debug.contains("attached: true"));
    }
}
