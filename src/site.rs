//! The site serving a request.

use std::rc::Rc;

use crate::config::SiteConfig;
use crate::groups::Groups;
use crate::store::RecordStore;
use crate::users::Users;

/// The site a request is served by: its configuration and repositories.
///
/// Cheap to clone; clones share the same store.
#[derive(Debug, Clone)]
pub struct Site {
    config: SiteConfig,
    users: Users,
    groups: Groups,
}

impl Site {
    /// Builds a site over `store`.
    pub fn new(store: Rc<dyn RecordStore>, config: SiteConfig) -> Self {
        Self {
            users: Users::with_config(Rc::clone(&store), &config),
            groups: Groups::new(store),
            config,
        }
    }

    /// Site configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// User repository.
    pub fn users(&self) -> &Users {
        &self.users
    }

    /// Group repository.
    pub fn groups(&self) -> &Groups {
        &self.groups
    }
}
