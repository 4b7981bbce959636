//! Authorization capability of protected resources.

use crate::users::User;

/// Authorization capability of a protected resource.
///
/// [`User::can`] and [`User::authorize`] delegate to this trait, so any
/// type can decide who may do what to it without the user model knowing
/// about it.
///
/// # Examples
///
/// ```
/// use sitekit::{Allows, User};
///
/// struct Post {
///     author: String,
/// }
///
/// impl Allows for Post {
///     fn allows(&self, user: &User, action: &str) -> bool {
///         action == "read" || user.username() == self.author
///     }
/// }
/// ```
pub trait Allows {
    /// Returns true if `user` may perform `action` on `self`.
    fn allows(&self, user: &User, action: &str) -> bool;
}

/// A resource that allows nothing to anyone.
///
/// This is the policy of a resource that has not declared one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Denied;

impl Allows for Denied {
    fn allows(&self, _user: &User, _action: &str) -> bool {
        false
    }
}
