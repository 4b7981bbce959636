//! Type-state for request context progression.
//!
//! A [`RequestContext`](crate::RequestContext) starts `Unresolved` and
//! becomes `Resolved` once [`set_current_user`](crate::set_current_user)
//! has attached a user. The user lives in the `Resolved` state itself, so
//! only a resolved context can hand it out.

use crate::users::User;

/// Implemented by the resolution states of a request context.
pub trait ContextState {
    /// The current user, if this state carries one.
    fn current_user(&self) -> Option<&User>;
}

/// State of a context whose current user has not been resolved yet.
#[derive(Debug, Clone, Copy)]
pub struct Unresolved {
    _private: (),
}

impl Unresolved {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl ContextState for Unresolved {
    fn current_user(&self) -> Option<&User> {
        None
    }
}

/// State of a context that carries its current user.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub(crate) user: User,
}

impl ContextState for Resolved {
    fn current_user(&self) -> Option<&User> {
        Some(&self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_state_is_zero_sized() {
        assert_eq!(std::mem::size_of::<Unresolved>(), 0);
        assert!(Unresolved::new().current_user().is_none());
    }

    #[test]
    fn state_cannot_be_constructed_publicly() {
        // If you uncomment these lines, they will not compile outside the crate:

        // let fake = Unresolved { _private: () }; // Error: _private is private
        // let fake = Resolved { user };           // Error: user is pub(crate)
    }
}
