//! Request-scoped context and current-user resolution.

use crate::error::{Error, Result};
use crate::logging::RequestLog;
use crate::request::Request;
use crate::session::Session;
use crate::site::Site;
use crate::state::{ContextState, Resolved, Unresolved};
use crate::store::{UserCriteria, UserStatus};
use crate::users::User;

/// Request-scoped context: the site, the visitor's session, the identity
/// asserted by the front-end server, and (once resolved) the current user.
///
/// `RequestContext<S>` is generic over its resolution state:
/// - `RequestContext<Unresolved>`: built per request, no user yet
/// - `RequestContext<Resolved>`: carries the current [`User`] in its state
///
/// # Type-State Progression
///
/// ```text
/// RequestContext<Unresolved> --set_current_user--> RequestContext<Resolved>
/// ```
///
/// There is no process-wide "current user" or "current site"; anything
/// that needs them takes a context.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use sitekit::store::MemoryStore;
/// use sitekit::{set_current_user, RequestContext, Session, Site, SiteConfig};
///
/// let site = Site::new(Rc::new(MemoryStore::seeded().unwrap()), SiteConfig::default());
/// let ctx = RequestContext::new("req-1", site, Session::signed_in("admin"), None);
///
/// let ctx = set_current_user(ctx).expect("admin is active");
/// assert_eq!(ctx.user().username(), "admin");
/// assert!(ctx.user().is_admin());
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext<S = Resolved> {
    request_id: String,
    site: Site,
    session: Session,
    remote_user: Option<String>,
    state: S,
}

// ============================================================================
// Shared methods (available on all states)
// ============================================================================

impl<S: ContextState> RequestContext<S> {
    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The site serving this request.
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// The visitor's session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the visitor's session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Identity asserted by the front-end server, if any.
    pub fn remote_user(&self) -> Option<&str> {
        self.remote_user.as_deref()
    }

    /// Logger tagged with this request.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(
            &self.request_id,
            self.state.current_user().map(User::username),
        )
    }
}

// ============================================================================
// RequestContext<Unresolved> - Initial state
// ============================================================================

impl RequestContext<Unresolved> {
    /// Creates a context with no current user.
    pub fn new(
        request_id: impl Into<String>,
        site: Site,
        session: Session,
        remote_user: Option<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            site,
            session,
            remote_user: remote_user.filter(|u| !u.is_empty()),
            state: Unresolved::new(),
        }
    }

    /// Creates a context taking the remote identity from `request`.
    pub fn from_request(
        request_id: impl Into<String>,
        site: Site,
        session: Session,
        request: &Request,
    ) -> Self {
        let remote_user = request.remote_user().map(str::to_string);
        Self::new(request_id, site, session, remote_user)
    }

    fn resolve(self, user: User) -> RequestContext<Resolved> {
        RequestContext {
            request_id: self.request_id,
            site: self.site,
            session: self.session,
            remote_user: self.remote_user,
            state: Resolved { user },
        }
    }
}

// ============================================================================
// RequestContext<Resolved> - Current user attached
// ============================================================================

impl RequestContext<Resolved> {
    /// The current user.
    pub fn user(&self) -> &User {
        &self.state.user
    }

    /// Mutable access to the current user.
    pub fn user_mut(&mut self) -> &mut User {
        &mut self.state.user
    }
}

/// Username the request should run as.
///
/// Resolution order: the session's signed-in username, then the remote
/// identity asserted by the server, then the site's guest account. `None`
/// when none of them is available.
pub fn get_current_username<S: ContextState>(ctx: &RequestContext<S>) -> Option<&str> {
    ctx.session
        .username()
        .or(ctx.remote_user.as_deref())
        .or(ctx.site.config().guest.as_deref())
}

/// Resolves and initializes the current user.
///
/// The username from [`get_current_username`] is looked up among active
/// users; if it is unknown or inactive, the guest account is used instead.
/// Signed-in users get their last-seen time stamped.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when neither the resolved username nor
/// a configured guest account yields an active user, and store errors as
/// they occur.
pub fn set_current_user(ctx: RequestContext<Unresolved>) -> Result<RequestContext<Resolved>> {
    let users = ctx.site.users();
    let guest = ctx.site.config().guest.as_deref();

    let mut user = None;
    if let Some(username) = get_current_username(&ctx) {
        user = users.first(&active(username))?;
        if user.is_none() {
            ctx.log()
                .warn(format_args!("user {} is unknown or inactive", username));
        }
    }
    if user.is_none() {
        if let Some(guest) = guest {
            user = users.first(&active(guest))?;
        }
    }

    let Some(mut user) = user else {
        ctx.log()
            .error(format_args!("unable to resolve a current user"));
        return Err(Error::Configuration(
            "no current user could be resolved and no guest account is available".to_string(),
        ));
    };

    user.initialize(&ctx)?;
    if user.is_authenticated() {
        user.update_last_seen()?;
    }

    let ctx = ctx.resolve(user);
    ctx.log().debug(format_args!("current user set"));
    Ok(ctx)
}

fn active(username: &str) -> UserCriteria {
    UserCriteria::username(username).with_status(UserStatus::Active)
}
