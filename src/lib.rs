//! Request normalization and a user/authorization model for small web sites.
//!
//! This crate provides:
//! - **Request normalization**: one [`Request`] type over single-shot (CGI)
//!   and persistent-process (WSGI-style) invocations
//! - **Users and groups**: views over a pluggable [`RecordStore`](store::RecordStore)
//! - **Delegated authorization**: protected objects decide through [`Allows`]
//! - **Explicit context**: the current user is resolved into a
//!   [`RequestContext`], never held in process-wide state
//!
//! # Core Types
//!
//! - [`Request`]: route segments, merged parameters, one-shot body access
//! - [`User`]: account view with `can`/`authorize`/`authenticate`
//! - [`RequestContext`]: site, session and current user for one request
//! - [`Secret<T>`]: wrapper that redacts password digests in logs/output
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use std::rc::Rc;
//! use sitekit::store::MemoryStore;
//! use sitekit::{set_current_user, Request, RequestContext, Session, Site, SiteConfig};
//!
//! let env = HashMap::from([
//!     ("REQUEST_URI".to_string(), "/groups/edit?id=4".to_string()),
//!     ("QUERY_STRING".to_string(), "id=4".to_string()),
//! ]);
//! let mut request = Request::without_body(env);
//! assert_eq!(request.route(), ["groups", "edit"]);
//! assert_eq!(request.data().get("id"), Some("4"));
//!
//! let site = Site::new(Rc::new(MemoryStore::seeded().unwrap()), SiteConfig::default());
//! let ctx = RequestContext::from_request("req-1", site, Session::new(), &request);
//! let ctx = set_current_user(ctx).expect("guest account exists");
//! assert_eq!(ctx.user().username(), "guest");
//! assert!(!ctx.user().is_authenticated());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod error;
pub mod groups;
mod logging;
mod password;
mod policy;
pub mod request;
mod secret;
mod session;
mod site;
mod state;
pub mod store;
mod users;

pub use config::SiteConfig;
pub use context::{get_current_username, set_current_user, RequestContext};
pub use error::{Error, Result, StoreError, Violation, ViolationKind};
pub use groups::{Group, GroupLocator, Groups};
pub use logging::RequestLog;
pub use password::{hash_password, verify_password};
pub use policy::{Allows, Denied};
pub use request::Request;
pub use secret::Secret;
pub use session::Session;
pub use site::Site;
pub use state::{ContextState, Resolved, Unresolved};
pub use users::{User, Users};
