use std::rc::Rc;

use sitekit::store::{MemoryStore, UserCriteria, UserStatus};
use sitekit::{
    get_current_username, set_current_user, Allows, Error, RequestContext, Session, Site,
    SiteConfig, StoreError, User, Users, ViolationKind,
};

/// Anyone may read; only `admin` may do anything else.
struct Document;

impl Allows for Document {
    fn allows(&self, user: &User, action: &str) -> bool {
        action == "read" || user.username() == "admin"
    }
}

fn setup() -> Users {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Users::new(Rc::new(MemoryStore::seeded().expect("fixture hashes passwords")))
}

fn site() -> Site {
    Site::new(
        Rc::new(MemoryStore::seeded().expect("fixture hashes passwords")),
        SiteConfig::default(),
    )
}

fn named(users: &Users, username: &str) -> User {
    users
        .first(&UserCriteria::username(username))
        .unwrap()
        .unwrap_or_else(|| panic!("fixture has {}", username))
}

#[test]
fn get_user() {
    let users = setup();
    let user = users.get(1).unwrap().unwrap();
    assert_eq!(user.id(), 1);
    assert_eq!(user.username(), "admin");
    assert_eq!(user.first_name(), "Admin");
    assert_eq!(user.last_name(), "User");
    assert_eq!(user.full_name(), "Admin User");

    let user = users.get(3).unwrap().unwrap();
    assert_eq!(user.id(), 3);
    assert!(users.get(42).unwrap().is_none());
}

#[test]
fn current_username_defaults_to_guest() {
    let ctx = RequestContext::new("req", site(), Session::new(), None);
    assert_eq!(get_current_username(&ctx), Some("guest"));
}

#[test]
fn current_username_from_remote_user() {
    let ctx = RequestContext::new("req", site(), Session::new(), Some("user".into()));
    assert_eq!(get_current_username(&ctx), Some("user"));
}

#[test]
fn current_username_prefers_session() {
    let ctx = RequestContext::new(
        "req",
        site(),
        Session::signed_in("user"),
        Some("not_a_user".into()),
    );
    assert_eq!(get_current_username(&ctx), Some("user"));
}

#[test]
fn set_current_user_without_guest_fails() {
    let config = SiteConfig {
        guest: None,
        ..SiteConfig::default()
    };
    let site = Site::new(Rc::new(MemoryStore::seeded().unwrap()), config);
    let ctx = RequestContext::new("req", site, Session::new(), None);
    assert_eq!(get_current_username(&ctx), None);
    assert!(matches!(set_current_user(ctx), Err(Error::Configuration(_))));
}

#[test]
fn set_current_user_resolves_signed_in_user() {
    let site = site();
    let ctx = RequestContext::new("req", site.clone(), Session::signed_in("admin"), None);
    let ctx = set_current_user(ctx).unwrap();

    let user = ctx.user();
    assert_eq!(user.username(), "admin");
    assert!(user.is_admin());
    assert!(user.is_authenticated());
    assert!(!user.is_developer());

    let stored = site.users().get(1).unwrap().unwrap();
    assert!(stored.last_seen().is_some());
}

#[test]
fn user_groups() {
    let users = setup();
    let admin = named(&users, "admin");
    assert_eq!(
        admin.groups().unwrap(),
        ["administrators", "everyone", "managers", "users"]
    );

    let user = named(&users, "user");
    assert_eq!(user.groups().unwrap(), ["everyone", "users"]);
    assert_eq!(user.groups_ids().unwrap().into_iter().collect::<Vec<_>>(), [2, 4]);
}

#[test]
fn user_initialize() {
    let site = site();
    let mut admin = named(site.users(), "admin");
    assert!(!admin.is_admin());

    let ctx = RequestContext::new("req", site.clone(), Session::new(), None);
    admin.initialize(&ctx).unwrap();
    assert!(admin.is_admin());
    assert!(admin.is_authenticated());
}

#[test]
fn user_is_member() {
    let users = setup();
    let admin = named(&users, "admin");
    assert!(admin.is_member("administrators").unwrap());
    assert!(admin.is_member("users").unwrap());
    assert!(!admin.is_member("notagroup").unwrap());

    let user = named(&users, "user");
    assert!(user.is_member("users").unwrap());
    assert!(!user.is_member("administrators").unwrap());
    assert!(!user.is_member("notagroup").unwrap());
}

#[test]
fn user_activate() {
    let users = setup();
    let mut user = named(&users, "user");
    assert_eq!(user.status(), UserStatus::Active);
    assert!(user.is_active());
    user.deactivate();
    assert!(!user.is_active());
    assert_ne!(user.status(), UserStatus::Active);
    user.save().unwrap();

    let mut user = named(&users, "user");
    assert!(!user.is_active());
    assert_eq!(user.status().code(), "I");
    user.activate();
    assert!(user.is_active());
    user.save().unwrap();

    let user = named(&users, "user");
    assert!(user.is_active());
    assert_eq!(user.status().code(), "A");
}

#[test]
fn unsaved_status_change_is_not_persisted() {
    let users = setup();
    let mut user = named(&users, "user");
    user.deactivate();

    assert!(named(&users, "user").is_active());
}

#[test]
fn user_can() {
    let users = setup();
    let user = named(&users, "user");
    assert!(user.can("read", &Document));
    assert!(!user.can("edit", &Document));

    let admin = named(&users, "admin");
    assert!(admin.can("read", &Document));
    assert!(admin.can("edit", &Document));
}

#[test]
fn user_authorize() {
    let users = setup();
    let user = named(&users, "user");
    user.authorize("read", &Document).unwrap();
    match user.authorize("edit", &Document) {
        Err(Error::Unauthorized(violation)) => {
            assert_eq!(
                violation.kind,
                ViolationKind::Unauthorized {
                    action: "edit".to_string()
                }
            );
        }
        other => panic!("expected an authorization failure, got {:?}", other),
    }

    let admin = named(&users, "admin");
    admin.authorize("read", &Document).unwrap();
    admin.authorize("edit", &Document).unwrap();
}

#[test]
fn set_password() {
    let users = setup();
    let mut user = named(&users, "user");
    let old_password = user.password().clone();
    user.set_password("helloworld").unwrap();

    let user2 = named(&users, "user");
    assert_ne!(*user2.password(), old_password);
    assert!(user2.authenticate("helloworld"));
    assert!(!user2.authenticate("user"));
}

#[test]
fn guest_groups_and_detached_store() {
    let users = setup();
    let guest = named(&users, "guest");
    let groups = guest.groups().unwrap();
    assert_eq!(
        groups[groups.len() - 4..],
        ["a_passreset", "a_signup", "everyone", "guests"]
    );

    let mut user = named(&users, "user");
    user.detach_store();
    assert!(matches!(
        user.groups(),
        Err(Error::Store(StoreError::Detached))
    ));
}

#[test]
fn last_seen() {
    let users = setup();
    assert!(named(&users, "guest").last_seen().is_none());
    let mut admin = named(&users, "admin");
    assert!(admin.last_seen().is_none());

    admin.update_last_seen().unwrap();

    assert!(named(&users, "guest").last_seen().is_none());
    let admin = named(&users, "admin");
    let seen = admin.last_seen().expect("written through");
    assert!(seen <= chrono::Utc::now());
}
