//! Site configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings that shape user resolution and request-scoped user properties.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use sitekit::SiteConfig;
///
/// let config = SiteConfig::from_json(r#"{ "guest": null }"#).unwrap();
/// assert_eq!(config.guest, None);
/// assert_eq!(config.administrators_group, "administrators");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Username of the account used when nobody is signed in. `None`
    /// disables anonymous access.
    pub guest: Option<String>,
    /// Members of this group are administrators.
    pub administrators_group: String,
    /// Members of this group are developers.
    pub developers_group: String,
    /// Groups the guest account belongs to, without consulting the store.
    pub guest_groups: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            guest: Some("guest".to_string()),
            administrators_group: "administrators".to_string(),
            developers_group: "developers".to_string(),
            guest_groups: ["a_passreset", "a_signup", "everyone", "guests"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SiteConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the document is not valid.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Returns true if `username` is the configured guest account.
    pub fn is_guest(&self, username: &str) -> bool {
        self.guest.as_deref() == Some(username)
    }
}
