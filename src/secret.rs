use std::fmt;

use serde::{Deserialize, Serialize};

/// A wrapper that keeps password material out of logs.
///
/// User records carry their password digest in a `Secret<String>` so that
/// `{:?}` on a record, a `User`, or a `tracing` field never prints it. The
/// wrapped value is reachable only through [`expose_secret`](Self::expose_secret).
///
/// Unlike a plaintext credential, a digest has to travel with every copy of
/// a user record, so `Secret` is `Clone` when `T` is. It serializes
/// transparently for record stores.
///
/// # Examples
///
/// ```
/// use sitekit::Secret;
///
/// let digest = Secret::new("$argon2id$v=19$...".to_string());
/// assert_eq!(format!("{:?}", digest), "[REDACTED]");
/// assert_eq!(format!("{}", digest), "[REDACTED]");
/// assert!(digest.expose_secret().starts_with("$argon2id"));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret<T> {
    // Must stay private: Debug/Display redaction is the only thing between
    // this value and a log line.
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the wrapped value.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacts_debug() {
        let digest = Secret::new("hunter2".to_string());
        let debug_output = format!("{:?}", digest);

        assert_eq!(debug_output, "[REDACTED]");
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("String")); // No type leak
    }

    #[test]
    fn secret_redacts_inside_derived_debug() {
        #[derive(Debug)]
        struct Row {
            #[allow(dead_code)]
            password: Secret<String>,
        }
        let row = Row {
            password: Secret::new("hunter2".to_string()),
        };
        assert_eq!(format!("{:?}", row), "Row { password: [REDACTED] }");
    }

    #[test]
    fn secret_serializes_as_bare_value() {
        let digest = Secret::new("abc".to_string());
        assert_eq!(serde_json::to_string(&digest).unwrap(), "\"abc\"");
        let back: Secret<String> = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, digest);
    }
}
