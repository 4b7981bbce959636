//! Invocation metadata shared with the hosting server adapter.
//!
//! The key names below are the contract between sitekit and whatever
//! launched the request: a web server spawning one process per request
//! (CGI style) or a long-running application server (WSGI style).

use std::collections::HashMap;

/// Invocation metadata: the server-provided environment of one request.
pub type Environ = HashMap<String, String>;

/// Present only when the request comes from a persistent application server.
pub const PERSISTENT_MARKER: &str = "wsgi.version";
/// Full request URI, used by single-shot invocations.
pub const REQUEST_URI: &str = "REQUEST_URI";
/// Path-only field, used by persistent invocations.
pub const PATH_INFO: &str = "PATH_INFO";
/// Raw, still-encoded query string.
pub const QUERY_STRING: &str = "QUERY_STRING";
/// HTTP method.
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
/// Media type of the request body.
pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
/// Size of the request body in bytes.
pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";
/// `Host` header.
pub const HTTP_HOST: &str = "HTTP_HOST";
/// Peer address.
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
/// Identity asserted by the front-end server (e.g. basic auth).
pub const REMOTE_USER: &str = "REMOTE_USER";
/// `User-Agent` header.
pub const HTTP_USER_AGENT: &str = "HTTP_USER_AGENT";
/// `Cookie` header.
pub const HTTP_COOKIE: &str = "HTTP_COOKIE";
/// Set to `on` by CGI servers for TLS requests.
pub const HTTPS: &str = "HTTPS";
/// Scheme reported by persistent servers.
pub const URL_SCHEME: &str = "wsgi.url_scheme";

/// How the request reached the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    /// One process per request; metadata in the process environment,
    /// body on stdin.
    SingleShot,
    /// A long-running server hands each request to the application.
    Persistent,
}

impl InvocationKind {
    /// Determines the invocation kind from the presence of the
    /// persistent-process marker.
    pub fn detect(env: &Environ) -> Self {
        if env.contains_key(PERSISTENT_MARKER) {
            InvocationKind::Persistent
        } else {
            InvocationKind::SingleShot
        }
    }

    /// Conventional short name (`"cgi"` or `"wsgi"`).
    pub fn as_str(self) -> &'static str {
        match self {
            InvocationKind::SingleShot => "cgi",
            InvocationKind::Persistent => "wsgi",
        }
    }

    /// Extracts the request path from the field this kind defines.
    pub(crate) fn path_of(self, env: &Environ) -> String {
        match self {
            InvocationKind::SingleShot => env
                .get(REQUEST_URI)
                .map(|uri| path_of_uri(uri).to_string())
                .unwrap_or_default(),
            InvocationKind::Persistent => env.get(PATH_INFO).cloned().unwrap_or_default(),
        }
    }
}

/// Strips a URI down to its path component.
///
/// Accepts both origin-form (`/a/b?x=1`) and absolute-form
/// (`http://host/a/b?x=1`) URIs.
fn path_of_uri(uri: &str) -> &str {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    let uri = &uri[..end];

    if uri.starts_with('/') {
        return uri;
    }
    match uri.find("://") {
        Some(pos) => {
            let rest = &uri[pos + 3..];
            rest.find('/').map(|slash| &rest[slash..]).unwrap_or("/")
        }
        None => uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Environ {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn marker_selects_persistent() {
        let e = env(&[(PERSISTENT_MARKER, "1"), (PATH_INFO, "/x")]);
        assert_eq!(InvocationKind::detect(&e), InvocationKind::Persistent);
        assert_eq!(InvocationKind::detect(&e).as_str(), "wsgi");
    }

    #[test]
    fn missing_marker_means_single_shot() {
        let e = env(&[(REQUEST_URI, "/x")]);
        assert_eq!(InvocationKind::detect(&e), InvocationKind::SingleShot);
        assert_eq!(InvocationKind::detect(&e).as_str(), "cgi");
    }

    #[test]
    fn single_shot_strips_query_from_uri() {
        let e = env(&[(REQUEST_URI, "/test/route?name=joe")]);
        assert_eq!(InvocationKind::SingleShot.path_of(&e), "/test/route");
    }

    #[test]
    fn single_shot_strips_scheme_and_authority() {
        assert_eq!(path_of_uri("http://localhost/a/b?x=1"), "/a/b");
        assert_eq!(path_of_uri("https://localhost"), "/");
        assert_eq!(path_of_uri("/frag#top"), "/frag");
    }

    #[test]
    fn origin_form_path_may_contain_a_url() {
        assert_eq!(
            path_of_uri("/go/http://example.com/page?x=1"),
            "/go/http://example.com/page"
        );
    }

    #[test]
    fn persistent_reads_path_info_only() {
        let e = env(&[(PATH_INFO, "/test/route"), (REQUEST_URI, "/other")]);
        assert_eq!(InvocationKind::Persistent.path_of(&e), "/test/route");
    }

    #[test]
    fn missing_path_is_empty() {
        let e = Environ::new();
        assert_eq!(InvocationKind::SingleShot.path_of(&e), "");
        assert_eq!(InvocationKind::Persistent.path_of(&e), "");
    }
}
