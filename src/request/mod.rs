//! Uniform request object over single-shot and persistent invocations.
//!
//! A [`Request`] is built from the invocation metadata ([`Environ`]) and the
//! input stream. It exposes:
//! - the [route](Request::route), i.e. the non-empty path segments
//! - merged query-string and form-body [parameters](Request::data)
//! - the raw [body](Request::body), handed out at most once
//! - the body decoded as [JSON](Request::json_body)
//!
//! # Body ownership
//!
//! The input stream can be read only once. Whichever of `data()` (for a
//! form-encoded, body-bearing request) or `body()` runs first takes the
//! stream; the other sees nothing. Calling `data()` first makes `body()`
//! return `None`; taking the body first leaves `data()` with the query
//! string only.
//!
//! ```
//! use sitekit::request::{Environ, Request};
//!
//! let env: Environ = [
//!     ("REQUEST_URI", "/posts/new?draft=1"),
//!     ("REQUEST_METHOD", "POST"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//!
//! let mut request = Request::new(env, &b"title=Hello"[..]);
//! assert_eq!(request.route(), ["posts", "new"]);
//! assert_eq!(request.data().get("title"), Some("Hello"));
//! assert_eq!(request.data().get("draft"), Some("1"));
//! assert!(request.body().is_none());
//! ```

mod body;
mod environ;
mod params;

use std::collections::BTreeMap;
use std::io::{self, Read};

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

pub use body::Body;
pub use environ::{
    Environ, InvocationKind, CONTENT_LENGTH, CONTENT_TYPE, HTTPS, HTTP_COOKIE, HTTP_HOST, HTTP_USER_AGENT,
    PATH_INFO, PERSISTENT_MARKER, QUERY_STRING, REMOTE_ADDR, REMOTE_USER, REQUEST_METHOD,
    REQUEST_URI, URL_SCHEME,
};
pub use params::Params;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const BODY_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

/// A normalized inbound request.
#[derive(Debug)]
pub struct Request {
    kind: InvocationKind,
    env: Environ,
    path: String,
    body: Option<Body>,
    data: Option<Params>,
}

impl Request {
    /// Builds a request from invocation metadata and its input stream.
    ///
    /// If `CONTENT_LENGTH` holds a valid size, no more than that many bytes
    /// are ever read from `input`.
    pub fn new(env: Environ, input: impl Read + 'static) -> Self {
        let kind = InvocationKind::detect(&env);
        let path = kind.path_of(&env);
        let length = env
            .get(CONTENT_LENGTH)
            .and_then(|len| len.trim().parse::<u64>().ok());
        tracing::debug!(kind = kind.as_str(), path = %path, length, "request created");
        Self {
            kind,
            env,
            path,
            body: Some(Body::new(input, length)),
            data: None,
        }
    }

    /// Builds a request with an empty input stream.
    pub fn without_body(env: Environ) -> Self {
        Self::new(env, io::empty())
    }

    /// Builds a single-shot request from this process's environment and stdin.
    pub fn from_process() -> Self {
        Self::new(std::env::vars().collect(), io::stdin())
    }

    /// How the request was invoked.
    pub fn kind(&self) -> InvocationKind {
        self.kind
    }

    /// The request path as provided by the server.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Non-empty path segments, in order. The root path yields no segments.
    pub fn route(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Raw invocation metadata value.
    pub fn env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// HTTP method, `GET` when the server did not say.
    pub fn method(&self) -> &str {
        self.env(REQUEST_METHOD).unwrap_or("GET")
    }

    /// `Host` header, if any.
    pub fn host(&self) -> Option<&str> {
        self.env(HTTP_HOST)
    }

    /// Peer address, if any.
    pub fn ip_address(&self) -> Option<&str> {
        self.env(REMOTE_ADDR)
    }

    /// Identity asserted by the front-end server, if any.
    pub fn remote_user(&self) -> Option<&str> {
        self.env(REMOTE_USER).filter(|u| !u.is_empty())
    }

    /// `User-Agent` header, if any.
    pub fn user_agent(&self) -> Option<&str> {
        self.env(HTTP_USER_AGENT)
    }

    /// `http` or `https`.
    pub fn scheme(&self) -> &str {
        if let Some(scheme) = self.env(URL_SCHEME) {
            return scheme;
        }
        match self.env(HTTPS) {
            Some(flag) if flag.eq_ignore_ascii_case("on") => "https",
            _ => "http",
        }
    }

    /// Cookies sent with the request.
    pub fn cookies(&self) -> BTreeMap<String, String> {
        self.env(HTTP_COOKIE)
            .unwrap_or("")
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.to_string(), value.trim_matches('"').to_string()))
            .collect()
    }

    /// Request parameters.
    ///
    /// The query string always contributes. For POST, PUT and PATCH requests
    /// with a form-encoded (or unspecified) content type, the body is read
    /// once and its pairs appended; the body is then gone for good. The
    /// result is computed on first call and cached.
    pub fn data(&mut self) -> &Params {
        let params = match self.data.take() {
            Some(params) => params,
            None => self.collect_params(),
        };
        self.data.insert(params)
    }

    /// Takes the raw body.
    ///
    /// Returns `Some` exactly once, and never after `data()` has decoded
    /// parameters from the body.
    pub fn body(&mut self) -> Option<Body> {
        let body = self.body.take();
        if body.is_none() {
            tracing::debug!(path = %self.path, "request body already consumed");
        }
        body
    }

    /// Takes the body and decodes it as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedBody`] if the body was already consumed,
    /// cannot be read, or is not valid JSON.
    pub fn json_body(&mut self) -> Result<serde_json::Value> {
        self.json()
    }

    /// Takes the body and deserializes it from JSON into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`json_body`](Self::json_body).
    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let body = self
            .body()
            .ok_or_else(|| Error::MalformedBody("request body is not available".to_string()))?;
        let bytes = body
            .read_all()
            .map_err(|e| Error::MalformedBody(format!("unable to read body: {}", e)))?;
        serde_json::from_slice(&bytes).map_err(|e| Error::MalformedBody(e.to_string()))
    }

    fn collect_params(&mut self) -> Params {
        let mut params = Params::parse(self.env(QUERY_STRING).unwrap_or(""));

        if !self.carries_form_body() {
            return params;
        }

        match self.body.take().map(Body::read_all) {
            Some(Ok(bytes)) => params.extend_encoded(&String::from_utf8_lossy(&bytes)),
            Some(Err(err)) => {
                tracing::warn!(path = %self.path, error = %err, "unable to read form body");
            }
            None => {
                tracing::debug!(path = %self.path, "body taken before data; using query string only");
            }
        }
        params
    }

    fn carries_form_body(&self) -> bool {
        let method = self.method();
        if !BODY_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method)) {
            return false;
        }
        match self.env(CONTENT_TYPE) {
            None => true,
            Some(ct) => {
                let media = ct.split(';').next().unwrap_or("").trim();
                media.is_empty() || media.eq_ignore_ascii_case(FORM_URLENCODED)
            }
        }
    }
}
