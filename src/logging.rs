//! Request-scoped logging.

use std::fmt;

/// Request-scoped logger.
///
/// `RequestLog` is obtained from [`RequestContext::log`](crate::RequestContext::log)
/// and is lifetime-bound to the context. Every event carries the request id
/// and, once resolved, the current username.
///
/// Password digests are wrapped in [`Secret`](crate::Secret), so they stay
/// redacted even when a record is logged with `{:?}`.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    request_id: &'a str,
    user: Option<&'a str>,
}

impl<'a> RequestLog<'a> {
    pub(crate) fn new(request_id: &'a str, user: Option<&'a str>) -> Self {
        Self { request_id, user }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message.
    ///
    /// Use with `format_args!` for efficient formatting:
    /// ```no_run
    /// # use sitekit::RequestLog;
    /// # fn example(log: &RequestLog) {
    /// log.info(format_args!("signed in from {}", "127.0.0.1"));
    /// # }
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, user = self.user, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, user = self.user, "{}", args);
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, user = self.user, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, user = self.user, "{}", args);
    }
}
