//! Errors that carry their own diagnostic envelope.
//!
//! A [`WrappedError`] wraps an underlying cause together with everything the
//! reporting pipeline needs: a message, a [`Stack`] captured at construction,
//! a reportability flag and optional [`Fields`]. [`HttpError`] adds a status
//! code on top.
//!
//! # Examples
//!
//! ```
//! use std::io;
//!
//! use rootline::{Failure, Value, WrappedError, wrap};
//!
//! let cause = io::Error::new(io::ErrorKind::NotFound, "config.toml");
//!
//! let mut error = wrap!(cause, "could not load {}", "settings");
//! error.add_field("path", "/etc/app/config.toml");
//!
//! assert_eq!(error.message(), "could not load settings");
//! assert_eq!(
//!     error.fields().unwrap().get("path"),
//!     Some(&Value::Str("/etc/app/config.toml".into()))
//! );
//! assert!(error.cause().is_some());
//! ```

use std::{
    error::Error,
    fmt,
    ops::{Deref, DerefMut},
};

use crate::{Failure, Fields, Stack, Value};

/// A boxed, thread-safe error used as the cause of a [`WrappedError`].
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// A failure plus its diagnostic envelope.
///
/// The stack is captured once, when the error is constructed, and never
/// changes afterwards. Fields are allocated only when the first one is added.
#[derive(Debug)]
pub struct WrappedError {
    message: String,
    cause: Option<BoxError>,
    reportable: bool,
    fields: Option<Fields>,
    stack: Stack,
}

impl WrappedError {
    /// Wraps `cause`, taking its message.
    #[inline(never)]
    pub fn wrap<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::from_parts(Some(cause.into()), String::new(), Stack::capture())
    }

    /// Wraps `cause` with an explicit message.
    ///
    /// An empty `message` falls back to the message of `cause`.
    #[inline(never)]
    pub fn wrap_with_message<E>(cause: E, message: impl Into<String>) -> Self
    where
        E: Into<BoxError>,
    {
        Self::from_parts(Some(cause.into()), message.into(), Stack::capture())
    }

    /// Creates an error that has a message but no underlying cause.
    #[inline(never)]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::from_parts(None, message.into(), Stack::capture())
    }

    pub(crate) fn from_parts(cause: Option<BoxError>, message: String, stack: Stack) -> Self {
        let message = match (&cause, message.is_empty()) {
            (Some(cause), true) => cause.to_string(),
            _ => message,
        };

        Self {
            message,
            cause,
            reportable: true,
            fields: None,
            stack,
        }
    }

    /// The error message: the explicit message if one was given, otherwise
    /// the message of the cause.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The wrapped cause, if any.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Consumes the error and returns its cause.
    pub fn into_cause(self) -> Option<BoxError> {
        self.cause
    }

    /// The stack captured at construction.
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// The context attached to this error, if any field was ever added.
    pub fn fields(&self) -> Option<&Fields> {
        self.fields.as_ref()
    }

    /// Whether the reporting pipeline should emit this error.
    pub fn is_reportable(&self) -> bool {
        self.reportable
    }

    /// Marks the error as reportable or not.
    pub fn set_reportable(&mut self, reportable: bool) {
        self.reportable = reportable;
    }

    /// Marks the error as not reportable, returning `self` for chaining.
    #[must_use]
    pub fn unreportable(mut self) -> Self {
        self.reportable = false;
        self
    }

    /// Sets a context field, creating the context on first use.
    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.get_or_insert_with(Fields::new).insert(key, value);
    }

    /// Sets a context field, returning `self` for chaining.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_field(key, value);
        self
    }

    /// Removes a context field. Does nothing if there is no context.
    pub fn remove_field(&mut self, key: &str) {
        if let Some(fields) = &mut self.fields {
            fields.remove(key);
        }
    }
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for WrappedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

impl Failure for WrappedError {
    fn stack(&self) -> Option<&Stack> {
        Some(&self.stack)
    }

    fn is_reportable(&self) -> bool {
        self.reportable
    }

    fn fields(&self) -> Option<&Fields> {
        self.fields.as_ref()
    }
}

/// The status used when an [`HttpError`] is given a status below 1.
pub const DEFAULT_HTTP_STATUS: i32 = 500;

/// A [`WrappedError`] with an HTTP status code.
///
/// Derefs to the inner [`WrappedError`], so every field and reportability
/// method is available directly.
///
/// ```
/// use rootline::HttpError;
///
/// let error = HttpError::wrap_with_message("upstream closed", 0, "bad gateway");
/// assert_eq!(error.status(), 500);
/// assert_eq!(error.message(), "bad gateway");
/// ```
#[derive(Debug)]
pub struct HttpError {
    status: i32,
    inner: WrappedError,
}

impl HttpError {
    /// Wraps `cause` with a status code, taking the cause's message.
    #[inline(never)]
    pub fn wrap<E>(cause: E, status: i32) -> Self
    where
        E: Into<BoxError>,
    {
        Self::from_parts(
            status,
            WrappedError::from_parts(Some(cause.into()), String::new(), Stack::capture()),
        )
    }

    /// Wraps `cause` with a status code and an explicit message.
    #[inline(never)]
    pub fn wrap_with_message<E>(cause: E, status: i32, message: impl Into<String>) -> Self
    where
        E: Into<BoxError>,
    {
        Self::from_parts(
            status,
            WrappedError::from_parts(Some(cause.into()), message.into(), Stack::capture()),
        )
    }

    pub(crate) fn from_parts(status: i32, inner: WrappedError) -> Self {
        let status = if status < 1 { DEFAULT_HTTP_STATUS } else { status };
        Self { status, inner }
    }

    /// The normalized status code.
    pub fn status(&self) -> i32 {
        self.status
    }

    /// Consumes the error, returning the inner [`WrappedError`].
    pub fn into_inner(self) -> WrappedError {
        self.inner
    }
}

impl Deref for HttpError {
    type Target = WrappedError;

    fn deref(&self) -> &WrappedError {
        &self.inner
    }
}

impl DerefMut for HttpError {
    fn deref_mut(&mut self) -> &mut WrappedError {
        &mut self.inner
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for HttpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

impl Failure for HttpError {
    fn stack(&self) -> Option<&Stack> {
        Some(&self.inner.stack)
    }

    fn is_reportable(&self) -> bool {
        self.inner.reportable
    }

    fn fields(&self) -> Option<&Fields> {
        self.inner.fields.as_ref()
    }
}
