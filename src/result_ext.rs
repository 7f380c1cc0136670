//! Extension methods for wrapping the error side of a `Result`.
//!
//! # Quick Start
//!
//! ```
//! use std::fs;
//!
//! use rootline::{WrappedError, result_ext::ResultExt};
//!
//! fn read_settings(path: &str) -> Result<String, WrappedError> {
//!     fs::read_to_string(path).wrap_err_with(|| format!("reading {path}"))
//! }
//!
//! let error = read_settings("/nonexistent/settings.toml").unwrap_err();
//! assert_eq!(error.message(), "reading /nonexistent/settings.toml");
//! assert!(error.cause().is_some());
//! ```
//!
//! The stack of the returned error points at the line calling the extension
//! method, just as if the constructor had been called there.

use crate::{HttpError, Stack, WrappedError, error::BoxError};

/// Converts the error of a `Result` into a [`WrappedError`] or [`HttpError`].
pub trait ResultExt<T> {
    /// Wraps the error with `message`.
    fn wrap_err(self, message: impl Into<String>) -> Result<T, WrappedError>;

    /// Wraps the error with a lazily built message.
    fn wrap_err_with<F, M>(self, message: F) -> Result<T, WrappedError>
    where
        F: FnOnce() -> M,
        M: Into<String>;

    /// Wraps the error with a status code and `message`.
    fn wrap_http_err(self, status: i32, message: impl Into<String>) -> Result<T, HttpError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    #[inline(never)]
    fn wrap_err(self, message: impl Into<String>) -> Result<T, WrappedError> {
        match self {
            Ok(value) => Ok(value),
            Err(cause) => Err(WrappedError::from_parts(
                Some(cause.into()),
                message.into(),
                Stack::capture(),
            )),
        }
    }

    #[inline(never)]
    fn wrap_err_with<F, M>(self, message: F) -> Result<T, WrappedError>
    where
        F: FnOnce() -> M,
        M: Into<String>,
    {
        match self {
            Ok(value) => Ok(value),
            Err(cause) => Err(WrappedError::from_parts(
                Some(cause.into()),
                message().into(),
                Stack::capture(),
            )),
        }
    }

    #[inline(never)]
    fn wrap_http_err(self, status: i32, message: impl Into<String>) -> Result<T, HttpError> {
        match self {
            Ok(value) => Ok(value),
            Err(cause) => Err(HttpError::from_parts(
                status,
                WrappedError::from_parts(Some(cause.into()), message.into(), Stack::capture()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[inline(never)]
    fn load_from_named_site() -> Result<(), WrappedError> {
        Err(io::Error::other("unreadable")).wrap_err("loading")
    }

    #[test]
    fn test_ok_passes_through() {
        let result: Result<u8, io::Error> = Ok(1);
        assert_eq!(result.wrap_err("unused").unwrap(), 1);
    }

    #[test]
    fn test_lazy_message_is_only_built_on_error() {
        let result: Result<u8, io::Error> = Ok(1);
        let value = result
            .wrap_err_with(|| -> String { panic!("message built for Ok") })
            .unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn test_first_backtrace_line_is_the_caller() {
        let error = load_from_named_site().unwrap_err();
        assert_eq!(error.message(), "loading");
        assert!(
            error
                .stack()
                .backtrace_lines()
                .next()
                .unwrap()
                .contains("load_from_named_site")
        );
    }

    #[test]
    fn test_http_err_normalizes_status() {
        let error = Err::<(), _>("refused").wrap_http_err(0, "").unwrap_err();
        assert_eq!(error.status(), 500);
        assert_eq!(error.message(), "refused");
    }
}
