//! The reporting pipeline.
//!
//! Reporting a failure runs through these steps, in order:
//!
//! 1. **Reportability.** A failure whose [`is_reportable`] is `false` is
//!    dropped: nothing is emitted, no reporter is called, and the report
//!    succeeds.
//! 2. **Context merge.** The logger's ambient fields, the failure's own
//!    fields (when present and non-empty) and the caller's extra fields are
//!    merged left to right into a fresh set, later layers winning.
//! 3. **Standard fields.** `at=exception`, `class=<type name>` and
//!    `message=<failure message>` are set, overwriting any field of the same
//!    name.
//! 4. **Dispatch.** With an [`ErrorReporter`] installed on the logger, the
//!    failure and the merged fields are handed to it and its result is
//!    returned. Otherwise the merged fields are logged as a summary line,
//!    followed by one line per backtrace frame carrying an extra
//!    `site=<frame>` field. The backtrace is the failure's own stack, or one
//!    captured on the spot, with the first two frames skipped.
//!
//! The first failing emission ends the report and its error is returned.
//!
//! [`is_reportable`]: Failure::is_reportable

use crate::{
    Failure, Fields, Logger, Stack,
    error::BoxError,
    sink::LogError,
};

/// The name of the field carrying a backtrace frame.
pub const SITE_KEY: &str = "site";

/// A pluggable destination for reported failures.
///
/// When a logger has a reporter, it replaces the default line emission
/// entirely.
///
/// Closures taking `(&dyn Failure, &Fields)` are reporters:
///
/// ```
/// use rootline::{Failure, Fields, Logger, WrappedError, error::BoxError, sink};
///
/// let logger = Logger::new(sink::stderr()).with_reporter(
///     |failure: &dyn Failure, fields: &Fields| -> Result<(), BoxError> {
///         assert_eq!(failure.to_string(), "boom");
///         assert!(fields.contains_key("class"));
///         Ok(())
///     },
/// );
///
/// logger.report(&WrappedError::msg("boom"), None).unwrap();
/// ```
pub trait ErrorReporter: Send + Sync {
    /// Reports `failure` with its fully merged context.
    fn report(&self, failure: &dyn Failure, fields: &Fields) -> Result<(), BoxError>;
}

impl<F> ErrorReporter for F
where
    F: Fn(&dyn Failure, &Fields) -> Result<(), BoxError> + Send + Sync,
{
    fn report(&self, failure: &dyn Failure, fields: &Fields) -> Result<(), BoxError> {
        self(failure, fields)
    }
}

/// Runs the pipeline for `failure` on behalf of `logger`.
pub(crate) fn report(
    logger: &Logger,
    failure: &dyn Failure,
    extra: Option<&Fields>,
) -> Result<(), LogError> {
    if !failure.is_reportable() {
        return Ok(());
    }

    let own_fields = failure.fields().filter(|fields| !fields.is_empty());
    let mut merged = Fields::merged(
        [Some(logger.fields()), own_fields, extra]
            .into_iter()
            .flatten(),
    );
    insert_standard_fields(failure, &mut merged);

    if let Some(reporter) = logger.reporter() {
        return reporter
            .report(failure, &merged)
            .map_err(LogError::Reporter);
    }

    logger.emit(&merged)?;
    for site in backtrace_lines(failure) {
        let mut line = merged.clone();
        line.insert(SITE_KEY, site);
        logger.emit(&line)?;
    }
    Ok(())
}

/// Sets `at`, `class` and `message` for `failure`.
pub fn insert_standard_fields(failure: &dyn Failure, fields: &mut Fields) {
    fields.insert("at", "exception");
    fields.insert("class", failure.class());
    fields.insert("message", failure.to_string());
}

/// The backtrace of `failure`, one frame per entry, without the first two
/// frames.
///
/// Uses the failure's own stack when it has one and captures a fresh stack
/// otherwise.
#[inline(never)]
pub fn backtrace_lines(failure: &dyn Failure) -> Vec<String> {
    match failure.stack() {
        Some(stack) => stack.backtrace_lines().map(str::to_owned).collect(),
        None => Stack::capture()
            .backtrace_lines()
            .map(str::to_owned)
            .collect(),
    }
}
