//! The process-wide default logger.
//!
//! The free functions [`crate::log`] and [`crate::report`], and timers without
//! an explicit statter, go through the logger returned by [`current`]. Until
//! one is installed, that is a stdout logger with timestamps and no ambient
//! fields.
//!
//! # Quick Start
//!
//! ```rust
//! use rootline::{Logger, fields, hooks};
//!
//! let logger = Logger::stdout().with_fields(fields! { "app" => "billing" });
//! hooks::install(logger).expect("a logger is already installed");
//!
//! assert!(hooks::current().fields().contains_key("app"));
//! ```
//!
//! [`install`] refuses to overwrite an installed logger and hands the
//! rejected one back; [`replace`] swaps unconditionally.

mod hook_lock;

use std::sync::{Arc, OnceLock};

use self::hook_lock::HookLock;
use crate::Logger;

static LOGGER: HookLock<Arc<Logger>> = HookLock::new();

/// Error returned by [`install`] when a logger is already installed.
///
/// Contains the logger that could not be installed.
pub struct LoggerAlreadyInstalledError(pub Logger);

impl std::fmt::Debug for LoggerAlreadyInstalledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerAlreadyInstalledError").finish()
    }
}

impl std::fmt::Display for LoggerAlreadyInstalledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a logger is already installed globally")
    }
}

impl std::error::Error for LoggerAlreadyInstalledError {}

/// Installs `logger` as the process-wide default.
///
/// Fails if a logger has already been installed, returning `logger` inside
/// the error. See also [`replace`].
pub fn install(logger: Logger) -> Result<(), LoggerAlreadyInstalledError> {
    let mut guard = LOGGER.write();
    let slot = guard.get();
    if slot.is_some() {
        return Err(LoggerAlreadyInstalledError(logger));
    }
    *slot = Some(Arc::new(logger));
    Ok(())
}

/// Installs `logger` as the process-wide default, returning the logger that
/// was installed before, if any.
pub fn replace(logger: Logger) -> Option<Arc<Logger>> {
    LOGGER.write().get().replace(Arc::new(logger))
}

/// The process-wide default logger.
pub fn current() -> Arc<Logger> {
    if let Some(logger) = LOGGER.read().get() {
        return Arc::clone(logger);
    }
    fallback()
}

fn fallback() -> Arc<Logger> {
    static FALLBACK: OnceLock<Arc<Logger>> = OnceLock::new();
    Arc::clone(FALLBACK.get_or_init(|| Arc::new(Logger::stdout())))
}
