//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use rootline::prelude::*;
//!
//! fn parse_port(text: &str) -> Result<u16, WrappedError> {
//!     text.parse::<u16>().wrap_err_with(|| format!("invalid port {text:?}"))
//! }
//!
//! let logger = Logger::stdout().with_fields(fields! { "app" => "proxy" });
//! if let Err(error) = parse_port("http") {
//!     report!(logger, error).unwrap();
//! }
//! ```
//!
//! # What's Included
//!
//! - **[`Logger`]**, **[`Fields`]** and **[`Value`]**: writing lines
//! - **[`WrappedError`]**, **[`HttpError`]** and **[`ResultExt`]**: building
//!   failures that carry a stack
//! - **[`Failure`]**: opting a custom error type into reporting
//! - **[`fields!`]**, **[`wrap!`]** and **[`report!`]**

pub use crate::{
    Failure, Fields, HttpError, LogError, Logger, Value, WrappedError, fields, report,
    result_ext::ResultExt, wrap,
};
