#![deny(
    missing_docs,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Structured `key=value` logging and error reporting.
//!
//! ## Overview
//!
//! rootline writes every log record as a single line of space-separated
//! `key=value` tokens, one line per event, meant to be read by humans and
//! grepped or parsed by machines alike:
//!
//! ```text
//! now=2024-05-01T12:00:00+0000 app=billing at=charge amount=12.500 user="Jane Doe"
//! ```
//!
//! On top of that it provides a failure type carrying its own diagnostic
//! envelope (a stack captured where it was created, a reportability flag and
//! context fields) and a reporting pipeline that turns any error into a
//! summary line followed by one line per stack frame, or hands it to an
//! external reporter instead.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::mpsc;
//!
//! use rootline::{Logger, fields, sink::ChannelSink, wrap};
//!
//! let (sender, receiver) = mpsc::channel();
//! let logger = Logger::new(ChannelSink::new(sender))
//!     .with_timestamps(false)
//!     .with_fields(fields! { "app" => "billing" });
//!
//! logger.log(&fields! { "at" => "charge", "amount" => 12.5 }).unwrap();
//! assert!(receiver.recv().unwrap().contains("amount=12.500"));
//!
//! let error = wrap!(std::io::Error::other("card declined"), "charging {}", "Jane Doe")
//!     .with_field("attempt", 2);
//! logger.report(&error, None).unwrap();
//!
//! let summary = receiver.recv().unwrap();
//! assert!(summary.contains("at=exception"));
//! assert!(summary.contains(r#"message="charging Jane Doe""#));
//! assert!(summary.contains("attempt=2"));
//! assert!(receiver.recv().unwrap().contains("site="));
//! ```
//!
//! ## Core Concepts
//!
//! - A [`Value`] is a single field value. Its [`Display`](std::fmt::Display)
//!   impl is the wire encoding; see [`format`] for the exact rules.
//! - [`Fields`] is an unordered bag of named values. Every log call, every
//!   error and every logger carries one, and they are merged left to right
//!   with later layers winning.
//! - A [`Logger`] owns ambient fields and a [`Sink`]. [`Logger::log`] merges
//!   and writes; [`Logger::report`] runs the [reporting pipeline](mod@report).
//! - [`WrappedError`] and [`HttpError`] capture a [`Stack`] at construction.
//!   Any other error type takes part in reporting through the [`Failure`]
//!   trait or the [`Plain`] adapter.
//! - [`Statter`] and [`Timer`] emit metrics and durations through the same
//!   line format.
//!
//! ## Process-wide defaults
//!
//! [`log`] and [`report`](fn@report) use the logger from
//! [`hooks::current`], which is a stdout logger unless one has been
//! installed with [`hooks::install`] or [`hooks::replace`].
//!
//! ## Environment Variables
//!
//! Stack capture honors `RUST_BACKTRACE=full` and `ROOTLINE_STACK`; see
//! [`stack`].

#[macro_use]
mod macros;

pub mod error;
pub mod failure;
pub mod fields;
pub mod format;
pub mod hooks;
pub mod line;
pub mod logger;
pub mod metrics;
pub mod prelude;
pub mod report;
pub mod result_ext;
pub mod sink;
pub mod stack;
pub mod timer;
pub mod value;

pub use self::{
    error::{HttpError, WrappedError},
    failure::{Failure, Plain},
    fields::Fields,
    logger::Logger,
    metrics::{Statter, StatterConfig},
    report::ErrorReporter,
    sink::{LogError, Sink},
    stack::Stack,
    timer::{TimeUnit, Timer},
    value::Value,
};

/// Logs `fields` through the process-wide logger.
///
/// ```
/// rootline::log(&rootline::fields! { "at" => "boot" }).unwrap();
/// ```
pub fn log(fields: &Fields) -> Result<(), LogError> {
    hooks::current().log(fields)
}

/// Reports `failure` through the process-wide logger.
pub fn report(failure: &dyn Failure, extra: Option<&Fields>) -> Result<(), LogError> {
    hooks::current().report(failure, extra)
}

// Not public API. Referenced by macro-generated code.
#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    pub use std::{format, option::Option::None};

    #[doc(hidden)]
    #[allow(missing_docs)]
    pub mod kind {
        use std::error::Error;

        use crate::{Failure, Fields, LogError, Logger, Plain};

        #[doc(hidden)]
        pub struct Probe<'a, E: ?Sized>(pub &'a E);

        #[doc(hidden)]
        pub trait FailureKind {
            fn dispatch(&self, logger: &Logger, extra: Option<&Fields>) -> Result<(), LogError>;
        }

        impl<E> FailureKind for &Probe<'_, E>
        where
            E: Failure,
        {
            #[inline(always)]
            fn dispatch(&self, logger: &Logger, extra: Option<&Fields>) -> Result<(), LogError> {
                logger.report(self.0, extra)
            }
        }

        #[doc(hidden)]
        pub trait PlainKind {
            fn dispatch(&self, logger: &Logger, extra: Option<&Fields>) -> Result<(), LogError>;
        }

        impl<E> PlainKind for Probe<'_, E>
        where
            E: Error + ?Sized,
        {
            #[inline(always)]
            fn dispatch(&self, logger: &Logger, extra: Option<&Fields>) -> Result<(), LogError> {
                logger.report(&Plain(self.0), extra)
            }
        }
    }
}
