//! Optional capabilities a failure can expose to the reporting pipeline.
//!
//! The pipeline accepts any [`Failure`]. Every capability has a default, so a
//! type only overrides what it actually carries:
//!
//! | Capability                         | Default when absent             |
//! |------------------------------------|---------------------------------|
//! | [`stack`](Failure::stack)          | a fresh stack captured at report time |
//! | [`is_reportable`](Failure::is_reportable) | `true`                   |
//! | [`fields`](Failure::fields)        | no fields                       |
//!
//! Plain error types that know nothing about this crate are adapted with
//! [`Plain`], which is what [`Logger::report_error`](crate::Logger::report_error)
//! and the [`report!`](crate::report!) macro do for you.
//!
//! # Examples
//!
//! ```
//! use rootline::{Failure, Fields, fields};
//!
//! #[derive(Debug)]
//! struct QuotaExceeded {
//!     fields: Fields,
//! }
//!
//! impl std::fmt::Display for QuotaExceeded {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "quota exceeded")
//!     }
//! }
//!
//! impl std::error::Error for QuotaExceeded {}
//!
//! impl Failure for QuotaExceeded {
//!     fn fields(&self) -> Option<&Fields> {
//!         Some(&self.fields)
//!     }
//! }
//!
//! let failure = QuotaExceeded { fields: fields! { "limit" => 10 } };
//! assert!(failure.is_reportable());
//! assert!(failure.stack().is_none());
//! ```

use std::{error::Error, fmt};

use crate::{Fields, Stack};

/// A failure value the reporting pipeline knows how to report.
pub trait Failure: Error {
    /// The runtime type name reported in the `class` field.
    fn class(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The stack captured where this failure was created, if any.
    fn stack(&self) -> Option<&Stack> {
        None
    }

    /// Whether this failure should be reported at all.
    fn is_reportable(&self) -> bool {
        true
    }

    /// Context carried by this failure, if any.
    fn fields(&self) -> Option<&Fields> {
        None
    }
}

impl<F> Failure for &F
where
    F: Failure + ?Sized,
{
    fn class(&self) -> &'static str {
        (**self).class()
    }

    fn stack(&self) -> Option<&Stack> {
        (**self).stack()
    }

    fn is_reportable(&self) -> bool {
        (**self).is_reportable()
    }

    fn fields(&self) -> Option<&Fields> {
        (**self).fields()
    }
}

/// Adapts a plain error to [`Failure`] with every capability at its default.
///
/// The reported class is the name of the wrapped type.
pub struct Plain<'a, E: ?Sized>(pub &'a E);

impl<E> fmt::Display for Plain<'_, E>
where
    E: Error + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0, f)
    }
}

impl<E> fmt::Debug for Plain<'_, E>
where
    E: Error + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0, f)
    }
}

impl<E> Error for Plain<'_, E>
where
    E: Error + ?Sized,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl<E> Failure for Plain<'_, E>
where
    E: Error + ?Sized,
{
    fn class(&self) -> &'static str {
        std::any::type_name::<E>()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    impl Failure for Boom {}

    #[test]
    fn test_defaults() {
        assert_eq!(Boom.class(), std::any::type_name::<Boom>());
        assert!(Boom.stack().is_none());
        assert!(Boom.is_reportable());
        assert!(Boom.fields().is_none());
    }

    #[test]
    fn test_plain_reports_inner_class() {
        let error = io::Error::other("disk full");
        let plain = Plain(&error);

        assert_eq!(plain.class(), "std::io::error::Error");
        assert_eq!(plain.to_string(), "disk full");
        assert!(plain.is_reportable());
    }

    #[test]
    fn test_references_forward() {
        let boom = &Boom;
        assert_eq!(Failure::class(&boom), std::any::type_name::<Boom>());
    }
}
