//! The closed set of values a log field can hold.
//!
//! Every field in a [`Fields`](crate::Fields) map is stored as a [`Value`].
//! Scalars keep their kind so that the encoder in [`format`](crate::format)
//! can render them exactly; everything else is captured as text at
//! conversion time, either as an error message ([`Value::Error`]) or as a
//! structural `{:?}` rendering ([`Value::Debug`]).
//!
//! # Examples
//!
//! ```
//! use rootline::Value;
//!
//! assert_eq!(Value::from(7u8), Value::U64(7));
//! assert_eq!(Value::from(-3i16), Value::I64(-3));
//! assert_eq!(Value::from(None::<&str>), Value::Nil);
//!
//! #[derive(Debug)]
//! struct Point {
//!     x: i32,
//! }
//! assert_eq!(Value::debug(&Point { x: 1 }).to_string(), r#""Point { x: 1 }""#);
//! ```

use std::{borrow::Cow, error::Error, fmt, time::SystemTime};

use chrono::{DateTime, FixedOffset, Local, Utc};

/// A single field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// An absent value, rendered as `nil`.
    Nil,
    /// A boolean.
    Bool(bool),
    /// Any signed integer, widened.
    I64(i64),
    /// Any unsigned integer, widened.
    U64(u64),
    /// A single precision float.
    F32(f32),
    /// A double precision float.
    F64(f64),
    /// A point in time.
    Time(DateTime<FixedOffset>),
    /// Free-form text.
    Str(String),
    /// The message of an error value.
    Error(String),
    /// The `{:?}` rendering of an arbitrary value.
    Debug(String),
}

impl Value {
    /// Captures the message of an error value.
    pub fn error<E>(error: &E) -> Self
    where
        E: Error + ?Sized,
    {
        Self::Error(error.to_string())
    }

    /// Captures the structural rendering of any [`Debug`](fmt::Debug) value.
    pub fn debug<T>(value: &T) -> Self
    where
        T: fmt::Debug + ?Sized,
    {
        Self::Debug(format!("{value:?}"))
    }

    /// Returns `true` for [`Value::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::encode(self))
    }
}

macro_rules! from_widened {
    ($variant:ident($wide:ty): $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value as $wide)
                }
            }
        )*
    };
}

from_widened!(I64(i64): i8, i16, i32, i64, isize);
from_widened!(U64(u64): u8, u16, u32, u64, usize);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(value: Cow<'_, str>) -> Self {
        Self::Str(value.into_owned())
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Time(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Time(value.into())
    }
}

impl From<DateTime<Local>> for Value {
    fn from(value: DateTime<Local>) -> Self {
        Self::Time(value.into())
    }
}

impl From<SystemTime> for Value {
    fn from(value: SystemTime) -> Self {
        Self::from(DateTime::<Utc>::from(value))
    }
}

impl From<&(dyn Error + 'static)> for Value {
    fn from(value: &(dyn Error + 'static)) -> Self {
        Self::error(value)
    }
}

impl From<&(dyn Error + Send + Sync + 'static)> for Value {
    fn from(value: &(dyn Error + Send + Sync + 'static)) -> Self {
        Self::error(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}
