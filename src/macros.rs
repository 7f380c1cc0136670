/// Builds [`Fields`](crate::Fields) from `key => value` pairs.
///
/// Keys are anything that converts into a `String`, values anything that
/// converts into a [`Value`](crate::Value). Later pairs overwrite earlier
/// ones with the same key.
///
/// # Examples
///
/// ```
/// use rootline::{Value, fields};
///
/// let fields = fields! {
///     "at" => "start",
///     "attempt" => 3,
///     "ratio" => 0.5,
/// };
/// assert_eq!(fields.get("attempt"), Some(&Value::I64(3)));
/// assert!(fields! {}.is_empty());
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert($key, $value);
        )+
        fields
    }};
}

/// Wraps an error into a [`WrappedError`](crate::WrappedError), optionally
/// with a formatted message.
///
/// The stack is captured where the macro is invoked.
///
/// # Examples
///
/// ```
/// use std::io;
///
/// use rootline::wrap;
///
/// let error = wrap!(io::Error::other("connection reset"));
/// assert_eq!(error.message(), "connection reset");
///
/// let error = wrap!(io::Error::other("connection reset"), "fetching {}", "/users");
/// assert_eq!(error.message(), "fetching /users");
/// ```
#[macro_export]
macro_rules! wrap {
    ($cause:expr $(,)?) => {
        $crate::WrappedError::wrap($cause)
    };
    ($cause:expr, $($arg:tt)+) => {
        $crate::WrappedError::wrap_with_message(
            $cause,
            $crate::__private::format!($($arg)+),
        )
    };
}

/// Reports an error through a [`Logger`](crate::Logger).
///
/// Accepts both [`Failure`](crate::Failure) implementors and plain
/// [`Error`](std::error::Error) types, picking the richer path when it is
/// available. The optional third argument is an `Option<&Fields>` of extra
/// context.
///
/// # Examples
///
/// ```
/// use std::{io, sync::mpsc};
///
/// use rootline::{Logger, WrappedError, fields, report, sink::ChannelSink};
///
/// let (sender, receiver) = mpsc::channel();
/// let logger = Logger::new(ChannelSink::new(sender)).with_timestamps(false);
///
/// // A plain error: the class is its own type name.
/// report!(logger, io::Error::other("disk full")).unwrap();
/// assert!(receiver.recv().unwrap().contains("class=std::io::error::Error"));
///
/// // A failure carrying its own fields.
/// let error = WrappedError::msg("quota").with_field("user", 42);
/// report!(logger, error, Some(&fields! { "request" => 7 })).unwrap();
/// let lines: Vec<_> = receiver.try_iter().collect();
/// assert!(lines.iter().any(|line| line.contains("user=42") && line.contains("request=7")));
/// ```
#[macro_export]
macro_rules! report {
    ($logger:expr, $failure:expr $(,)?) => {
        $crate::report!($logger, $failure, $crate::__private::None)
    };
    ($logger:expr, $failure:expr, $extra:expr $(,)?) => {{
        use $crate::__private::kind::*;
        (&&Probe(&$failure)).dispatch(&$logger, $extra)
    }};
}
