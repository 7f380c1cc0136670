//! Canonical text encoding for field values.
//!
//! [`encode`] turns a [`Value`] into the text that follows `key=` in a log
//! line. The output is shell-safe and unambiguous: a token never contains an
//! unquoted space, and a token containing `=` is always quoted so it cannot be
//! mistaken for a second `key=value` pair.
//!
//! Strings go through [`quote`]:
//!
//! 1. The empty string becomes the bare token `nil`.
//! 2. Newlines are folded into `|`.
//! 3. Without a space, the text is left alone unless it contains `=`, in
//!    which case it is wrapped in double quotes.
//! 4. With a space, backslashes are doubled first, and then the text is
//!    wrapped in double quotes, or in single quotes when it contains double
//!    quotes but no single quotes. If it contains both kinds of quote, it is
//!    wrapped in double quotes and its double quotes are escaped as `\"`.
//!
//! Floats always carry three decimals. Non-finite floats are written as
//! `NaN`, `+Inf` and `-Inf`.
//!
//! # Examples
//!
//! ```
//! use rootline::format::quote;
//!
//! assert_eq!(quote("hi"), "hi");
//! assert_eq!(quote("x=4,y=10"), r#""x=4,y=10""#);
//! assert_eq!(quote("a b\nc"), r#""a b|c""#);
//! assert_eq!(quote(r#"echo "hello""#), r#"'echo "hello"'"#);
//! assert_eq!(quote(r#"echo 'hello' "world""#), r#""echo 'hello' \"world\"""#);
//! assert_eq!(quote(""), "nil");
//! ```

use std::{borrow::Cow, fmt};

use crate::Value;

/// The `strftime` profile used for every timestamp, e.g.
/// `2000-01-02T03:04:05+0000`.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// The token used for absent values and empty strings.
pub const NIL: &str = "nil";

const SINGLE_QUOTE: char = '\'';
const DOUBLE_QUOTE: char = '"';

/// Encodes a value into its canonical token text.
pub fn encode(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Nil => Cow::Borrowed(NIL),
        Value::Bool(value) => Cow::Borrowed(if *value { "true" } else { "false" }),
        Value::I64(value) => Cow::Owned(value.to_string()),
        Value::U64(value) => Cow::Owned(value.to_string()),
        Value::F32(value) => encode_float(*value, value.is_nan(), value.is_infinite()),
        Value::F64(value) => encode_float(*value, value.is_nan(), value.is_infinite()),
        Value::Time(value) => Cow::Owned(value.format(TIME_FORMAT).to_string()),
        Value::Str(text) | Value::Error(text) | Value::Debug(text) => quote(text),
    }
}

/// Three decimals for finite floats, `NaN`, `+Inf` or `-Inf` otherwise.
fn encode_float<F>(value: F, nan: bool, infinite: bool) -> Cow<'static, str>
where
    F: fmt::Display + PartialOrd + Default,
{
    if nan {
        Cow::Borrowed("NaN")
    } else if infinite {
        Cow::Borrowed(if value > F::default() { "+Inf" } else { "-Inf" })
    } else {
        Cow::Owned(format!("{value:.3}"))
    }
}

/// Applies the string quoting rules described in the [module
/// documentation](self).
///
/// Text that needs no quoting is returned borrowed.
pub fn quote(text: &str) -> Cow<'_, str> {
    if text.is_empty() {
        return Cow::Borrowed(NIL);
    }

    let text = if text.contains('\n') {
        Cow::Owned(text.replace('\n', "|"))
    } else {
        Cow::Borrowed(text)
    };

    if !text.contains(' ') {
        return if text.contains('=') {
            Cow::Owned(format!("{DOUBLE_QUOTE}{text}{DOUBLE_QUOTE}"))
        } else {
            text
        };
    }

    let has_single = text.contains(SINGLE_QUOTE);
    let has_double = text.contains(DOUBLE_QUOTE);
    // Backslashes are doubled before any quote character is chosen or escaped.
    let escaped = text.replace('\\', r"\\");

    Cow::Owned(match (has_single, has_double) {
        (true, true) => format!(
            "{DOUBLE_QUOTE}{}{DOUBLE_QUOTE}",
            escaped.replace(DOUBLE_QUOTE, r#"\""#)
        ),
        (false, true) => format!("{SINGLE_QUOTE}{escaped}{SINGLE_QUOTE}"),
        _ => format!("{DOUBLE_QUOTE}{escaped}{DOUBLE_QUOTE}"),
    })
}

#[cfg(test)]
mod tests {
    use std::io;

    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_plain_words_are_untouched() {
        for word in ["hi", "under_score", "path/to/thing", "'a\"", r"back\slash"] {
            assert!(matches!(quote(word), Cow::Borrowed(_)), "{word}");
            assert_eq!(quote(word), word);
        }
    }

    #[test]
    fn test_equals_without_space_is_double_quoted() {
        assert_eq!(quote("x=4,y=10"), r#""x=4,y=10""#);
        assert_eq!(quote("="), r#""=""#);
    }

    #[test]
    fn test_spaces_are_always_quoted() {
        assert_eq!(quote("a b"), r#""a b""#);
        assert_eq!(quote("hello world"), r#""hello world""#);
        assert_eq!(quote("x=4, y=10"), r#""x=4, y=10""#);
        assert_eq!(quote("a 'a'"), r#""a 'a'""#);
        assert_eq!(quote(r#"echo "hello""#), r#"'echo "hello"'"#);

        for text in ["a b", "a 'b'", r#"a "b""#, r#"a 'b' "c""#, "a\\ b"] {
            let quoted = quote(text);
            let first = quoted.chars().next().unwrap();
            let last = quoted.chars().last().unwrap();
            assert!(first == '"' || first == '\'', "{quoted}");
            assert_eq!(first, last, "{quoted}");
        }
    }

    #[test]
    fn test_newlines_fold_before_the_space_check() {
        assert_eq!(quote("a b\nc"), r#""a b|c""#);
        assert_eq!(quote("a\nb"), "a|b");
        assert_eq!(quote("a\n=b"), r#""a|=b""#);
    }

    #[test]
    fn test_backslashes_double_only_with_spaces() {
        assert_eq!(quote(r"slasher \\"), r#""slasher \\\\""#);
        assert_eq!(quote(r"no\space"), r"no\space");
    }

    #[test]
    fn test_backslash_escaping_precedes_quote_escaping() {
        assert_eq!(quote(r#"it's a "b"\"#), r#""it's a \"b\"\\""#);
        assert_eq!(quote(r#"a "b"\"#), r#"'a "b"\\'"#);
    }

    #[test]
    fn test_empty_string_is_nil() {
        assert_eq!(quote(""), "nil");
        assert_eq!(encode(&Value::Str(String::new())), "nil");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(encode(&Value::Nil), "nil");
        assert_eq!(encode(&Value::Bool(true)), "true");
        assert_eq!(encode(&Value::Bool(false)), "false");
        assert_eq!(encode(&Value::from(1i8)), "1");
        assert_eq!(encode(&Value::from(-42i64)), "-42");
        assert_eq!(encode(&Value::from(1_000_000u32)), "1000000");
        assert_eq!(encode(&Value::from(1.0f32)), "1.000");
        assert_eq!(encode(&Value::from(2.71828f64)), "2.718");
        assert_eq!(encode(&Value::from(1e21f64)), "1000000000000000000000.000");
    }

    #[test]
    fn test_non_finite_floats() {
        assert_eq!(encode(&Value::from(f64::INFINITY)), "+Inf");
        assert_eq!(encode(&Value::from(f64::NEG_INFINITY)), "-Inf");
        assert_eq!(encode(&Value::from(f64::NAN)), "NaN");
        assert_eq!(encode(&Value::from(f32::INFINITY)), "+Inf");
        assert_eq!(encode(&Value::from(f32::NEG_INFINITY)), "-Inf");
        assert_eq!(encode(&Value::from(f32::NAN)), "NaN");
        assert_eq!(encode(&Value::from(-0.5f32)), "-0.500");
    }

    #[test]
    fn test_time_profile() {
        let time = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(encode(&Value::from(time)), "2000-01-02T03:04:05+0000");

        let offset = chrono::FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
        let time = offset.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(encode(&Value::from(time)), "2000-01-02T03:04:05-0530");
    }

    #[test]
    fn test_errors_and_structures_are_quoted_text() {
        let error = io::Error::other("error message");
        assert_eq!(encode(&Value::error(&error)), r#""error message""#);
        assert_eq!(encode(&Value::debug(&[86u8, 87, 88])), r#""[86, 87, 88]""#);

        #[derive(Debug)]
        #[allow(dead_code)]
        struct Example {
            value: &'static str,
        }
        assert_eq!(
            encode(&Value::debug(&Example { value: "testing123" })),
            r#"'Example { value: "testing123" }'"#
        );
    }
}
