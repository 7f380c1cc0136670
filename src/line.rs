//! Assembles fields into a single `key=value` log line.
//!
//! Each field becomes one token, `key=` followed by the field's
//! [encoded](crate::format::encode) value, and tokens are joined with a single
//! space. When a timestamp is requested it is always the first token,
//! `now=<current UTC time>`, and any caller-supplied `now` field is left out
//! so the line never carries two of them. The input fields are never modified.
//!
//! The order of the remaining tokens is unspecified.
//!
//! # Examples
//!
//! ```
//! use rootline::{fields, line::build_line};
//!
//! let line = build_line(&fields! { "at" => "start" }, false);
//! assert_eq!(line, "at=start");
//!
//! let line = build_line(&fields! { "now" => "ignored", "at" => "start" }, true);
//! assert!(line.starts_with("now="));
//! assert_eq!(line.matches("now=").count(), 1);
//! ```

use chrono::{DateTime, Utc};

use crate::{Fields, format};

/// The name of the injected timestamp field.
pub const TIMESTAMP_KEY: &str = "now";

/// Builds one log line from `fields`, prefixed with the current time when
/// `include_timestamp` is set.
pub fn build_line(fields: &Fields, include_timestamp: bool) -> String {
    build_line_parts(fields, include_timestamp.then(Utc::now)).join(" ")
}

/// Builds the individual `key=value` tokens of a line.
///
/// When `timestamp` is given, the first token is `now=<timestamp>` and any
/// `now` entry in `fields` is skipped.
pub fn build_line_parts(fields: &Fields, timestamp: Option<DateTime<Utc>>) -> Vec<String> {
    let mut parts = Vec::with_capacity(fields.len() + usize::from(timestamp.is_some()));

    if let Some(timestamp) = timestamp {
        parts.push(format!(
            "{TIMESTAMP_KEY}={}",
            timestamp.format(format::TIME_FORMAT)
        ));
    }

    for (key, value) in fields {
        if timestamp.is_some() && key == TIMESTAMP_KEY {
            continue;
        }
        parts.push(format!("{key}={}", format::encode(value)));
    }

    parts
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::TimeZone;

    use super::*;

    fn token_set(line: &str) -> BTreeSet<&str> {
        line.split(' ').collect()
    }

    #[test]
    fn test_tokens_are_set_equal() {
        let fields = Fields::new()
            .with("fn", "stringspace")
            .with("test", "hi")
            .with("n", 3u8);

        let line = build_line(&fields, false);

        assert_eq!(
            token_set(&line),
            BTreeSet::from(["fn=stringspace", "test=hi", "n=3"])
        );
    }

    #[test]
    fn test_timestamp_comes_first() {
        let fields = Fields::new().with("fn", "time").with("test", 1);
        let at = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap();

        let parts = build_line_parts(&fields, Some(at));

        assert_eq!(parts[0], "now=2000-01-02T03:04:05+0000");
        assert_eq!(parts.len(), 3);
        assert!(parts.contains(&"fn=time".to_owned()));
        assert!(parts.contains(&"test=1".to_owned()));
    }

    #[test]
    fn test_existing_now_field_is_dropped() {
        let fields = Fields::new().with("now", "earlier").with("a", 1);

        let line = build_line(&fields, true);

        assert!(line.starts_with("now="));
        assert_eq!(line.matches("now=").count(), 1);
        assert!(!line.contains("earlier"));
        assert_eq!(fields.get("now"), Some(&crate::Value::Str("earlier".into())));
    }

    #[test]
    fn test_now_field_is_kept_without_timestamp() {
        let fields = Fields::new().with("now", "earlier");
        assert_eq!(build_line(&fields, false), "now=earlier");
    }

    #[test]
    fn test_current_timestamp_parses() {
        let line = build_line(&Fields::new(), true);
        let stamp = line.strip_prefix("now=").unwrap();
        DateTime::parse_from_str(stamp, format::TIME_FORMAT).unwrap();
    }

    #[test]
    fn test_empty_fields_make_empty_line() {
        assert_eq!(build_line(&Fields::new(), false), "");
    }
}
