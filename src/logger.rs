//! The ambient-context logger.
//!
//! A [`Logger`] owns a set of ambient [`Fields`] that are merged into every
//! line it writes, a shared [`Sink`], and the settings the reporting pipeline,
//! the metrics emitter and timers need. Loggers are cheap to clone: the sink
//! and reporter are shared, the ambient fields are duplicated.
//!
//! # Examples
//!
//! ```
//! use std::sync::mpsc;
//!
//! use rootline::{Logger, fields, sink::ChannelSink};
//!
//! let (sender, receiver) = mpsc::channel();
//! let logger = Logger::new(ChannelSink::new(sender))
//!     .with_timestamps(false)
//!     .with_fields(fields! { "app" => "billing" });
//!
//! let request = logger.child(&fields! { "request_id" => 7 });
//! request.log(&fields! { "at" => "charge" }).unwrap();
//!
//! let line = receiver.recv().unwrap();
//! assert!(line.contains("app=billing"));
//! assert!(line.contains("request_id=7"));
//! assert!(line.contains("at=charge"));
//! ```

use std::{error::Error, fmt, sync::Arc};

use crate::{
    ErrorReporter, Failure, Fields, Plain, Value,
    line::build_line,
    metrics::StatterConfig,
    report,
    sink::{self, LogError, Sink},
    timer::{TimeUnit, Timer},
};

/// Writes `key=value` lines with a set of ambient fields.
#[derive(Clone)]
pub struct Logger {
    fields: Fields,
    sink: Arc<dyn Sink>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    include_timestamp: bool,
    time_unit: TimeUnit,
    statter: StatterConfig,
}

impl Logger {
    /// Creates a logger writing to `sink`, with no ambient fields and
    /// timestamps enabled.
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self::from_shared_sink(Arc::new(sink))
    }

    /// Creates a logger writing to a sink that is already shared.
    pub fn from_shared_sink(sink: Arc<dyn Sink>) -> Self {
        Self {
            fields: Fields::new(),
            sink,
            reporter: None,
            include_timestamp: true,
            time_unit: TimeUnit::default(),
            statter: StatterConfig::default(),
        }
    }

    /// Creates a logger writing to standard output.
    pub fn stdout() -> Self {
        Self::new(sink::stdout())
    }

    /// Enables or disables the leading `now=` timestamp.
    #[must_use]
    pub fn with_timestamps(mut self, include_timestamp: bool) -> Self {
        self.include_timestamp = include_timestamp;
        self
    }

    /// Routes reported failures to `reporter` instead of logging them.
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Sets or clears the external reporter.
    pub fn set_reporter(&mut self, reporter: Option<Arc<dyn ErrorReporter>>) {
        self.reporter = reporter;
    }

    /// Merges `fields` into the ambient fields.
    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields.merge_from(&fields);
        self
    }

    /// Sets the unit of the `elapsed` field written by timers.
    #[must_use]
    pub fn with_time_unit(mut self, time_unit: TimeUnit) -> Self {
        self.time_unit = time_unit;
        self
    }

    /// Sets where timers send their durations.
    #[must_use]
    pub fn with_statter(mut self, statter: StatterConfig) -> Self {
        self.statter = statter;
        self
    }

    /// Sets one ambient field.
    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key, value);
    }

    /// Removes one ambient field.
    pub fn remove_field(&mut self, key: &str) {
        self.fields.remove(key);
    }

    /// The ambient fields.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The unit timers created by this logger report `elapsed` in.
    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// The statter configuration handed to timers.
    pub fn statter(&self) -> &StatterConfig {
        &self.statter
    }

    /// Appends `suffix` to the statter bucket, see
    /// [`StatterConfig::bucket_suffix`].
    pub fn statter_bucket_suffix(&mut self, suffix: &str) {
        self.statter.bucket_suffix(suffix);
    }

    pub(crate) fn reporter(&self) -> Option<&dyn ErrorReporter> {
        self.reporter.as_deref()
    }

    /// A fresh duplicate of the ambient fields merged with `extra`.
    pub fn merge(&self, extra: Option<&Fields>) -> Fields {
        Fields::merged(std::iter::once(&self.fields).chain(extra))
    }

    /// A logger sharing this one's sink and settings whose ambient fields are
    /// this logger's merged with `fields`.
    #[must_use]
    pub fn child(&self, fields: &Fields) -> Self {
        Self {
            fields: self.merge(Some(fields)),
            ..self.clone()
        }
    }

    /// Writes one line: the ambient fields merged with `fields`.
    pub fn log(&self, fields: &Fields) -> Result<(), LogError> {
        self.emit(&self.merge(Some(fields)))
    }

    /// Writes `fields` as they are, without the ambient fields.
    pub(crate) fn emit(&self, fields: &Fields) -> Result<(), LogError> {
        self.sink
            .write_line(&build_line(fields, self.include_timestamp))
    }

    /// Reports `failure`; see the [`report`](mod@crate::report) module for the
    /// steps involved.
    pub fn report(&self, failure: &dyn Failure, extra: Option<&Fields>) -> Result<(), LogError> {
        report::report(self, failure, extra)
    }

    /// Reports an error type that does not implement [`Failure`].
    pub fn report_error<E>(&self, error: &E, extra: Option<&Fields>) -> Result<(), LogError>
    where
        E: Error + ?Sized,
    {
        report::report(self, &Plain(error), extra)
    }

    /// Logs `at=start` with `fields` merged in and returns a running
    /// [`Timer`] that logs through the same child logger.
    pub fn timer(&self, fields: &Fields) -> Result<Timer, LogError> {
        Timer::start(self.child(fields))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("fields", &self.fields)
            .field("include_timestamp", &self.include_timestamp)
            .field("has_reporter", &self.reporter.is_some())
            .field("time_unit", &self.time_unit)
            .field("statter", &self.statter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, mpsc};

    use super::*;
    use crate::sink::ChannelSink;

    static_assertions::assert_impl_all!(Logger: Send, Sync, Clone);

    fn channel_logger() -> (Logger, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel();
        let logger = Logger::new(ChannelSink::new(sender)).with_timestamps(false);
        (logger, receiver)
    }

    #[test]
    fn test_log_merges_ambient_fields() {
        let (logger, receiver) = channel_logger();
        let logger = logger.with_fields(Fields::new().with("a", 1).with("b", 1));

        logger.log(&Fields::new().with("b", 2)).unwrap();
        let line = receiver.recv().unwrap();

        let mut tokens: Vec<_> = line.split(' ').collect();
        tokens.sort_unstable();
        assert_eq!(tokens, ["a=1", "b=2"]);
        assert_eq!(logger.fields().get("b"), Some(&Value::I64(1)));
    }

    #[test]
    fn test_timestamps_lead_the_line() {
        let (sender, receiver) = mpsc::channel();
        let logger = Logger::new(ChannelSink::new(sender));

        logger.log(&Fields::new().with("at", "x")).unwrap();
        let line = receiver.recv().unwrap();
        assert!(line.starts_with("now="));
        assert!(line.ends_with(" at=x"));
    }

    #[test]
    fn test_child_does_not_touch_parent() {
        let (logger, _receiver) = channel_logger();
        let mut parent = logger.with_fields(Fields::new().with("a", 1));
        let child = parent.child(&Fields::new().with("b", 2));

        parent.add_field("c", 3);
        parent.remove_field("a");

        assert_eq!(child.fields().len(), 2);
        assert_eq!(child.fields().get("a"), Some(&Value::I64(1)));
        assert!(!child.fields().contains_key("c"));
    }

    #[test]
    fn test_merge_returns_a_duplicate() {
        let (logger, _receiver) = channel_logger();
        let logger = logger.with_fields(Fields::new().with("a", 1));

        let mut merged = logger.merge(None);
        merged.insert("a", 2);
        assert_eq!(logger.fields().get("a"), Some(&Value::I64(1)));
    }

    #[test]
    fn test_clones_share_the_sink() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let logger = Logger::new(move |line: &str| -> Result<(), LogError> {
            captured.lock().unwrap().push(line.to_owned());
            Ok(())
        })
        .with_timestamps(false);

        logger.clone().log(&Fields::new().with("n", 1)).unwrap();
        logger.log(&Fields::new().with("n", 2)).unwrap();
        assert_eq!(*lines.lock().unwrap(), ["n=1", "n=2"]);
    }

    #[test]
    fn test_report_error_accepts_plain_errors() {
        let (logger, receiver) = channel_logger();
        let error = std::io::Error::other("disk full");

        logger.report_error(&error, None).unwrap();
        let summary = receiver.recv().unwrap();
        assert!(summary.contains("class=std::io::error::Error"));
        assert!(summary.contains(r#"message="disk full""#));
    }
}
