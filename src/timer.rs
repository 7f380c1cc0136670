//! Timing a block of work.
//!
//! A [`Timer`] is started by [`Logger::timer`], which logs `at=start`. Every
//! [`Timer::log`] call carries the time elapsed so far, and
//! [`Timer::finish`] logs `at=finish` with the total and hands the duration
//! to the timer's statter.
//!
//! # Examples
//!
//! ```
//! use std::sync::mpsc;
//!
//! use rootline::{Logger, fields, sink::ChannelSink};
//!
//! let (sender, receiver) = mpsc::channel();
//! let logger = Logger::new(ChannelSink::new(sender)).with_timestamps(false);
//!
//! let timer = logger.timer(&fields! { "fn" => "import" }).unwrap();
//! timer.log(&fields! { "at" => "parsed" }).unwrap();
//! # drop(timer);
//!
//! let start = receiver.recv().unwrap();
//! assert!(start.contains("at=start"));
//! assert!(start.contains("fn=import"));
//! assert!(receiver.recv().unwrap().contains("elapsed="));
//! ```

use std::time::{Duration, Instant};

use crate::{Fields, Logger, Value, metrics::StatterConfig, sink::LogError};

/// The unit of the `elapsed` field.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Fractional seconds.
    #[default]
    Seconds,
    /// Fractional milliseconds.
    Milliseconds,
}

impl TimeUnit {
    /// Converts `duration` to this unit.
    pub fn convert(self, duration: Duration) -> f64 {
        match self {
            Self::Seconds => duration.as_secs_f64(),
            Self::Milliseconds => duration.as_secs_f64() * 1000.0,
        }
    }
}

/// A running timer.
#[derive(Debug)]
pub struct Timer {
    started: Instant,
    time_unit: TimeUnit,
    logger: Logger,
    statter: StatterConfig,
}

impl Timer {
    pub(crate) fn start(logger: Logger) -> Result<Self, LogError> {
        logger.log(&Fields::new().with("at", "start"))?;
        Ok(Self {
            started: Instant::now(),
            time_unit: logger.time_unit(),
            statter: logger.statter().clone(),
            logger,
        })
    }

    /// When the timer was started.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// The time since the timer was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The unit `elapsed` is reported in.
    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Changes the unit `elapsed` is reported in.
    pub fn set_time_unit(&mut self, time_unit: TimeUnit) {
        self.time_unit = time_unit;
    }

    /// Sets a field on every later line of this timer.
    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.logger.add_field(key, value);
    }

    /// Removes a field from every later line of this timer.
    pub fn remove_field(&mut self, key: &str) {
        self.logger.remove_field(key);
    }

    /// Appends `suffix` to the bucket the final duration is sent to.
    pub fn statter_bucket_suffix(&mut self, suffix: &str) {
        self.statter.bucket_suffix(suffix);
    }

    /// Logs `fields` together with the elapsed time so far.
    pub fn log(&self, fields: &Fields) -> Result<(), LogError> {
        let mut fields = fields.clone();
        fields.insert("elapsed", self.time_unit.convert(self.elapsed()));
        self.logger.log(&fields)
    }

    /// Logs `at=finish` with the total elapsed time and sends the duration to
    /// the statter.
    pub fn finish(self) -> Result<(), LogError> {
        self.finish_with(&self.logger)
    }

    /// Like [`finish`](Self::finish), but logs through `logger`.
    pub fn finish_with(&self, logger: &Logger) -> Result<(), LogError> {
        let elapsed = self.elapsed();
        logger.log(
            &Fields::new()
                .with("at", "finish")
                .with("elapsed", self.time_unit.convert(elapsed)),
        )?;
        self.statter.timing(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, mpsc};

    use super::*;
    use crate::{metrics::Statter, sink::ChannelSink};

    fn channel_logger() -> (Logger, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel();
        let logger = Logger::new(ChannelSink::new(sender)).with_timestamps(false);
        (logger, receiver)
    }

    fn elapsed_of(line: &str) -> f64 {
        line.split(' ')
            .find_map(|token| token.strip_prefix("elapsed="))
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn test_time_unit_conversion() {
        let duration = Duration::from_millis(1500);
        assert_eq!(TimeUnit::Seconds.convert(duration), 1.5);
        assert_eq!(TimeUnit::Milliseconds.convert(duration), 1500.0);
    }

    #[test]
    fn test_finish_logs_and_sends_timing() {
        let (metric_sender, metric_receiver) = mpsc::channel();
        let metrics = Logger::new(ChannelSink::new(metric_sender)).with_timestamps(false);

        let (logger, receiver) = channel_logger();
        let logger = logger
            .with_time_unit(TimeUnit::Milliseconds)
            .with_statter(StatterConfig::new(Arc::new(metrics), 1.0, "jobs"));

        let mut timer = logger.timer(&Fields::new().with("fn", "import")).unwrap();
        timer.statter_bucket_suffix("import");
        timer.add_field("rows", 10);
        timer.finish().unwrap();

        let start = receiver.recv().unwrap();
        assert!(start.contains("at=start"));
        assert!(!start.contains("elapsed="));

        let finish = receiver.recv().unwrap();
        assert!(finish.contains("at=finish"));
        assert!(finish.contains("fn=import"));
        assert!(finish.contains("rows=10"));
        assert!(elapsed_of(&finish) >= 0.0);

        let metric = metric_receiver.recv().unwrap();
        assert!(metric.contains("metric=jobs.import"));
        assert!(metric.contains("timing="));
    }

    #[test]
    fn test_finish_with_other_logger() {
        let (logger, receiver) = channel_logger();
        let (other, other_receiver) = channel_logger();
        let recorded = Arc::new(Mutex::new(Vec::new()));

        struct Recorder(Arc<Mutex<Vec<String>>>);

        impl Statter for Recorder {
            fn counter(&self, _: f32, _: &str, _: &[i64]) -> Result<(), LogError> {
                Ok(())
            }

            fn timing(&self, _: f32, bucket: &str, _: &[Duration]) -> Result<(), LogError> {
                self.0.lock().unwrap().push(bucket.to_owned());
                Ok(())
            }

            fn gauge(&self, _: f32, _: &str, _: &[&str]) -> Result<(), LogError> {
                Ok(())
            }
        }

        let logger = logger.with_statter(StatterConfig::new(
            Arc::new(Recorder(Arc::clone(&recorded))),
            1.0,
            "batch",
        ));
        let timer = logger.timer(&Fields::new()).unwrap();
        timer.finish_with(&other).unwrap();

        assert!(receiver.recv().unwrap().contains("at=start"));
        assert!(receiver.try_recv().is_err());
        assert!(other_receiver.recv().unwrap().contains("at=finish"));
        assert_eq!(*recorded.lock().unwrap(), ["batch"]);
    }

    #[test]
    fn test_log_overrides_elapsed() {
        let (logger, receiver) = channel_logger();
        let timer = logger.timer(&Fields::new()).unwrap();
        timer
            .log(&Fields::new().with("elapsed", "caller").with("at", "step"))
            .unwrap();

        let _start = receiver.recv().unwrap();
        let step = receiver.recv().unwrap();
        assert!(step.contains("at=step"));
        assert!(elapsed_of(&step) >= 0.0);
    }
}
