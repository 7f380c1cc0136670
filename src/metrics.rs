//! Sampled counters, timings and gauges.
//!
//! [`Statter`] is the interface timers send their durations to. [`Logger`]
//! implements it by writing one `metric=<bucket>` line per value, so metrics
//! end up in the same stream as everything else:
//!
//! ```text
//! metric=api.requests count=1
//! metric=api.latency timing=153
//! metric=pool.state gauge=draining
//! ```
//!
//! Each call draws a uniform number in `[0, 1)` and writes nothing when the
//! draw is above the sample rate.

use std::{fmt, sync::Arc, time::Duration};

use crate::{Fields, Logger, Value, hooks, sink::LogError};

/// Receives metric values.
pub trait Statter: Send + Sync {
    /// Increments `bucket` by each of `counts`.
    fn counter(&self, sample_rate: f32, bucket: &str, counts: &[i64]) -> Result<(), LogError>;

    /// Records each of `durations` under `bucket`.
    fn timing(&self, sample_rate: f32, bucket: &str, durations: &[Duration])
    -> Result<(), LogError>;

    /// Sets `bucket` to each of `values`.
    fn gauge(&self, sample_rate: f32, bucket: &str, values: &[&str]) -> Result<(), LogError>;
}

fn sampled(sample_rate: f32) -> bool {
    rand::random::<f32>() <= sample_rate
}

impl Logger {
    fn log_metric<V>(
        &self,
        sample_rate: f32,
        bucket: &str,
        kind: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<(), LogError>
    where
        V: Into<Value>,
    {
        if !sampled(sample_rate) {
            return Ok(());
        }
        for value in values {
            self.log(&Fields::new().with("metric", bucket).with(kind, value))?;
        }
        Ok(())
    }
}

impl Statter for Logger {
    fn counter(&self, sample_rate: f32, bucket: &str, counts: &[i64]) -> Result<(), LogError> {
        self.log_metric(sample_rate, bucket, "count", counts.iter().copied())
    }

    fn timing(
        &self,
        sample_rate: f32,
        bucket: &str,
        durations: &[Duration],
    ) -> Result<(), LogError> {
        let millis = durations
            .iter()
            .map(|duration| i64::try_from(duration.as_millis()).unwrap_or(i64::MAX));
        self.log_metric(sample_rate, bucket, "timing", millis)
    }

    fn gauge(&self, sample_rate: f32, bucket: &str, values: &[&str]) -> Result<(), LogError> {
        self.log_metric(sample_rate, bucket, "gauge", values.iter().copied())
    }
}

/// Where a [`Timer`](crate::Timer) sends its duration.
///
/// Without an explicit statter the process-wide logger from
/// [`hooks::current`] receives the timing.
#[derive(Clone)]
pub struct StatterConfig {
    statter: Option<Arc<dyn Statter>>,
    sample_rate: f32,
    bucket: String,
}

impl Default for StatterConfig {
    fn default() -> Self {
        Self {
            statter: None,
            sample_rate: 1.0,
            bucket: String::new(),
        }
    }
}

impl StatterConfig {
    /// Sends timings to `statter` under `bucket`.
    pub fn new(statter: Arc<dyn Statter>, sample_rate: f32, bucket: impl Into<String>) -> Self {
        Self {
            statter: Some(statter),
            sample_rate,
            bucket: bucket.into(),
        }
    }

    /// Sends timings to the process-wide logger under `bucket`.
    pub fn with_default_statter(sample_rate: f32, bucket: impl Into<String>) -> Self {
        Self {
            statter: None,
            sample_rate,
            bucket: bucket.into(),
        }
    }

    /// The current bucket.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The sample rate handed to the statter.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Appends `suffix` to the bucket.
    ///
    /// `api` becomes `api.latency`, `api.` becomes `api.latency`, and an
    /// empty bucket becomes `latency`.
    pub fn bucket_suffix(&mut self, suffix: &str) {
        if !self.bucket.is_empty() && !self.bucket.ends_with('.') {
            self.bucket.push('.');
        }
        self.bucket.push_str(suffix);
    }

    /// Sends one timing.
    pub fn timing(&self, duration: Duration) -> Result<(), LogError> {
        match &self.statter {
            Some(statter) => statter.timing(self.sample_rate, &self.bucket, &[duration]),
            None => hooks::current().timing(self.sample_rate, &self.bucket, &[duration]),
        }
    }
}

impl fmt::Debug for StatterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatterConfig")
            .field("has_statter", &self.statter.is_some())
            .field("sample_rate", &self.sample_rate)
            .field("bucket", &self.bucket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, mpsc};

    use super::*;
    use crate::sink::ChannelSink;

    fn channel_logger() -> (Logger, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel();
        let logger = Logger::new(ChannelSink::new(sender)).with_timestamps(false);
        (logger, receiver)
    }

    fn sorted_tokens(line: &str) -> Vec<&str> {
        let mut tokens: Vec<_> = line.split(' ').collect();
        tokens.sort_unstable();
        tokens
    }

    #[derive(Default)]
    struct RecordingStatter {
        timings: Mutex<Vec<(f32, String, Duration)>>,
    }

    impl Statter for RecordingStatter {
        fn counter(&self, _: f32, _: &str, _: &[i64]) -> Result<(), LogError> {
            Ok(())
        }

        fn timing(
            &self,
            sample_rate: f32,
            bucket: &str,
            durations: &[Duration],
        ) -> Result<(), LogError> {
            let mut timings = self.timings.lock().unwrap();
            for duration in durations {
                timings.push((sample_rate, bucket.to_owned(), *duration));
            }
            Ok(())
        }

        fn gauge(&self, _: f32, _: &str, _: &[&str]) -> Result<(), LogError> {
            Ok(())
        }
    }

    #[test]
    fn test_logger_writes_one_line_per_value() {
        let (logger, receiver) = channel_logger();

        logger.counter(1.0, "api.requests", &[1, 2]).unwrap();
        logger
            .timing(1.0, "api.latency", &[Duration::from_micros(153_900)])
            .unwrap();
        logger.gauge(1.0, "pool.state", &["draining"]).unwrap();

        let lines: Vec<_> = receiver.try_iter().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(sorted_tokens(&lines[0]), ["count=1", "metric=api.requests"]);
        assert_eq!(sorted_tokens(&lines[1]), ["count=2", "metric=api.requests"]);
        assert_eq!(sorted_tokens(&lines[2]), ["metric=api.latency", "timing=153"]);
        assert_eq!(sorted_tokens(&lines[3]), ["gauge=draining", "metric=pool.state"]);
    }

    #[test]
    fn test_negative_rate_is_never_sampled() {
        let (logger, receiver) = channel_logger();
        logger.counter(-1.0, "skipped", &[1]).unwrap();
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_bucket_suffix() {
        let mut config = StatterConfig::with_default_statter(1.0, "api");
        config.bucket_suffix("latency");
        assert_eq!(config.bucket(), "api.latency");

        let mut config = StatterConfig::with_default_statter(1.0, "api.");
        config.bucket_suffix("latency");
        assert_eq!(config.bucket(), "api.latency");

        let mut config = StatterConfig::default();
        config.bucket_suffix("latency");
        assert_eq!(config.bucket(), "latency");
        assert_eq!(config.sample_rate(), 1.0);
    }

    #[test]
    fn test_config_timing_uses_configured_statter() {
        let statter = Arc::new(RecordingStatter::default());
        let config = StatterConfig::new(statter.clone(), 0.5, "jobs");

        config.timing(Duration::from_millis(12)).unwrap();
        assert_eq!(
            *statter.timings.lock().unwrap(),
            [(0.5, "jobs".to_owned(), Duration::from_millis(12))]
        );
    }
}
