//! Destinations for finished log lines.
//!
//! A [`Sink`] receives one finished line at a time and writes it somewhere.
//! It never sees fields, only text, and it must not reformat what it gets.
//!
//! Built-in sinks:
//!
//! - [`WriterSink`] writes to any [`io::Write`], one `write_all` per line;
//!   see [`stdout`] and [`stderr`].
//! - [`ChannelSink`] forwards lines over an [`mpsc`] channel, which is handy
//!   for tests and for handing lines to a background writer.
//! - Any closure `Fn(&str) -> Result<(), LogError>`.
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
//! logger.log(&fields! { "at" => "start" }).unwrap();
//! assert_eq!(receiver.recv().unwrap(), "at=start");
//! ```

use std::{
    error::Error,
    fmt, io,
    sync::{Mutex, PoisonError, mpsc},
};

use crate::error::BoxError;

/// Errors raised while emitting a line or reporting a failure.
#[derive(Debug)]
#[non_exhaustive]
pub enum LogError {
    /// The underlying writer failed.
    Io(io::Error),
    /// The receiving end of a [`ChannelSink`] is gone.
    Disconnected,
    /// An external [`ErrorReporter`](crate::ErrorReporter) failed.
    Reporter(BoxError),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "failed to write log line: {error}"),
            Self::Disconnected => write!(f, "log channel is disconnected"),
            Self::Reporter(error) => write!(f, "error reporter failed: {error}"),
        }
    }
}

impl Error for LogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Disconnected => None,
            Self::Reporter(error) => Some(&**error),
        }
    }
}

impl From<io::Error> for LogError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// A destination for finished log lines.
pub trait Sink: Send + Sync {
    /// Writes one line. `line` carries no trailing newline.
    fn write_line(&self, line: &str) -> Result<(), LogError>;
}

impl<F> Sink for F
where
    F: Fn(&str) -> Result<(), LogError> + Send + Sync,
{
    fn write_line(&self, line: &str) -> Result<(), LogError> {
        self(line)
    }
}

/// Writes newline-terminated lines to an [`io::Write`].
///
/// Each line, including its newline, is handed to the writer in a single
/// `write_all` call while holding a lock, so lines from different threads do
/// not interleave within this sink.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W> WriterSink<W>
where
    W: io::Write + Send,
{
    /// Creates a sink that writes to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> Sink for WriterSink<W>
where
    W: io::Write + Send,
{
    fn write_line(&self, line: &str) -> Result<(), LogError> {
        let mut buffer = String::with_capacity(line.len() + 1);
        buffer.push_str(line);
        buffer.push('\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(buffer.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink").finish_non_exhaustive()
    }
}

/// A sink writing to standard output.
pub fn stdout() -> WriterSink<io::Stdout> {
    WriterSink::new(io::stdout())
}

/// A sink writing to standard error.
pub fn stderr() -> WriterSink<io::Stderr> {
    WriterSink::new(io::stderr())
}

/// Sends every line over a channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<String>,
}

impl ChannelSink {
    /// Creates a sink that sends lines to `sender`.
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }
}

impl Sink for ChannelSink {
    fn write_line(&self, line: &str) -> Result<(), LogError> {
        self.sender
            .send(line.to_owned())
            .map_err(|_| LogError::Disconnected)
    }
}
