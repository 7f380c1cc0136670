#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Tracing integration for rootline.
//!
//! This crate connects rootline loggers to the `tracing` ecosystem in both
//! directions:
//!
//! - [`TracingSink`] re-emits every finished rootline line as a `tracing`
//!   event, so lines flow through whatever subscriber is installed.
//! - [`SpanFieldsLayer`] captures span fields as they are recorded, and
//!   [`current_span_fields`] / [`SpanFieldsExt`] merge the fields of the
//!   active spans into log lines and error reports.
//!
//! # How It Works
//!
//! You add [`SpanFieldsLayer`] to your tracing subscriber alongside your
//! existing layers. While your other layers do their work, it copies every
//! span field into the span's extensions, keeping its type. When a line is
//! logged through [`SpanFieldsExt`], the fields of all spans in the current
//! scope are merged, outermost first, and the explicit fields of the call are
//! merged on top.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::mpsc;
//!
//! use rootline::{Logger, fields, sink::ChannelSink};
//! use rootline_tracing::{SpanFieldsExt, SpanFieldsLayer};
//! use tracing_subscriber::{Registry, layer::SubscriberExt};
//!
//! let subscriber = Registry::default().with(SpanFieldsLayer);
//! tracing::subscriber::set_global_default(subscriber).expect("failed to set subscriber");
//!
//! let (sender, receiver) = mpsc::channel();
//! let logger = Logger::new(ChannelSink::new(sender)).with_timestamps(false);
//!
//! let span = tracing::info_span!("request", request_id = 42);
//! let _guard = span.enter();
//! logger.log_in_span(&fields! { "at" => "accepted" }).unwrap();
//!
//! let line = receiver.recv().unwrap();
//! assert!(line.contains("request_id=42"));
//! assert!(line.contains("at=accepted"));
//! ```
//!
//! # Environment Variables
//!
//! - `ROOTLINE_TRACING` - Comma-separated options:
//!   - `leaf_only` - Only use the fields of the innermost span instead of the
//!     whole scope

use std::{error::Error, fmt, sync::OnceLock};

use rootline::{Failure, Fields, LogError, Logger, Sink, Value};
use tracing::{
    Level, Span,
    field::{Field, Visit},
    span::{Attributes, Id, Record},
};
use tracing_subscriber::{
    Layer, Registry,
    layer::Context,
    registry::{LookupSpan, SpanRef},
};

/// The target of events emitted by [`TracingSink`].
pub const TARGET: &str = "rootline";

/// A sink that re-emits each line as a `tracing` event.
///
/// The line is the event message; the event target is [`TARGET`].
///
/// # Examples
///
/// ```
/// use rootline::{Logger, fields};
/// use rootline_tracing::TracingSink;
/// use tracing::Level;
///
/// let logger = Logger::new(TracingSink::new(Level::WARN)).with_timestamps(false);
/// logger.log(&fields! { "at" => "degraded" }).unwrap();
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    /// Creates a sink emitting events at `level`.
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// The level events are emitted at.
    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl Sink for TracingSink {
    fn write_line(&self, line: &str) -> Result<(), LogError> {
        match self.level {
            Level::ERROR => tracing::error!(target: TARGET, "{line}"),
            Level::WARN => tracing::warn!(target: TARGET, "{line}"),
            Level::INFO => tracing::info!(target: TARGET, "{line}"),
            Level::DEBUG => tracing::debug!(target: TARGET, "{line}"),
            _ => tracing::trace!(target: TARGET, "{line}"),
        }
        Ok(())
    }
}

/// Captured field values for a span.
#[derive(Clone, Debug, Default)]
struct CapturedFields(Fields);

struct FieldsVisitor<'a>(&'a mut Fields);

impl Visit for FieldsVisitor<'_> {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name(), value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name(), value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name(), value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        self.0.insert(field.name(), Value::error(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name(), Value::debug(value));
    }
}

/// A tracing layer that captures span fields for rootline lines.
///
/// **Required for [`current_span_fields`] and [`SpanFieldsExt`].** Add this
/// to your subscriber alongside your other layers. Fields recorded later
/// with [`Span::record`] replace the captured values.
///
/// # Examples
///
/// ```
/// use rootline_tracing::SpanFieldsLayer;
/// use tracing_subscriber::{Registry, layer::SubscriberExt};
///
/// let subscriber = Registry::default()
///     .with(SpanFieldsLayer)
///     .with(tracing_subscriber::fmt::layer());
///
/// tracing::subscriber::set_global_default(subscriber).expect("failed to set subscriber");
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct SpanFieldsLayer;

impl<S> Layer<S> for SpanFieldsLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut fields = Fields::new();
        attrs.record(&mut FieldsVisitor(&mut fields));
        span.extensions_mut().insert(CapturedFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<CapturedFields>() {
            Some(captured) => values.record(&mut FieldsVisitor(&mut captured.0)),
            None => {
                let mut fields = Fields::new();
                values.record(&mut FieldsVisitor(&mut fields));
                extensions.insert(CapturedFields(fields));
            }
        }
    }
}

#[derive(Debug)]
struct RootlineTracingEnvOptions {
    leaf_only: bool,
}

impl RootlineTracingEnvOptions {
    fn get() -> &'static Self {
        static ROOTLINE_TRACING_FLAGS: OnceLock<RootlineTracingEnvOptions> = OnceLock::new();

        ROOTLINE_TRACING_FLAGS.get_or_init(|| {
            let mut leaf_only = false;

            if let Some(var) = std::env::var_os("ROOTLINE_TRACING") {
                for v in var.to_string_lossy().split(',') {
                    if v.eq_ignore_ascii_case("leaf_only") {
                        leaf_only = true;
                    }
                }
            }

            RootlineTracingEnvOptions { leaf_only }
        })
    }
}

fn merge_span(fields: &mut Fields, span: &SpanRef<'_, Registry>) {
    if let Some(captured) = span.extensions().get::<CapturedFields>() {
        fields.merge_from(&captured.0);
    }
}

/// The fields of the current span scope, merged from the outermost span to
/// the innermost one.
///
/// Returns no fields when there is no current span or the subscriber is not
/// built on a [`Registry`] with [`SpanFieldsLayer`].
pub fn current_span_fields() -> Fields {
    let leaf_only = RootlineTracingEnvOptions::get().leaf_only;

    Span::current()
        .with_subscriber(|(id, dispatch)| {
            let mut fields = Fields::new();
            let Some(registry) = dispatch.downcast_ref::<Registry>() else {
                return fields;
            };
            let Some(span) = registry.span(id) else {
                return fields;
            };

            if leaf_only {
                merge_span(&mut fields, &span);
            } else {
                for ancestor in span.scope().from_root() {
                    merge_span(&mut fields, &ancestor);
                }
            }
            fields
        })
        .unwrap_or_default()
}

/// Extension trait for logging with the fields of the current span scope.
///
/// Span fields are the lowest-priority layer of context: the explicit fields
/// of the call win over them, and the logger's ambient fields lose to them.
pub trait SpanFieldsExt {
    /// Like [`Logger::log`], with the current span fields merged under
    /// `fields`.
    fn log_in_span(&self, fields: &Fields) -> Result<(), LogError>;

    /// Like [`Logger::report`], with the current span fields merged under
    /// `extra`.
    fn report_in_span(&self, failure: &dyn Failure, extra: Option<&Fields>)
    -> Result<(), LogError>;
}

impl SpanFieldsExt for Logger {
    fn log_in_span(&self, fields: &Fields) -> Result<(), LogError> {
        let mut merged = current_span_fields();
        merged.merge_from(fields);
        self.log(&merged)
    }

    fn report_in_span(
        &self,
        failure: &dyn Failure,
        extra: Option<&Fields>,
    ) -> Result<(), LogError> {
        let mut merged = current_span_fields();
        if let Some(extra) = extra {
            merged.merge_from(extra);
        }
        self.report(failure, Some(&merged))
    }
}
