//! Span fields merged into rootline lines and reports.
//!
//! Every line logged through `SpanFieldsExt` carries the fields of the spans
//! that are active when it is written, so `request_id` and `endpoint` show up
//! on the failure summary and on every `site=` line below it.

use rootline::{Logger, WrappedError, fields};
use rootline_tracing::{SpanFieldsExt, SpanFieldsLayer};
use tracing::instrument;
use tracing_subscriber::{Registry, layer::SubscriberExt};

#[derive(Debug, thiserror::Error)]
#[error("permission denied")]
struct PermissionError;

#[instrument]
fn check_user_permission(user_id: u64) -> Result<(), WrappedError> {
    Err(WrappedError::wrap_with_message(
        PermissionError,
        format!("user {user_id} may not read reports"),
    ))
}

#[instrument(skip(logger))]
fn handle_api_request(logger: &Logger, request_id: &str, endpoint: &str) {
    logger
        .log_in_span(&fields! { "at" => "start" })
        .expect("failed to log");

    if let Err(error) = check_user_permission(12345) {
        logger
            .report_in_span(&error, Some(&fields! { "status" => 403 }))
            .expect("failed to report");
    }
}

fn main() {
    let subscriber = Registry::default().with(SpanFieldsLayer);
    tracing::subscriber::set_global_default(subscriber).expect("failed to set default subscriber");

    let logger = Logger::stdout().with_fields(fields! { "app" => "reports" });
    handle_api_request(&logger, "req-7f3a", "/api/reports");
}
