use metrics::counter;
use tracing::{error, warn};

use super::error::{ApiError, ApiErrorKind};
use super::operations::HttpMethod;

pub(crate) const METRIC_RPC_ERRORS: &str = "hadith_rpc_errors_total";

/// Where a failed call was headed.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    pub operation: Option<&'static str>,
    pub method: HttpMethod,
    pub url: &'a str,
    pub request_id: &'a str,
}

/// Receives every remote-call failure before it is returned to the caller.
///
/// Reporting is a side effect only; implementations must not panic or
/// block.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &ApiError, context: &ErrorContext<'_>);
}

/// Structured log line plus an error counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, err: &ApiError, context: &ErrorContext<'_>) {
        let operation = context.operation.unwrap_or("raw");
        counter!(
            METRIC_RPC_ERRORS,
            "operation" => operation,
            "kind" => kind_label(err.kind)
        )
        .increment(1);

        // 4xx is usually the caller's problem; keep it out of error alerts.
        if err.kind == ApiErrorKind::HttpStatus && err.status < 500 {
            warn!(
                operation,
                method = context.method.as_str(),
                url = context.url,
                request_id = context.request_id,
                status = err.status,
                trace_id = err.trace_id.as_deref().unwrap_or(""),
                message = %err.message,
                "remote call rejected"
            );
        } else {
            error!(
                operation,
                method = context.method.as_str(),
                url = context.url,
                request_id = context.request_id,
                status = err.status,
                kind = kind_label(err.kind),
                trace_id = err.trace_id.as_deref().unwrap_or(""),
                message = %err.message,
                "remote call failed"
            );
        }
    }
}

fn kind_label(kind: ApiErrorKind) -> &'static str {
    match kind {
        ApiErrorKind::Network => "network",
        ApiErrorKind::HttpStatus => "http_status",
        ApiErrorKind::Decode => "decode",
        ApiErrorKind::Request => "request",
    }
}
