//! Typed remote calls to the catalog and account service.
//!
//! [`Transport`] executes a single HTTP exchange; [`RpcClient`] drives it
//! from the declarations in [`operations`].

mod auth;
mod client;
mod error;
pub mod operations;
mod report;
mod transport;

pub use auth::{AUTH_COOKIE, AuthState, NoSession, SessionToken, TokenSource, token_from_cookies};
pub use client::{CallOptions, Reply, RpcClient};
pub use error::{ApiError, ApiErrorKind, NETWORK_STATUS};
pub use operations::{HttpMethod, Operation, RequestDescriptor};
pub use report::{ErrorContext, ErrorReporter, TracingReporter};
pub use transport::{
    DEVELOPMENT_INTERNAL_URL, Endpoints, ExecutionContext, RequestBody, RequestOptions,
    Transport, TransportConfig, TransportResponse, default_user_agent,
};

pub(crate) use report::METRIC_RPC_ERRORS;
pub(crate) use transport::{METRIC_RPC_LATENCY_MS, METRIC_RPC_REQUESTS};
