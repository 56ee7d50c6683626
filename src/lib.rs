//! Cached, typed client for the hadith catalog service.
//!
//! - [`rpc`]: operation catalog, transport, and [`rpc::RpcClient`].
//! - [`cache`]: TTL response cache behind the [`cache::ResponseCache`] seam.
//! - [`catalog`]: cached reads used by page rendering.
//! - [`sidebar`]: lazily expanded collection tree with per-key fetch dedup.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod infra;
pub mod rpc;
pub mod sidebar;

pub use context::ReaderContext;
pub use error::AppError;
