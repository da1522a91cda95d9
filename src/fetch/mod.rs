//! Background schema fetching
//!
//! Pretty printers may need auxiliary schema data downloaded from a URI
//! embedded in a response header. Downloads run on a small fixed-size worker
//! pool so that printer creation never blocks; callers get back a
//! [`FetchHandle`] they can wait on with a bounded timeout at render time.
//!
//! ## Key Components
//!
//! - [`SchemaFetcher`] - Transport capability (`fetch(uri) -> text`)
//! - [`SchemaClient`] - Production fetcher backed by reqwest
//! - [`FetchExecutor`] - Worker pool with round-robin dispatch
//! - [`FetchHandle`] - Cancellable, awaitable one-shot result

mod client;
mod executor;

pub use client::SchemaClient;
pub use executor::{FetchExecutor, FetchHandle, FetchOutcome};

use async_trait::async_trait;
use thiserror::Error;

/// Fetch failures, surfaced only as render-time degradation
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("I/O failure: {0}")]
    Io(String),

    #[error("Fetch timed out")]
    TimedOut,

    #[error("Fetch cancelled")]
    Cancelled,

    #[error("Fetch executor shut down")]
    Shutdown,
}

/// Byte-stream transport for schema downloads
///
/// The production implementation is [`SchemaClient`]; tests substitute stubs
/// with controllable latency and outcomes.
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    /// Fetch the resource at `uri` and decode it as UTF-8 text
    async fn fetch(&self, uri: &str) -> Result<String, FetchError>;
}
