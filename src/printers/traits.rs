use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::fetch::FetchError;

/// Printer errors surfaced at render time
///
/// These never escape a body read; the store degrades to raw content and a
/// diagnostic line instead.
#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("formatting failed: {0}")]
    Format(String),

    #[error("schema fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Hint for the type of prettified content
///
/// Consumed by the protocol layer before rendering completes, to make a
/// hopeful guess at a MIME-like type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Html,
    Text,
    Other,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Json => "JSON",
            ContentKind::Html => "Html",
            ContentKind::Text => "Text",
            ContentKind::Other => "Other",
        };
        f.write_str(name)
    }
}

/// A pretty printer bound to a single response
///
/// The printer lives for exactly one response body and is never reused
/// across requests. Rendering may wait (bounded) on a schema fetch that was
/// started when the printer was created.
#[async_trait]
pub trait PrettyPrinter: Send + Sync {
    /// Render the payload bytes into prettified text
    async fn render(&self, payload: &[u8]) -> Result<String, PrinterError>;
}

/// Factory producing pretty printers for a registered header name
pub trait PrettyPrinterFactory: Send + Sync {
    /// Create a printer for one response. This method must not block: any
    /// schema download is deferred to the fetch executor. Returns `None` if
    /// the header value cannot be parsed into a usable fetch target, which
    /// callers treat as "no pretty printing available".
    fn create_printer(
        &self,
        header_name: &str,
        header_value: &str,
    ) -> Option<Arc<dyn PrettyPrinter>>;

    /// The type of prettified content, reported before rendering completes
    fn content_kind(&self) -> ContentKind;
}
