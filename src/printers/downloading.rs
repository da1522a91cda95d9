use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::traits::{ContentKind, PrettyPrinter, PrettyPrinterFactory, PrinterError};
use crate::fetch::{FetchExecutor, FetchHandle};

/// Formatting capability behind the downloading factory
///
/// Implementations match a response header to a schema URI and turn payload
/// bytes plus resolved schema text into prettified output. Both methods run
/// off the caller's thread: `parse_header` at printer creation (cheap, no
/// I/O) and `format` inside the bounded render worker.
pub trait SchemaFormat: Send + Sync {
    /// Extract the schema URI from a response header, or `None` if this
    /// header carries no usable fetch target
    fn parse_header(&self, header_name: &str, header_value: &str) -> Option<String>;

    /// Format the payload using the downloaded schema text
    fn format(&self, payload: &[u8], schema: &str) -> Result<String, PrinterError>;

    /// The type of prettified content this format produces
    fn content_kind(&self) -> ContentKind;
}

/// Factory whose printers depend on a schema downloaded in the background
///
/// `create_printer` parses the header, validates the URI and enqueues the
/// fetch on the shared executor; it never blocks. The returned printer
/// holds the fetch handle and waits on it (bounded by `schema_wait`) when
/// rendered.
pub struct DownloadingFactory {
    format: Arc<dyn SchemaFormat>,
    executor: Arc<FetchExecutor>,
    schema_wait: Duration,
}

impl DownloadingFactory {
    pub fn new(
        format: Arc<dyn SchemaFormat>,
        executor: Arc<FetchExecutor>,
        schema_wait: Duration,
    ) -> Self {
        Self {
            format,
            executor,
            schema_wait,
        }
    }
}

impl PrettyPrinterFactory for DownloadingFactory {
    fn create_printer(
        &self,
        header_name: &str,
        header_value: &str,
    ) -> Option<Arc<dyn PrettyPrinter>> {
        let uri = self.format.parse_header(header_name, header_value)?;

        // Cannot pretty print without a well-formed schema location
        if let Err(e) = reqwest::Url::parse(&uri) {
            debug!(header_name, %uri, error = %e, "Malformed schema URI, no printer");
            return None;
        }

        let handle = self.executor.submit(uri);
        Some(Arc::new(DownloadingPrinter {
            handle,
            format: Arc::clone(&self.format),
            schema_wait: self.schema_wait,
        }))
    }

    fn content_kind(&self) -> ContentKind {
        self.format.content_kind()
    }
}

struct DownloadingPrinter {
    handle: FetchHandle,
    format: Arc<dyn SchemaFormat>,
    schema_wait: Duration,
}

#[async_trait]
impl PrettyPrinter for DownloadingPrinter {
    async fn render(&self, payload: &[u8]) -> Result<String, PrinterError> {
        let schema = self.handle.wait(self.schema_wait).await?;
        self.format.format(payload, &schema)
    }
}

/// Factory for trivial formatters that need no schema download
///
/// The wrapped format is invoked with an empty schema and no fetch is ever
/// scheduled.
pub struct SimpleFactory {
    format: Arc<dyn SchemaFormat>,
}

impl SimpleFactory {
    pub fn new(format: Arc<dyn SchemaFormat>) -> Self {
        Self { format }
    }
}

impl PrettyPrinterFactory for SimpleFactory {
    fn create_printer(
        &self,
        _header_name: &str,
        _header_value: &str,
    ) -> Option<Arc<dyn PrettyPrinter>> {
        Some(Arc::new(SimplePrinter {
            format: Arc::clone(&self.format),
        }))
    }

    fn content_kind(&self) -> ContentKind {
        self.format.content_kind()
    }
}

struct SimplePrinter {
    format: Arc<dyn SchemaFormat>,
}

#[async_trait]
impl PrettyPrinter for SimplePrinter {
    async fn render(&self, payload: &[u8]) -> Result<String, PrinterError> {
        self.format.format(payload, "")
    }
}
