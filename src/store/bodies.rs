use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info, warn};

use super::{Result, StoreError};
use crate::observability::Metrics;
use crate::printers::PrettyPrinter;
use crate::render::{RenderExecutor, RenderOutcome};

const ENCODING_RAW: u8 = 0;
const ENCODING_BASE64: u8 = 1;

/// Caller-visible result of a body read
#[derive(Debug, Clone)]
pub struct BodyData {
    /// Whether the body was persisted base64-encoded
    pub base64_encoded: bool,
    /// Rendered text, or raw decoded text (possibly diagnostic-prefixed)
    pub content: String,
}

/// Durable store for captured response bodies plus the printer association
/// table
///
/// Body records are immutable once their sink is finished. At most one
/// printer can be associated with a request id; the association is consulted
/// fresh on every read, and a printer malfunction degrades the read to raw
/// content instead of failing it.
pub struct ResponseBodyStore {
    bodies: PartitionHandle,
    printers: Mutex<HashMap<String, Arc<dyn PrettyPrinter>>>,
    render: RenderExecutor,
    metrics: Arc<Metrics>,
}

impl ResponseBodyStore {
    pub fn new(keyspace: &Keyspace, render: RenderExecutor, metrics: Arc<Metrics>) -> Result<Self> {
        let bodies = keyspace.open_partition("bodies", PartitionCreateOptions::default())?;
        Ok(Self {
            bodies,
            printers: Mutex::new(HashMap::new()),
            render,
            metrics,
        })
    }

    /// Open a sink for one response body
    ///
    /// Fails with `DuplicateBody` if a record already exists; bodies are
    /// never overwritten. With `base64_encode` set, bytes are base64-encoded
    /// before persistence and the marker byte records that for `read`.
    pub fn open(&self, request_id: &str, base64_encode: bool) -> Result<BodySink> {
        if self.bodies.contains_key(request_id)? {
            return Err(StoreError::DuplicateBody(request_id.to_string()));
        }

        Ok(BodySink {
            partition: self.bodies.clone(),
            key: request_id.to_string(),
            base64_encode,
            buf: Vec::new(),
            metrics: Arc::clone(&self.metrics),
        })
    }

    /// Associate a pretty printer with a request id
    ///
    /// At most one association per id; a second attempt fails with
    /// `DuplicateAssociation` and leaves the first in effect. Associating
    /// before the body write completes is allowed; the association is
    /// visible to every read that starts afterwards.
    pub fn associate(&self, request_id: &str, printer: Arc<dyn PrettyPrinter>) -> Result<()> {
        let mut printers = self.printers.lock().unwrap();
        if printers.contains_key(request_id) {
            return Err(StoreError::DuplicateAssociation(request_id.to_string()));
        }
        printers.insert(request_id.to_string(), printer);
        debug!(request_id, "Associated pretty printer");
        Ok(())
    }

    /// Read a body back, pretty printing it if a printer is associated
    ///
    /// Printer malfunctions (timeout, render failure, fetch failure) degrade
    /// to the raw decoded text behind a one-line diagnostic; only
    /// storage-layer faults propagate as errors. Renders are re-attempted on
    /// every read.
    pub async fn read(&self, request_id: &str) -> Result<BodyData> {
        let entry = self
            .bodies
            .get(request_id)?
            .ok_or_else(|| StoreError::UnknownRequestId(request_id.to_string()))?;

        let (marker, payload) = entry.split_first().ok_or_else(|| StoreError::CorruptRecord {
            request_id: request_id.to_string(),
            reason: "empty record, missing encoding marker".to_string(),
        })?;

        let base64_encoded = *marker != ENCODING_RAW;
        let bytes = if base64_encoded {
            BASE64
                .decode(payload)
                .map_err(|e| StoreError::CorruptRecord {
                    request_id: request_id.to_string(),
                    reason: format!("base64 decode failed: {}", e),
                })?
        } else {
            payload.to_vec()
        };

        let printer = self.printers.lock().unwrap().get(request_id).cloned();

        let content = match printer {
            None => String::from_utf8_lossy(&bytes).into_owned(),
            Some(printer) => match self.render.render(printer, bytes.clone()).await {
                RenderOutcome::Rendered(text) => {
                    self.metrics.render_completed();
                    text
                }
                RenderOutcome::TimedOut => {
                    self.metrics.render_degraded();
                    warn!(request_id, "Pretty printing timed out, serving raw body");
                    degraded_content("render timed out", &bytes)
                }
                RenderOutcome::Failed(reason) => {
                    self.metrics.render_degraded();
                    warn!(request_id, reason = %reason, "Pretty printing failed, serving raw body");
                    degraded_content(&reason, &bytes)
                }
            },
        };

        Ok(BodyData {
            base64_encoded,
            content,
        })
    }

    /// Purge every body record and clear the association table
    ///
    /// Invoked at session boundaries (first/last peer attach/detach), not
    /// per request.
    pub fn cleanup(&self) -> Result<()> {
        let keys: Vec<_> = self
            .bodies
            .iter()
            .map(|item| item.map(|(k, _)| k))
            .collect::<std::result::Result<_, fjall::Error>>()?;

        for key in &keys {
            self.bodies.remove(key.clone())?;
        }
        self.printers.lock().unwrap().clear();

        info!(purged = keys.len(), "Cleaned up response body store");
        Ok(())
    }
}

fn degraded_content(reason: &str, raw: &[u8]) -> String {
    format!(
        "Failed to pretty print response body: {}\n{}",
        reason,
        String::from_utf8_lossy(raw)
    )
}

/// Buffering sink for one response body
///
/// Bytes accumulate in memory; `finish` applies the encoding, prepends the
/// marker byte, and persists the record atomically.
pub struct BodySink {
    partition: PartitionHandle,
    key: String,
    base64_encode: bool,
    buf: Vec<u8>,
    metrics: Arc<Metrics>,
}

impl BodySink {
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn finish(self) -> Result<()> {
        // A second sink opened before the first finished must not clobber
        // the record; bodies are immutable once persisted
        if self.partition.contains_key(self.key.as_str())? {
            return Err(StoreError::DuplicateBody(self.key));
        }

        let mut record = Vec::with_capacity(self.buf.len() + self.buf.len() / 2 + 1);
        if self.base64_encode {
            record.push(ENCODING_BASE64);
            record.extend_from_slice(BASE64.encode(&self.buf).as_bytes());
        } else {
            record.push(ENCODING_RAW);
            record.extend_from_slice(&self.buf);
        }

        self.partition.insert(self.key.as_str(), record)?;
        self.metrics.body_stored();
        debug!(request_id = %self.key, size = self.buf.len(), "Body persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printers::PrinterError;
    use crate::store::open_keyspace;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    struct UppercasePrinter;

    #[async_trait]
    impl PrettyPrinter for UppercasePrinter {
        async fn render(&self, payload: &[u8]) -> std::result::Result<String, PrinterError> {
            Ok(String::from_utf8_lossy(payload).to_uppercase())
        }
    }

    struct BrokenPrinter;

    #[async_trait]
    impl PrettyPrinter for BrokenPrinter {
        async fn render(&self, _payload: &[u8]) -> std::result::Result<String, PrinterError> {
            Err(PrinterError::Format("bad input".to_string()))
        }
    }

    fn create_store() -> (ResponseBodyStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let keyspace = open_keyspace(temp_dir.path().join("store")).unwrap();
        let store = ResponseBodyStore::new(
            &keyspace,
            RenderExecutor::new(Duration::from_secs(1)),
            Arc::new(Metrics::new()),
        )
        .unwrap();
        (store, temp_dir)
    }

    fn write_body(store: &ResponseBodyStore, request_id: &str, encode: bool, bytes: &[u8]) {
        let mut sink = store.open(request_id, encode).unwrap();
        sink.write(bytes);
        sink.finish().unwrap();
    }

    #[tokio::test]
    async fn test_raw_round_trip() {
        let (store, _temp) = create_store();
        write_body(&store, "42", false, b"hello world");

        let data = store.read("42").await.unwrap();
        assert!(!data.base64_encoded);
        assert_eq!(data.content, "hello world");
    }

    #[tokio::test]
    async fn test_base64_round_trip() {
        let (store, _temp) = create_store();
        let payload: Vec<u8> = (0..=255u8).collect();
        write_body(&store, "42", true, &payload);

        let data = store.read("42").await.unwrap();
        assert!(data.base64_encoded);
        // Arbitrary binary decodes back to the exact original bytes
        assert_eq!(
            data.content,
            String::from_utf8_lossy(&payload).into_owned()
        );
    }

    #[tokio::test]
    async fn test_read_unknown_id_fails() {
        let (store, _temp) = create_store();
        let result = store.read("missing").await;
        assert!(matches!(result, Err(StoreError::UnknownRequestId(_))));
    }

    #[tokio::test]
    async fn test_open_twice_rejected() {
        let (store, _temp) = create_store();
        write_body(&store, "42", false, b"first");

        let result = store.open("42", false);
        assert!(matches!(result, Err(StoreError::DuplicateBody(_))));
    }

    #[tokio::test]
    async fn test_second_sink_cannot_overwrite_finished_body() {
        let (store, _temp) = create_store();
        let mut first = store.open("42", false).unwrap();
        let mut second = store.open("42", false).unwrap();

        first.write(b"original");
        first.finish().unwrap();

        second.write(b"clobber");
        assert!(matches!(second.finish(), Err(StoreError::DuplicateBody(_))));

        let data = store.read("42").await.unwrap();
        assert_eq!(data.content, "original");
    }

    #[tokio::test]
    async fn test_duplicate_association_keeps_first_printer() {
        let (store, _temp) = create_store();
        write_body(&store, "42", false, b"hello");

        store.associate("42", Arc::new(UppercasePrinter)).unwrap();
        let second = store.associate("42", Arc::new(BrokenPrinter));
        assert!(matches!(second, Err(StoreError::DuplicateAssociation(_))));

        // First association still drives the read
        let data = store.read("42").await.unwrap();
        assert_eq!(data.content, "HELLO");
    }

    #[tokio::test]
    async fn test_associate_before_body_write() {
        let (store, _temp) = create_store();
        store.associate("42", Arc::new(UppercasePrinter)).unwrap();
        write_body(&store, "42", false, b"late body");

        let data = store.read("42").await.unwrap();
        assert_eq!(data.content, "LATE BODY");
    }

    #[tokio::test]
    async fn test_failed_render_degrades_to_raw_with_diagnostic() {
        let (store, _temp) = create_store();
        write_body(&store, "42", false, b"hello");
        store.associate("42", Arc::new(BrokenPrinter)).unwrap();

        let data = store.read("42").await.unwrap();
        assert!(data.content.starts_with("Failed to pretty print response body:"));
        assert!(data.content.ends_with("hello"));
    }

    #[tokio::test]
    async fn test_render_reattempted_on_every_read() {
        let (store, _temp) = create_store();
        write_body(&store, "42", false, b"hello");
        store.associate("42", Arc::new(UppercasePrinter)).unwrap();

        assert_eq!(store.read("42").await.unwrap().content, "HELLO");
        assert_eq!(store.read("42").await.unwrap().content, "HELLO");
    }

    #[tokio::test]
    async fn test_cleanup_purges_bodies_and_associations() {
        let (store, _temp) = create_store();
        write_body(&store, "42", false, b"hello");
        store.associate("42", Arc::new(UppercasePrinter)).unwrap();

        store.cleanup().unwrap();

        assert!(matches!(
            store.read("42").await,
            Err(StoreError::UnknownRequestId(_))
        ));
        // Id is reusable after cleanup
        store.associate("42", Arc::new(UppercasePrinter)).unwrap();
        write_body(&store, "42", false, b"again");
    }
}
