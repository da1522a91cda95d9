//! Inspection session aggregate
//!
//! Owns the registry, the stores and the executors for one inspection
//! session, explicitly constructed and passed to whoever needs it. There
//! is no process-wide singleton. Lifecycle is driven by observer peers:
//! stale bodies are purged when the first peer attaches, and everything is
//! torn down when the last peer detaches.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::fetch::{FetchError, FetchExecutor, SchemaClient, SchemaFetcher};
use crate::observability::Metrics;
use crate::printers::{ContentKind, DownloadingFactory, PrinterRegistry, SchemaFormat};
use crate::render::RenderExecutor;
use crate::store::{self, ResponseBodyStore, SchemaFileCache, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Fetch client error: {0}")]
    Fetch(#[from] FetchError),
}

/// Intercepted HTTP response as seen by the network-event layer
///
/// Only the pieces the pipeline needs: a unique request id and header
/// enumeration access.
pub trait InspectorResponse {
    fn request_id(&self) -> &str;
    fn header_count(&self) -> usize;
    fn header_name(&self, index: usize) -> &str;
    fn header_value(&self, index: usize) -> &str;
}

pub struct InspectionSession {
    registry: PrinterRegistry,
    bodies: Arc<ResponseBodyStore>,
    schemas: Arc<SchemaFileCache>,
    fetches: Arc<FetchExecutor>,
    metrics: Arc<Metrics>,
    schema_wait: Duration,
    peers: AtomicUsize,
}

impl InspectionSession {
    /// Build a session with an explicit schema fetcher (tests use stubs)
    pub fn new(config: &Config, fetcher: Arc<dyn SchemaFetcher>) -> Result<Self, SessionError> {
        let metrics = Arc::new(Metrics::new());
        let keyspace = store::open_keyspace(&config.store.path)?;

        let schemas = Arc::new(SchemaFileCache::new(&keyspace)?);
        let fetches = Arc::new(FetchExecutor::new(
            config.fetch.workers,
            fetcher,
            Some(Arc::clone(&schemas)),
            Arc::clone(&metrics),
        ));
        let bodies = Arc::new(ResponseBodyStore::new(
            &keyspace,
            RenderExecutor::new(config.render.deadline.as_duration()),
            Arc::clone(&metrics),
        )?);

        Ok(Self {
            registry: PrinterRegistry::new(),
            bodies,
            schemas,
            fetches,
            metrics,
            schema_wait: config.fetch.schema_wait.as_duration(),
            peers: AtomicUsize::new(0),
        })
    }

    /// Build a session with the production reqwest-backed fetcher
    pub fn with_default_client(config: &Config) -> Result<Self, SessionError> {
        let client = SchemaClient::new(&config.fetch)?;
        Self::new(config, Arc::new(client))
    }

    pub fn registry(&self) -> &PrinterRegistry {
        &self.registry
    }

    pub fn bodies(&self) -> &Arc<ResponseBodyStore> {
        &self.bodies
    }

    pub fn schema_cache(&self) -> &Arc<SchemaFileCache> {
        &self.schemas
    }

    pub fn fetch_executor(&self) -> &Arc<FetchExecutor> {
        &self.fetches
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Convenience constructor for a downloading factory wired to this
    /// session's fetch executor and configured schema wait
    pub fn downloading_factory(&self, format: Arc<dyn SchemaFormat>) -> Arc<DownloadingFactory> {
        Arc::new(DownloadingFactory::new(
            format,
            Arc::clone(&self.fetches),
            self.schema_wait,
        ))
    }

    /// Scan a response's headers for a registered printer factory; create
    /// and associate a printer for the first header that yields one.
    ///
    /// Returns the factory's content-kind hint so the protocol layer can
    /// pre-announce a type before rendering completes, or `None` when no
    /// pretty printing is available for this response.
    pub fn printer_for_response(
        &self,
        response: &dyn InspectorResponse,
    ) -> Result<Option<ContentKind>, StoreError> {
        for index in 0..response.header_count() {
            let name = response.header_name(index);
            let Some(factory) = self.registry.lookup(name) else {
                continue;
            };
            let Some(printer) = factory.create_printer(name, response.header_value(index)) else {
                continue;
            };

            self.metrics.printer_created();
            self.bodies.associate(response.request_id(), printer)?;
            return Ok(Some(factory.content_kind()));
        }

        Ok(None)
    }

    /// Register an observer peer; the first one triggers body cleanup
    pub fn attach_peer(&self) -> Result<(), StoreError> {
        if self.peers.fetch_add(1, Ordering::SeqCst) == 0 {
            info!("First peer attached, cleaning up stale bodies");
            self.bodies.cleanup()?;
        }
        Ok(())
    }

    /// Deregister an observer peer; the last one tears the session down.
    /// An unmatched detach is ignored rather than underflowing the count.
    pub fn detach_peer(&self) -> Result<(), StoreError> {
        let prev = self
            .peers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if prev == Ok(1) {
            info!("Last peer detached, tearing down session resources");
            self.bodies.cleanup()?;
            self.schemas.purge()?;
            self.fetches.shutdown();
        }
        Ok(())
    }
}
