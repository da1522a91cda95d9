//! Fjall-backed persistence for response bodies and schema data
//!
//! One embedded keyspace holds two partitions:
//!
//! - `bodies`: one entry per request id, laid out as
//!   `[marker byte: 0=raw, 1=base64][payload]` so arbitrary binary bodies
//!   survive a text-oriented transport
//! - `schemas`: sequentially-assigned cache slots for downloaded schema
//!   text, keyed externally by source URI
//!
//! [`ResponseBodyStore`] also keeps the in-memory association table from
//! request id to pretty printer and stitches the bounded render step into
//! the read path.

mod bodies;
mod schema_cache;

pub use bodies::{BodyData, BodySink, ResponseBodyStore};
pub use schema_cache::{SchemaCacheSink, SchemaFileCache};

use std::path::Path;

use fjall::{Config, Keyspace};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No response body recorded for request id: {0}")]
    UnknownRequestId(String),

    #[error("A response body already exists for request id: {0}")]
    DuplicateBody(String),

    #[error("Cannot associate different pretty printers with the same request id: {0}")]
    DuplicateAssociation(String),

    #[error("Corrupt body record for request id {request_id}: {reason}")]
    CorruptRecord { request_id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Open or create the shared keyspace at the given path
pub fn open_keyspace<P: AsRef<Path>>(path: P) -> Result<Keyspace> {
    let path = path.as_ref();
    info!("Opening store keyspace at: {}", path.display());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(Config::new(path).open()?)
}
