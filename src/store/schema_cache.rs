use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

use super::Result;

const SLOT_PREFIX: &str = "schema-";

/// Disk-backed cache of downloaded schema text, keyed by source URI
///
/// Purely an optimization: a miss proceeds through the fetch executor as
/// normal. Entries are invalidated only by explicit purge.
pub struct SchemaFileCache {
    schemas: PartitionHandle,
    slots: Mutex<HashMap<String, String>>,
    next_slot: AtomicU64,
}

impl SchemaFileCache {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        let schemas = keyspace.open_partition("schemas", PartitionCreateOptions::default())?;
        Ok(Self {
            schemas,
            slots: Mutex::new(HashMap::new()),
            next_slot: AtomicU64::new(0),
        })
    }

    /// Allocate a fresh cache slot for `uri` and return a sink to fill it
    pub fn put(&self, uri: &str) -> SchemaCacheSink {
        let slot_key = format!(
            "{}{}",
            SLOT_PREFIX,
            self.next_slot.fetch_add(1, Ordering::Relaxed)
        );
        self.slots
            .lock()
            .unwrap()
            .insert(uri.to_string(), slot_key.clone());
        debug!(uri, %slot_key, "Allocated schema cache slot");

        SchemaCacheSink {
            partition: self.schemas.clone(),
            key: slot_key,
            buf: Vec::new(),
        }
    }

    /// Return previously cached schema text for `uri`, if any
    pub fn get(&self, uri: &str) -> Result<Option<String>> {
        let slot_key = match self.slots.lock().unwrap().get(uri) {
            Some(key) => key.clone(),
            None => return Ok(None),
        };

        match self.schemas.get(&slot_key)? {
            Some(value) => Ok(Some(String::from_utf8_lossy(&value).into_owned())),
            // Slot was allocated but never filled, or purged underneath us
            None => Ok(None),
        }
    }

    /// Convenience for the fetch workers: allocate, write, finish
    pub fn store(&self, uri: &str, bytes: &[u8]) -> Result<()> {
        let mut sink = self.put(uri);
        sink.write(bytes);
        sink.finish()
    }

    /// Drop every cached schema and forget the URI mapping
    pub fn purge(&self) -> Result<()> {
        let keys: Vec<_> = self
            .schemas
            .iter()
            .map(|item| item.map(|(k, _)| k))
            .collect::<std::result::Result<_, fjall::Error>>()?;

        for key in &keys {
            self.schemas.remove(key.clone())?;
        }
        self.slots.lock().unwrap().clear();

        info!(purged = keys.len(), "Purged schema cache");
        Ok(())
    }
}

/// Buffering sink for one schema cache slot; raw bytes, no marker byte
pub struct SchemaCacheSink {
    partition: PartitionHandle,
    key: String,
    buf: Vec<u8>,
}

impl SchemaCacheSink {
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn finish(self) -> Result<()> {
        self.partition.insert(self.key.as_str(), self.buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_keyspace;
    use tempfile::TempDir;

    fn create_cache() -> (SchemaFileCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let keyspace = open_keyspace(temp_dir.path().join("store")).unwrap();
        (SchemaFileCache::new(&keyspace).unwrap(), temp_dir)
    }

    #[test]
    fn test_miss_returns_none() {
        let (cache, _temp) = create_cache();
        assert!(cache.get("https://example.com/s").unwrap().is_none());
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let (cache, _temp) = create_cache();

        let mut sink = cache.put("https://example.com/s");
        sink.write(b"message Ping {}");
        sink.finish().unwrap();

        let cached = cache.get("https://example.com/s").unwrap();
        assert_eq!(cached.unwrap(), "message Ping {}");
    }

    #[test]
    fn test_unfilled_slot_reads_as_miss() {
        let (cache, _temp) = create_cache();
        let _sink = cache.put("https://example.com/s");

        assert!(cache.get("https://example.com/s").unwrap().is_none());
    }

    #[test]
    fn test_purge_forgets_entries() {
        let (cache, _temp) = create_cache();
        cache.store("https://example.com/s", b"schema").unwrap();
        assert!(cache.get("https://example.com/s").unwrap().is_some());

        cache.purge().unwrap();
        assert!(cache.get("https://example.com/s").unwrap().is_none());
    }
}
