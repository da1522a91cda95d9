use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::traits::PrettyPrinterFactory;

/// Registry mapping response header names to printer factories
///
/// All operations take a single lock and never touch I/O, so they are safe
/// to call from the network-event path. Duplicate registration is rejected
/// rather than overwritten; callers must check the boolean result.
#[derive(Default)]
pub struct PrinterRegistry {
    factories: Mutex<HashMap<String, Arc<dyn PrettyPrinterFactory>>>,
}

impl PrinterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a header name
    ///
    /// Returns `false` and leaves the existing entry in place if the header
    /// name is already registered.
    pub fn register(
        &self,
        header_name: impl Into<String>,
        factory: Arc<dyn PrettyPrinterFactory>,
    ) -> bool {
        let header_name = header_name.into();
        let mut factories = self.factories.lock().unwrap();
        if factories.contains_key(&header_name) {
            tracing::warn!(%header_name, "Duplicate printer registration rejected");
            return false;
        }
        factories.insert(header_name, factory);
        true
    }

    pub fn lookup(&self, header_name: &str) -> Option<Arc<dyn PrettyPrinterFactory>> {
        self.factories.lock().unwrap().get(header_name).cloned()
    }

    /// Remove a registration. Returns `false` if the header name was absent.
    pub fn unregister(&self, header_name: &str) -> bool {
        self.factories.lock().unwrap().remove(header_name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printers::traits::{ContentKind, PrettyPrinter};

    struct NullFactory {
        kind: ContentKind,
    }

    impl PrettyPrinterFactory for NullFactory {
        fn create_printer(&self, _: &str, _: &str) -> Option<Arc<dyn PrettyPrinter>> {
            None
        }

        fn content_kind(&self) -> ContentKind {
            self.kind
        }
    }

    #[test]
    fn test_lookup_unregistered_returns_none() {
        let registry = PrinterRegistry::new();
        assert!(registry.lookup("X-Schema").is_none());
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = PrinterRegistry::new();
        let factory = Arc::new(NullFactory {
            kind: ContentKind::Json,
        });

        assert!(registry.register("X-Schema", factory));
        assert!(registry.lookup("X-Schema").is_some());
        assert!(registry.lookup("X-Other").is_none());
    }

    #[test]
    fn test_duplicate_registration_keeps_first_factory() {
        let registry = PrinterRegistry::new();
        let first = Arc::new(NullFactory {
            kind: ContentKind::Json,
        });
        let second = Arc::new(NullFactory {
            kind: ContentKind::Html,
        });

        assert!(registry.register("X-Schema", first));
        assert!(!registry.register("X-Schema", second));

        let found = registry.lookup("X-Schema").unwrap();
        assert_eq!(found.content_kind(), ContentKind::Json);
    }

    #[test]
    fn test_unregister() {
        let registry = PrinterRegistry::new();
        let factory = Arc::new(NullFactory {
            kind: ContentKind::Text,
        });

        registry.register("X-Schema", factory);
        assert!(registry.unregister("X-Schema"));
        assert!(!registry.unregister("X-Schema"));
        assert!(registry.lookup("X-Schema").is_none());
    }
}
