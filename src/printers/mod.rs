//! Pretty printer capabilities and their registry
//!
//! Observers register a [`PrettyPrinterFactory`] per response header name.
//! When an inspected response carries a registered header, the factory
//! creates a [`PrettyPrinter`] for that single response without blocking,
//! even when rendering will later depend on a schema downloaded in the
//! background.
//!
//! ## Key Components
//!
//! - [`PrettyPrinterFactory`] / [`PrettyPrinter`] - Capability traits
//! - [`PrinterRegistry`] - Header name to factory mapping
//! - [`DownloadingFactory`] - Factory whose printers wait on a schema fetch
//! - [`SimpleFactory`] - Factory for schema-less formatters
//! - [`ContentKind`] - Pre-render hint for the protocol layer

mod downloading;
mod registry;
mod traits;

pub use downloading::{DownloadingFactory, SchemaFormat, SimpleFactory};
pub use registry::PrinterRegistry;
pub use traits::{ContentKind, PrettyPrinter, PrettyPrinterFactory, PrinterError};
