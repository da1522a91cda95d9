//! prettybox: asynchronous response-body pretty printing for a
//! network-inspection bridge
//!
//! Observers register content-type-specific formatters keyed by response
//! header name; formatting may depend on schema data downloaded in the
//! background, but body capture never blocks and a body read always returns
//! within the configured render deadline, degrading to raw content when
//! pretty printing fails or times out.

pub mod config;
pub mod fetch;
pub mod humanize;
pub mod observability;
pub mod printers;
pub mod render;
pub mod session;
pub mod store;
