//! Bounded-time render step
//!
//! Wraps a printer's render call in a short-lived worker task with an
//! overall deadline (default 1000 ms), inclusive of any schema-fetch wait
//! inside the printer. Every outcome is a value; neither errors nor panics
//! cross this boundary, and the store falls back to raw content whenever
//! the outcome is not `Rendered`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::printers::PrettyPrinter;

/// Result of one bounded render attempt
#[derive(Debug)]
pub enum RenderOutcome {
    Rendered(String),
    TimedOut,
    Failed(String),
}

pub struct RenderExecutor {
    deadline: Duration,
}

impl RenderExecutor {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `printer.render(payload)` on a short-lived worker under the
    /// deadline. On timeout the worker is aborted; an abandoned fetch inside
    /// it runs to discard.
    pub async fn render(&self, printer: Arc<dyn PrettyPrinter>, payload: Vec<u8>) -> RenderOutcome {
        let mut worker = tokio::spawn(async move { printer.render(&payload).await });

        match tokio::time::timeout(self.deadline, &mut worker).await {
            Ok(Ok(Ok(text))) => {
                debug!(size = text.len(), "Render completed");
                RenderOutcome::Rendered(text)
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "Render failed");
                RenderOutcome::Failed(e.to_string())
            }
            Ok(Err(join_err)) => {
                warn!(error = %join_err, "Render worker died");
                RenderOutcome::Failed(format!("render worker died: {}", join_err))
            }
            Err(_) => {
                worker.abort();
                warn!(deadline_ms = self.deadline.as_millis() as u64, "Render timed out");
                RenderOutcome::TimedOut
            }
        }
    }
}
