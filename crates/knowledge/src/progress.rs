//! Structured progress reporting for analysis runs.
//!
//! The CLI subscribes to these events to show incremental feedback while a
//! website is analyzed, chunked and stored.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during an analysis run.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the run: "analyze", "chunk", "store"
    pub phase: String,

    /// Units of work finished so far
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    /// Human-readable message
    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let percentage =
            total.map(|t| if t > 0 { (current as f64 / t as f64) * 100.0 } else { 0.0 });

        Self {
            phase: phase.into(),
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };

        let pct = self
            .percentage
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emits events through an optional callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// A reporter that emits nothing.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.callback {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            let event = event.with_elapsed(elapsed);

            tracing::debug!(
                phase = %event.phase,
                current = event.current,
                total = ?event.total,
                message = %event.message,
                elapsed_secs = elapsed,
                "Progress event"
            );

            callback(event);
        }
    }

    /// The analyzer produced a result.
    pub fn analyze(&self, url: &str, analyzer: &str) {
        self.emit(ProgressEvent::new(
            "analyze",
            1,
            Some(1),
            format!("{} analyzed by {}", url, analyzer),
        ));
    }

    /// The business information was split into `total` chunks.
    pub fn chunk(&self, total: u64) {
        self.emit(ProgressEvent::new(
            "chunk",
            total,
            None,
            format!("{} chunks prepared", total),
        ));
    }

    /// One chunk finished (stored or skipped).
    pub fn store(&self, current: u64, total: u64, embedding_provider: Option<&str>) {
        let message = match embedding_provider {
            Some(provider) => format!("stored, embedding={}", provider),
            None => "stored without embedding".to_string(),
        };
        self.emit(ProgressEvent::new("store", current, Some(total), message));
    }
}
