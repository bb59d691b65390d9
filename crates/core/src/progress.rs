//! Progress Reporting
//!
//! The deep analysis pipeline is advisory and long-running; the only
//! externally observable behavior besides the final failure list is the
//! progress stream. Events are pushed through a shared callback so the
//! host (CLI, IDE integration) renders them however it likes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single progress event emitted by the pipeline or a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A major pipeline stage started or finished
    Stage { message: String },
    /// Incremental download progress (sidecar binary / model file)
    Download {
        message: String,
        received_bytes: u64,
        total_bytes: Option<u64>,
    },
    /// One chunk of the batched analysis settled
    Chunk {
        completed: usize,
        total: usize,
        failed: usize,
    },
    /// One worker tick in multi-worker mode
    Worker {
        worker: usize,
        completed: usize,
        total: usize,
    },
}

/// Shared progress callback. Cloned into every worker so each parallel
/// provider session can report independently.
pub type ProgressFn = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// A callback that discards all events.
pub fn noop_progress() -> ProgressFn {
    Arc::new(|_| {})
}

/// Report a stage message through the callback.
pub fn report_stage(progress: &ProgressFn, message: impl Into<String>) {
    progress(ProgressEvent::Stage {
        message: message.into(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_noop_progress_does_not_panic() {
        let progress = noop_progress();
        report_stage(&progress, "extracting facts");
    }

    #[test]
    fn test_events_reach_callback() {
        let seen: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(move |event| {
            sink.lock().unwrap().push(event);
        });

        report_stage(&progress, "setup");
        progress(ProgressEvent::Chunk {
            completed: 1,
            total: 5,
            failed: 0,
        });

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ProgressEvent::Stage { .. }));
        assert!(matches!(events[1], ProgressEvent::Chunk { total: 5, .. }));
    }

    #[test]
    fn test_event_serialization() {
        let event = ProgressEvent::Download {
            message: "model".to_string(),
            received_bytes: 1024,
            total_bytes: Some(2048),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"download\""));
        assert!(json.contains("\"received_bytes\":1024"));
    }
}
