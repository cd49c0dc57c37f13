use std::sync::Mutex;

use serde_json::Value;

/// One lifecycle event per completed pipeline stage, emitted regardless of
/// whether the stage succeeded or fell back.
#[derive(Debug, Clone)]
pub struct StageEvent {
    pub stage: &'static str,
    pub duration_ms: u64,
    pub detail: Value,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: StageEvent);
}

/// Drops every event; for callers that do not render progress.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: StageEvent) {}
}

/// Buffers events in memory for callers (and tests) that poll.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<StageEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<StageEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn drain(&self) -> Vec<StageEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: StageEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
