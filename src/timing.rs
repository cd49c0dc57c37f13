use std::collections::HashMap;
use std::time::Instant;

/// Paired start/end step instrumentation for pipeline stages.
#[derive(Debug)]
pub struct TimeTracker {
    started: Instant,
    open: HashMap<String, Instant>,
    steps: Vec<(String, u64)>,
}

impl TimeTracker {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            open: HashMap::new(),
            steps: Vec::new(),
        }
    }

    pub fn start_step(&mut self, name: &str) {
        self.open.insert(name.to_string(), Instant::now());
    }

    /// Closes a step and returns its elapsed milliseconds, or `None` when the
    /// step was never started.
    pub fn end_step(&mut self, name: &str) -> Option<u64> {
        let started = self.open.remove(name)?;
        let elapsed = started.elapsed().as_millis() as u64;
        self.steps.push((name.to_string(), elapsed));
        Some(elapsed)
    }

    pub fn summary(&self) -> StepSummary {
        StepSummary {
            steps: self.steps.clone(),
            total_duration_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}

impl Default for TimeTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Completed step durations plus wall-clock total since tracker creation.
#[derive(Debug, Clone, Default)]
pub struct StepSummary {
    pub steps: Vec<(String, u64)>,
    pub total_duration_ms: u64,
}
