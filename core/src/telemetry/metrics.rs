use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Counters since start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub processed: usize,
    pub detections: usize,
    pub skipped: usize,
    pub captures: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_processed(&self, detected: bool) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.processed += 1;
            if detected {
                metrics.detections += 1;
            }
        }
    }

    /// Frame read while the radar was locked.
    pub fn record_skipped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped += 1;
        }
    }

    pub fn record_capture(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.captures += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let recorder = MetricsRecorder::new();
        recorder.record_processed(true);
        recorder.record_processed(false);
        recorder.record_skipped();
        recorder.record_capture();
        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.processed, 2);
        assert_eq!(snapshot.detections, 1);
        assert_eq!(snapshot.skipped, 1);
        assert_eq!(snapshot.captures, 1);
    }
}
