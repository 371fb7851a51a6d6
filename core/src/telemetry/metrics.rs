use std::sync::Mutex;

/// Counters for raster recomputes and marker saves.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub renders: usize,
    pub saves: usize,
    pub save_failures: usize,
}

#[derive(Default)]
struct Metrics {
    renders: usize,
    saves: usize,
    save_failures: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_render(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.renders += 1;
        }
    }

    pub fn record_save(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.saves += 1;
        }
    }

    pub fn record_save_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.save_failures += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            MetricsSnapshot {
                renders: metrics.renders,
                saves: metrics.saves,
                save_failures: metrics.save_failures,
            }
        } else {
            MetricsSnapshot::default()
        }
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
    fn counters_accumulate_independently() {
        let metrics = MetricsRecorder::new();
        metrics.record_render();
        metrics.record_render();
        metrics.record_save();
        metrics.record_save_failure();
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                renders: 2,
                saves: 1,
                save_failures: 1
            }
        );
    }
}
