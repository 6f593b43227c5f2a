use crate::upload::intake::format_file_size;
use std::time::{Duration, Instant};

/// Process memory at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryReading {
    pub physical_bytes: u64,
    pub virtual_bytes: u64,
}

/// Samples process memory at most once per `interval`.
#[derive(Debug)]
pub struct MemoryMonitor {
    interval: Duration,
    last_sample: Option<Instant>,
    reading: Option<MemoryReading>,
}

impl Default for MemoryMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl MemoryMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sample: None,
            reading: None,
        }
    }

    pub fn reading(&self) -> Option<MemoryReading> {
        self.reading
    }

    /// Re-reads the process memory when the interval has passed.
    pub fn refresh(&mut self, now: Instant) -> bool {
        self.refresh_with(now, read_process_memory)
    }

    fn refresh_with(&mut self, now: Instant, sample: impl FnOnce() -> Option<MemoryReading>) -> bool {
        let due = self
            .last_sample
            .is_none_or(|last| now.duration_since(last) >= self.interval);
        if !due {
            return false;
        }
        self.last_sample = Some(now);
        self.reading = sample();
        true
    }

    pub fn label(&self) -> String {
        match self.reading {
            Some(r) => format!(
                "Memory: {} resident, {} virtual",
                format_file_size(r.physical_bytes),
                format_file_size(r.virtual_bytes)
            ),
            None => "Memory: unavailable".to_string(),
        }
    }
}

fn read_process_memory() -> Option<MemoryReading> {
    memory_stats::memory_stats().map(|stats| MemoryReading {
        physical_bytes: stats.physical_mem as u64,
        virtual_bytes: stats.virtual_mem as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::{MemoryMonitor, MemoryReading};
    use std::time::{Duration, Instant};

    const READING: MemoryReading = MemoryReading {
        physical_bytes: 64 * 1024 * 1024,
        virtual_bytes: 2 * 1024 * 1024 * 1024,
    };

    #[test]
    fn samples_once_per_interval() {
        let mut monitor = MemoryMonitor::new(Duration::from_secs(2));
        let t0 = Instant::now();
        assert!(monitor.refresh_with(t0, || Some(READING)));
        assert!(!monitor.refresh_with(t0 + Duration::from_millis(1500), || None));
        assert_eq!(monitor.reading(), Some(READING));
        assert!(monitor.refresh_with(t0 + Duration::from_secs(2), || None));
        assert_eq!(monitor.reading(), None);
    }

    #[test]
    fn label_formats_sizes() {
        let mut monitor = MemoryMonitor::default();
        assert_eq!(monitor.label(), "Memory: unavailable");
        monitor.refresh_with(Instant::now(), || Some(READING));
        assert_eq!(monitor.label(), "Memory: 64 MB resident, 2 GB virtual");
    }
}
