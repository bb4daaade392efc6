use std::{fmt, time::Duration};

/// Counters of a denoising run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Images written successfully.
    pub processed: usize,
    /// Entries skipped because of an error.
    pub failed: usize,
    /// Number of entries in the manifest.
    pub total: usize,
    /// Wall clock time since the run started.
    pub elapsed: Duration,
}

impl RunStatistics {
    /// Empty statistics for a manifest of `total` entries.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Entries handled so far, successful or not.
    pub fn completed(&self) -> usize {
        self.processed + self.failed
    }

    /// Fraction of entries handled so far, in `[0, 1]`. An empty run is complete.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed() as f64 / self.total as f64
    }

    /// Whether every entry was processed successfully.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.processed == self.total
    }

    pub(crate) fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub(crate) fn record_failed(&mut self) {
        self.failed += 1;
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {}/{} images ({} failed) in {:.2} s",
            self.processed,
            self.total,
            self.failed,
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters() {
        let mut stats = RunStatistics::new(4);
        assert_eq!(stats.progress(), 0.0);

        stats.record_processed();
        stats.record_failed();
        stats.record_processed();
        assert_eq!(stats.completed(), 3);
        assert_eq!(stats.progress(), 0.75);
        assert!(!stats.is_success());
    }

    #[test]
    fn empty_run() {
        let stats = RunStatistics::new(0);
        assert_eq!(stats.progress(), 1.0);
        assert!(stats.is_success());
    }

    #[test]
    fn report() {
        let stats = RunStatistics {
            processed: 2,
            failed: 1,
            total: 3,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(stats.to_string(), "processed 2/3 images (1 failed) in 1.50 s");
    }
}
