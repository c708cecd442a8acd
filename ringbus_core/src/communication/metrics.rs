use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for one publisher handle
#[derive(Debug, Default)]
#[repr(align(64))] // Cache-line aligned to prevent false sharing
pub struct AtomicPublisherMetrics {
    pub published: AtomicU64,
    pub dropped: AtomicU64,
    pub failures: AtomicU64,
}

impl AtomicPublisherMetrics {
    pub fn snapshot(&self) -> PublisherMetrics {
        PublisherMetrics {
            published: self.published.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Publisher counters at one point in time.
///
/// `dropped` counts writes that overwrote the oldest retained message because
/// the channel was full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherMetrics {
    pub published: u64,
    pub dropped: u64,
    pub failures: u64,
}

/// Lock-free counters for one subscriber handle
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct AtomicSubscriberMetrics {
    pub received: AtomicU64,
    pub failures: AtomicU64,
}

impl AtomicSubscriberMetrics {
    pub fn snapshot(&self) -> SubscriberMetrics {
        SubscriberMetrics {
            received: self.received.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriberMetrics {
    pub received: u64,
    pub failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reads_counters() {
        let metrics = AtomicPublisherMetrics::default();
        metrics.published.fetch_add(3, Ordering::Relaxed);
        metrics.dropped.fetch_add(1, Ordering::Relaxed);
        assert_eq!(
            metrics.snapshot(),
            PublisherMetrics {
                published: 3,
                dropped: 1,
                failures: 0
            }
        );
    }
}
