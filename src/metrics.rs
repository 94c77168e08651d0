//! Process-wide traffic counters.
//!
//! Two monotonically increasing counters (bytes sent, bytes received),
//! incremented at the session boundary with post-compression sizes.
//! Recording is lock-free, best-effort and infallible: it never blocks or
//! aborts the message path.
//!
//! The counters sit behind the small [`MetricsSink`] trait so tests can
//! substitute a no-op or a recording sink without touching global state.

use std::sync::atomic::{AtomicU64, Ordering};

static SENT_BYTES: AtomicU64 = AtomicU64::new(0);
static RECEIVED_BYTES: AtomicU64 = AtomicU64::new(0);

/// Sink for traffic accounting.
///
/// Implementations must be non-blocking and infallible.
pub trait MetricsSink: Send + Sync {
    /// Record `bytes` of outbound (post-compression) traffic.
    fn record_sent(&self, bytes: u64);

    /// Record `bytes` of inbound (pre-decompression) traffic.
    fn record_received(&self, bytes: u64);
}

/// Sink backed by the process-wide atomic counter pair.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalMetrics;

impl MetricsSink for GlobalMetrics {
    #[inline]
    fn record_sent(&self, bytes: u64) {
        SENT_BYTES.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    fn record_received(&self, bytes: u64) {
        RECEIVED_BYTES.fetch_add(bytes, Ordering::Relaxed);
    }
}

/// Sink that discards everything; used when a session has metrics disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    #[inline]
    fn record_sent(&self, _bytes: u64) {}

    #[inline]
    fn record_received(&self, _bytes: u64) {}
}

/// Total bytes sent process-wide (post-compression).
pub fn sent_bytes() -> u64 {
    SENT_BYTES.load(Ordering::Relaxed)
}

/// Total bytes received process-wide (pre-decompression).
pub fn received_bytes() -> u64 {
    RECEIVED_BYTES.load(Ordering::Relaxed)
}

/// Zero both global counters. Intended for tests.
pub fn reset() {
    SENT_BYTES.store(0, Ordering::Relaxed);
    RECEIVED_BYTES.store(0, Ordering::Relaxed);
}

/// Serializes tests that assert on the global counters, since the test
/// runner executes them in parallel.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;

    /// Recording sink for assertions without global state.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingMetrics {
        pub sent: AtomicU64,
        pub received: AtomicU64,
    }

    impl MetricsSink for RecordingMetrics {
        fn record_sent(&self, bytes: u64) {
            self.sent.fetch_add(bytes, Ordering::Relaxed);
        }

        fn record_received(&self, bytes: u64) {
            self.received.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_global_counters_accumulate() {
        let _guard = test_lock();

        // Deltas, not absolutes: other tests share the globals.
        let sent_before = sent_bytes();
        let received_before = received_bytes();

        let sink = GlobalMetrics;
        sink.record_sent(100);
        sink.record_sent(20);
        sink.record_received(7);

        assert_eq!(sent_bytes() - sent_before, 120);
        assert_eq!(received_bytes() - received_before, 7);
    }

    #[test]
    fn test_noop_does_not_touch_globals() {
        let _guard = test_lock();

        let sent_before = sent_bytes();
        let received_before = received_bytes();

        let sink = NoopMetrics;
        sink.record_sent(1_000_000);
        sink.record_received(1_000_000);

        assert_eq!(sent_bytes(), sent_before);
        assert_eq!(received_bytes(), received_before);
    }

    #[test]
    fn test_recording_sink() {
        let sink = Arc::new(RecordingMetrics::default());
        sink.record_sent(42);
        sink.record_received(7);

        assert_eq!(sink.sent.load(Ordering::Relaxed), 42);
        assert_eq!(sink.received.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn test_concurrent_increments_are_additive() {
        let sink = Arc::new(RecordingMetrics::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        sink.record_sent(1);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(sink.sent.load(Ordering::Relaxed), 8000);
    }
}
