//! Logger metrics for observability
//!
//! Counters for dispatched messages, sink failures, rejected calls and
//! queue backpressure.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use sink_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dispatched();
/// metrics.record_write_error();
///
/// assert_eq!(metrics.dispatched(), 1);
/// assert_eq!(metrics.write_errors(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Messages fanned out to the attached sinks
    dispatched: AtomicU64,

    /// Individual sink writes that failed or panicked
    write_errors: AtomicU64,

    /// `log` calls refused before delivery (illegal severity, stopped logger)
    rejected: AtomicU64,

    /// Times a producer found the async queue full and had to wait
    queue_full_events: AtomicU64,

    /// Completed flushes
    flushes: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_error(&self) -> u64 {
        self.write_errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush(&self) -> u64 {
        self.flushes.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed sink writes per dispatched message, as a percentage
    ///
    /// Returns 0.0 if nothing has been dispatched.
    pub fn error_rate(&self) -> f64 {
        let dispatched = self.dispatched() as f64;
        if dispatched == 0.0 {
            0.0
        } else {
            (self.write_errors() as f64 / dispatched) * 100.0
        }
    }

    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.flushes.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            dispatched: AtomicU64::new(self.dispatched()),
            write_errors: AtomicU64::new(self.write_errors()),
            rejected: AtomicU64::new(self.rejected()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            flushes: AtomicU64::new(self.flushes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.dispatched(), 0);
        assert_eq!(metrics.write_errors(), 0);
        assert_eq!(metrics.rejected(), 0);
        assert_eq!(metrics.queue_full_events(), 0);
        assert_eq!(metrics.flushes(), 0);
    }

    #[test]
    fn test_record_returns_previous() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_rejected(), 0);
        assert_eq!(metrics.record_rejected(), 1);
        assert_eq!(metrics.rejected(), 2);
    }

    #[test]
    fn test_error_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.error_rate(), 0.0);

        for _ in 0..10 {
            metrics.record_dispatched();
        }
        metrics.record_write_error();

        let rate = metrics.error_rate();
        assert!((9.9..=10.1).contains(&rate), "Error rate was {}", rate);
    }

    #[test]
    fn test_reset_and_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_dispatched();
        metrics.record_flush();

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.dispatched(), 0);
        assert_eq!(snapshot.dispatched(), 1);
        assert_eq!(snapshot.flushes(), 1);
    }
}
