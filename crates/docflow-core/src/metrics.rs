//! Running-average metrics for stage processing times
//!
//! Stages fold simulated durations into a running average, but they do not
//! agree on the divisor:
//! - intake and validation divide by their post-increment item count
//! - clarification divides by the cumulative number of questions generated
//! - transformation takes the cumulative mean over every item it has seen,
//!   which works out to the same arithmetic as the per-item convention
//! - storage divides by the number of writes in the current call
//!
//! Each convention has its own method so the call sites keep them apart.

use serde::{Deserialize, Serialize};

/// Update a running average with a new observation
///
/// Treats the new value as replacing the most recent of `current_count`
/// slots: `(avg * (count - 1) + value) / count`. Callers increment their
/// count before calling. With `current_count == 0` the new value is returned.
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn update_running_average(current_average: f64, current_count: u64, new_value: f64) -> f64 {
    if current_count == 0 {
        return new_value;
    }
    let count = current_count as f64;
    (current_average * (count - 1.0) + new_value) / count
}

/// Per-stage running average with its observation count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTracker {
    average: f64,
    count: u64,
}

impl MetricTracker {
    /// Create a tracker seeded with an initial average and no observations
    #[inline]
    #[must_use]
    pub fn new(initial_average: f64) -> Self {
        Self {
            average: initial_average,
            count: 0,
        }
    }

    /// Current average
    #[inline]
    #[must_use]
    pub fn average(&self) -> f64 {
        self.average
    }

    /// Observations (or units) counted so far
    #[inline]
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Count one observation, then fold with the post-increment count
    pub fn record(&mut self, value: f64) {
        self.record_batch(1, value);
    }

    /// Add `units` to the count, then fold with the new total as divisor
    pub fn record_batch(&mut self, units: u64, value: f64) {
        self.count += units;
        self.average = update_running_average(self.average, self.count, value);
    }

    /// Count one observation and take the cumulative mean over all of them
    ///
    /// Numerically identical to [`MetricTracker::record`]; kept separate so
    /// the transformation call site names the mean it maintains.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_cumulative(&mut self, value: f64) {
        self.count += 1;
        let n = self.count as f64;
        self.average = (self.average * (n - 1.0) + value) / n;
    }

    /// Fold using an explicit divisor; the count is left untouched
    pub fn record_over(&mut self, divisor: u64, value: f64) {
        self.average = update_running_average(self.average, divisor, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count_returns_new_value() {
        assert_eq!(update_running_average(5.0, 0, 2.5), 2.5);
    }

    #[test]
    fn divides_by_current_count() {
        // (2.0 * 1 + 4.0) / 2
        assert_eq!(update_running_average(2.0, 2, 4.0), 3.0);
        // count 1 discards the previous average entirely
        assert_eq!(update_running_average(9.0, 1, 1.5), 1.5);
    }

    #[test]
    fn record_increments_first() {
        let mut tracker = MetricTracker::new(1.2);
        tracker.record(2.0);
        assert_eq!(tracker.count(), 1);
        assert_eq!(tracker.average(), 2.0);

        tracker.record(1.0);
        assert_eq!(tracker.count(), 2);
        assert_eq!(tracker.average(), 1.5);
    }

    #[test]
    fn record_batch_uses_cumulative_units() {
        let mut tracker = MetricTracker::new(0.8);
        tracker.record_batch(3, 1.0);
        assert_eq!(tracker.count(), 3);
        // (0.8 * 2 + 1.0) / 3
        assert!((tracker.average() - 2.6 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn record_over_leaves_count() {
        let mut tracker = MetricTracker::new(1.8);
        tracker.record_over(2, 3.0);
        assert_eq!(tracker.count(), 0);
        assert!((tracker.average() - 2.4).abs() < 1e-12);

        tracker.record_over(0, 7.0);
        assert_eq!(tracker.average(), 7.0);
    }

    #[test]
    fn record_cumulative_is_mean_of_observations() {
        let mut tracker = MetricTracker::new(2.5);
        tracker.record_cumulative(1.0);
        tracker.record_cumulative(3.0);
        tracker.record_cumulative(5.0);
        assert_eq!(tracker.count(), 3);
        assert!((tracker.average() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn record_cumulative_matches_record() {
        let mut per_item = MetricTracker::new(2.5);
        let mut cumulative = MetricTracker::new(2.5);
        for value in [1.7, 4.2, 0.9, 3.3] {
            per_item.record(value);
            cumulative.record_cumulative(value);
            assert_eq!(per_item.count(), cumulative.count());
            assert!((per_item.average() - cumulative.average()).abs() < 1e-12);
        }
    }
}
