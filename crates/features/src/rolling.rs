//! Trailing-window aggregation.
//!
//! Maintains the most recent `window` values with a compensated running sum,
//! so each push is O(1) regardless of window size and an evicted value of
//! large magnitude does not wipe out the smaller values still in the window.

use std::collections::VecDeque;

/// Statistic reported by a [`RollingWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingStat {
    Mean,
    Sum,
}

/// Causal sliding window over a single entity's sequence.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    /// Window size in records.
    window: usize,
    /// Minimum values before a statistic is reported.
    min_periods: usize,
    /// Statistic to report.
    stat: RollingStat,
    /// Values currently in the window, oldest first.
    values: VecDeque<f64>,
    /// Running sum of `values`.
    sum: f64,
    /// Low-order bits lost from `sum` (Neumaier compensation).
    comp: f64,
}

impl RollingWindow {
    /// Create a new rolling window.
    pub fn new(window: usize, min_periods: usize, stat: RollingStat) -> Self {
        let window = window.max(1);
        Self {
            window,
            min_periods: min_periods.clamp(1, window),
            stat,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
            comp: 0.0,
        }
    }

    /// Trailing mean with the given window and minimum.
    pub fn mean(window: usize, min_periods: usize) -> Self {
        Self::new(window, min_periods, RollingStat::Mean)
    }

    /// Trailing sum with the given window and minimum.
    pub fn sum(window: usize, min_periods: usize) -> Self {
        Self::new(window, min_periods, RollingStat::Sum)
    }

    /// Add the next value and return the statistic over the window ending here.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.values.len() >= self.window {
            if let Some(old) = self.values.pop_front() {
                self.add(-old);
            }
        }

        self.values.push_back(value);
        self.add(value);
        self.value()
    }

    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.comp += (self.sum - t) + x;
        } else {
            self.comp += (x - t) + self.sum;
        }
        self.sum = t;
    }

    /// Current statistic, if the window holds enough values.
    pub fn value(&self) -> Option<f64> {
        let n = self.values.len();
        if n < self.min_periods {
            return None;
        }

        let sum = self.sum + self.comp;
        match self.stat {
            RollingStat::Sum => Some(sum),
            RollingStat::Mean => Some(sum / n as f64),
        }
    }

    /// Check if the window is full.
    pub fn is_full(&self) -> bool {
        self.values.len() >= self.window
    }

    /// Number of values in the window.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.values.clear();
        self.sum = 0.0;
        self.comp = 0.0;
    }
}
