//! First differences within an entity sequence.

/// One-slot look-back that emits `value - previous`.
#[derive(Debug, Clone)]
pub struct DeltaTracker {
    /// Previous value, if any.
    prev: Option<f64>,
    /// Value emitted when there is no previous observation.
    fill: f64,
}

impl DeltaTracker {
    /// Create a tracker that emits `fill` for the first observation.
    pub fn new(fill: f64) -> Self {
        Self { prev: None, fill }
    }

    /// Add the next value and return its difference from the previous one.
    pub fn push(&mut self, value: f64) -> f64 {
        let delta = match self.prev {
            Some(prev) => value - prev,
            None => self.fill,
        };
        self.prev = Some(value);
        delta
    }

    /// Clear the look-back slot.
    pub fn clear(&mut self) {
        self.prev = None;
    }
}

impl Default for DeltaTracker {
    fn default() -> Self {
        Self::new(0.0)
    }
}
