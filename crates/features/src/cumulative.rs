//! Running totals scoped to one entity.

/// Inclusive running count of flagged observations.
#[derive(Debug, Clone, Default)]
pub struct CumulativeCounter {
    total: u32,
}

impl CumulativeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next flag and return the total including it.
    pub fn push(&mut self, flagged: bool) -> u32 {
        if flagged {
            self.total += 1;
        }
        self.total
    }

    /// Current total.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Reset to zero at an entity boundary.
    pub fn reset(&mut self) {
        self.total = 0;
    }
}
