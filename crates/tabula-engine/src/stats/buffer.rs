use super::metadata::Distribution;

/// Running count, sum, min and max of non-negative samples.
///
/// Negative values stand for "absent" and are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsBuffer {
    count: u64,
    sum: i64,
    min: i64,
    max: i64,
}

impl StatsBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, value: i64) {
        if value < 0 {
            return;
        }
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum = self.sum.saturating_add(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The distribution of everything accepted so far, `None` if nothing was.
    /// Leaves the buffer empty.
    pub fn flush(&mut self) -> Option<Distribution> {
        let distribution = (!self.is_empty()).then(|| Distribution {
            min: self.min,
            max: self.max,
            avg: self.sum as f64 / self.count as f64,
            samples: self.count,
        });
        self.reset();
        distribution
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
