//! Font size distribution across a deck.

use serde::{Deserialize, Serialize};

/// Counts of chosen font sizes, bucketed relative to the maximum size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeTally {
    /// The size ladder's top rung.
    pub max_size: u32,
    /// Slides set at exactly the maximum size.
    pub at_max: usize,
    /// At least 75% of the maximum.
    pub large: usize,
    /// At least 50% of the maximum.
    pub medium: usize,
    /// Below 50% of the maximum.
    pub small: usize,
    /// Slides whose size was reduced below the maximum.
    pub adjustments: usize,
}

impl SizeTally {
    pub fn new(max_size: u32) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    /// Record one slide's chosen size.
    pub fn record(&mut self, size: u32) {
        let size_f = f64::from(size);
        let max_f = f64::from(self.max_size);

        if size == self.max_size {
            self.at_max += 1;
        } else if size_f >= max_f * 0.75 {
            self.large += 1;
        } else if size_f >= max_f * 0.5 {
            self.medium += 1;
        } else {
            self.small += 1;
        }

        if size < self.max_size {
            self.adjustments += 1;
        }
    }

    /// Total slides recorded.
    pub fn total(&self) -> usize {
        self.at_max + self.large + self.medium + self.small
    }

    /// Lower bound of the large bucket, in whole points.
    pub fn large_threshold(&self) -> u32 {
        (f64::from(self.max_size) * 0.75) as u32
    }

    /// Lower bound of the medium bucket, in whole points.
    pub fn medium_threshold(&self) -> u32 {
        (f64::from(self.max_size) * 0.5) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets() {
        let mut tally = SizeTally::new(320);
        for size in [320, 240, 239, 160, 159, 20] {
            tally.record(size);
        }

        assert_eq!(tally.at_max, 1);
        assert_eq!(tally.large, 1);
        assert_eq!(tally.medium, 2);
        assert_eq!(tally.small, 2);
        assert_eq!(tally.adjustments, 5);
        assert_eq!(tally.total(), 6);
    }

    #[test]
    fn test_thresholds() {
        let tally = SizeTally::new(320);
        assert_eq!(tally.large_threshold(), 240);
        assert_eq!(tally.medium_threshold(), 160);
    }
}
