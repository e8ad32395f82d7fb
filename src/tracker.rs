//! Per-license install bookkeeping.

use crate::models::{Category, CategoryMap};

/// Installs already committed to the license currently being filled.
///
/// The tracker does no cap enforcement of its own; the calculator checks caps
/// before calling [`LicenseUsageTracker::record`].
#[derive(Debug, Clone, Default)]
pub struct LicenseUsageTracker {
    usage: CategoryMap<u32>,
}

impl LicenseUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all counts; called whenever a new license is opened.
    pub fn reset(&mut self) {
        self.usage = CategoryMap::default();
    }

    pub fn record(&mut self, category: Category) {
        self.usage[category] += 1;
    }

    pub fn usage(&self, category: Category) -> u32 {
        self.usage[category]
    }

    pub fn installs(&self) -> u64 {
        self.usage.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_reset() {
        let mut tracker = LicenseUsageTracker::new();
        tracker.record(Category::Laptop);
        tracker.record(Category::Laptop);
        tracker.record(Category::Mobile);

        assert_eq!(tracker.usage(Category::Desktop), 0);
        assert_eq!(tracker.usage(Category::Laptop), 2);
        assert_eq!(tracker.usage(Category::Mobile), 1);
        assert_eq!(tracker.installs(), 3);

        tracker.reset();
        for category in Category::ALL {
            assert_eq!(tracker.usage(category), 0);
        }
    }
}
