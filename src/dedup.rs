//! Demand Summarization
//!
//! Turns raw [`InstallRecord`]s into one [`DemandSummary`] per user. Exact duplicate
//! records (same application, device, user and category) are counted once, so a log
//! that reports the same installation twice never inflates the license count.
//!
//! Grouping is by user id in ascending order, which keeps the output deterministic
//! regardless of the order records were read in.

use crate::models::{CategoryMap, DemandSummary, InstallRecord};
use std::collections::{BTreeMap, HashSet};

/// Counts gathered while summarizing, surfaced in reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub records_seen: usize,
    pub duplicates_removed: usize,
}

impl DedupStats {
    pub fn distinct_records(&self) -> usize {
        self.records_seen - self.duplicates_removed
    }
}

impl DemandSummary {
    /// Builds a summary from records belonging to `user_id`.
    ///
    /// Records are deduplicated by value before counting. Records of other users are
    /// ignored; use [`summarize_by_user`] to split mixed input.
    pub fn from_records<'a, I>(user_id: u64, records: I) -> Self
    where
        I: IntoIterator<Item = &'a InstallRecord>,
    {
        let distinct: HashSet<&InstallRecord> = records
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();

        let mut counts = CategoryMap::<u32>::default();
        for record in distinct {
            counts[record.category] += 1;
        }

        Self::new(user_id, counts)
    }
}

/// Groups records by user and builds one deduplicated summary per user.
pub fn summarize_by_user(records: &[InstallRecord]) -> Vec<DemandSummary> {
    summarize_with_stats(records).0
}

/// Same as [`summarize_by_user`], also reporting how many duplicates were dropped.
pub fn summarize_with_stats(records: &[InstallRecord]) -> (Vec<DemandSummary>, DedupStats) {
    let mut by_user: BTreeMap<u64, Vec<&InstallRecord>> = BTreeMap::new();
    for record in records {
        by_user.entry(record.user_id).or_default().push(record);
    }

    let mut stats = DedupStats {
        records_seen: records.len(),
        duplicates_removed: 0,
    };

    let summaries: Vec<DemandSummary> = by_user
        .into_iter()
        .map(|(user_id, user_records)| {
            let summary = DemandSummary::from_records(user_id, user_records.iter().copied());
            stats.duplicates_removed += user_records.len() - summary.total_installs() as usize;
            summary
        })
        .collect();

    tracing::debug!(
        users = summaries.len(),
        records_seen = stats.records_seen,
        duplicates_removed = stats.duplicates_removed,
        "Summarized install records"
    );

    (summaries, stats)
}
