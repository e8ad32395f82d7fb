//! License Calculator
//!
//! The allocation engine: given one [`DemandSummary`] per user and a [`LicenseRule`], it
//! counts how many licenses are needed to cover every install.
//!
//! ## Algorithm
//!
//! Users never share a license, so each summary is covered on its own. For a summary the
//! calculator repeatedly opens a fresh license and fills it one install at a time:
//!
//! 1. The eligible categories are those with remaining demand whose per-category cap on
//!    the current license is not yet reached.
//! 2. Among them the category with the most remaining demand is taken. Ties go to the
//!    category with the smaller per-category cap, then to enumeration order.
//! 3. The license is closed when it reaches the rule's total cap or nothing is eligible.
//!
//! A license that closes before a single install was placed means the leftover demand can
//! never be covered, and the calculation fails with [`LicenseError::InfeasibleDemand`].
//!
//! ## Ownership
//!
//! Summaries are borrowed. The calculator copies each summary's counts before consuming
//! them, so the caller's summaries are left untouched.
//!
//! ## Parallelism
//!
//! With the `parallel` feature, [`LicenseCalculator::with_parallel`] spreads users over a
//! rayon pool. Each worker owns its working copy and its [`LicenseUsageTracker`]; only
//! the rule is shared.

use crate::dedup::summarize_by_user;
use crate::error::LicenseError;
use crate::models::{Category, CategoryMap, DemandSummary, InstallRecord, LicenseRule};
use crate::tracker::LicenseUsageTracker;
use serde::Serialize;
use std::cmp::Reverse;

/// Licenses needed by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAllocation {
    pub user_id: u64,
    pub licenses: u64,
    pub installs: CategoryMap<u32>,
}

#[derive(Debug, Clone)]
pub struct LicenseCalculator {
    rule: LicenseRule,
    parallel: bool,
}

impl LicenseCalculator {
    /// Creates a calculator, rejecting rules that fail [`LicenseRule::validate`].
    pub fn new(rule: LicenseRule) -> Result<Self, LicenseError> {
        rule.validate()?;
        Ok(Self {
            rule,
            parallel: false,
        })
    }

    /// Requests per-user work on the rayon pool. Ignored without the `parallel` feature.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel && cfg!(feature = "parallel")
    }

    pub fn rule(&self) -> &LicenseRule {
        &self.rule
    }

    /// Total licenses needed to cover every summary.
    pub fn compute_minimum_licenses(&self, summaries: &[DemandSummary]) -> Result<u64, LicenseError> {
        let allocations = self.allocate(summaries)?;
        Ok(allocations.iter().map(|a| a.licenses).sum())
    }

    /// Groups raw records per user, deduplicates them and computes the total.
    pub fn compute_from_records(&self, records: &[InstallRecord]) -> Result<u64, LicenseError> {
        self.compute_minimum_licenses(&summarize_by_user(records))
    }

    /// Per-user breakdown, in the order of `summaries`.
    pub fn allocate(&self, summaries: &[DemandSummary]) -> Result<Vec<UserAllocation>, LicenseError> {
        #[cfg(feature = "parallel")]
        if self.parallel {
            use rayon::prelude::*;

            return summaries
                .par_iter()
                .map_init(LicenseUsageTracker::new, |tracker, summary| {
                    self.allocation_for(summary, tracker)
                })
                .collect();
        }

        let mut tracker = LicenseUsageTracker::new();
        summaries
            .iter()
            .map(|summary| self.allocation_for(summary, &mut tracker))
            .collect()
    }

    /// Licenses needed to cover one user's demand.
    pub fn licenses_for(&self, summary: &DemandSummary) -> Result<u64, LicenseError> {
        let mut tracker = LicenseUsageTracker::new();
        self.fill_licenses(summary, &mut tracker)
    }

    fn allocation_for(
        &self,
        summary: &DemandSummary,
        tracker: &mut LicenseUsageTracker,
    ) -> Result<UserAllocation, LicenseError> {
        let licenses = self.fill_licenses(summary, tracker)?;
        Ok(UserAllocation {
            user_id: summary.user_id,
            licenses,
            installs: summary.counts,
        })
    }

    fn fill_licenses(
        &self,
        summary: &DemandSummary,
        tracker: &mut LicenseUsageTracker,
    ) -> Result<u64, LicenseError> {
        let mut working = summary.counts;
        // One user's demand can exceed u32::MAX installs in total.
        let mut licenses = 0u64;

        while !working.is_all_zero() {
            tracker.reset();
            licenses += 1;

            let mut installs = 0u32;
            while installs < self.rule.total_max_install {
                let Some(pick) = self.next_category(&working, tracker) else {
                    if installs == 0 {
                        return Err(self.infeasible(summary.user_id, &working));
                    }
                    break;
                };

                working[pick] -= 1;
                tracker.record(pick);
                installs += 1;
            }

            tracing::trace!(
                user_id = summary.user_id,
                license = licenses,
                installs = installs,
                "License filled"
            );
        }

        Ok(licenses)
    }

    fn next_category(
        &self,
        working: &CategoryMap<u32>,
        tracker: &LicenseUsageTracker,
    ) -> Option<Category> {
        Category::ALL
            .into_iter()
            .filter(|&c| working[c] > 0 && tracker.usage(c) < self.rule.cap(c))
            .min_by_key(|&c| (Reverse(working[c]), self.rule.cap(c), c.index()))
    }

    fn infeasible(&self, user_id: u64, working: &CategoryMap<u32>) -> LicenseError {
        // A fresh license accepts any category with a nonzero cap, so whatever is left
        // has a cap of zero.
        let category = Category::ALL
            .into_iter()
            .find(|&c| working[c] > 0)
            .unwrap_or(Category::Desktop);

        tracing::warn!(
            user_id = user_id,
            category = %category,
            remaining = working[category],
            "Demand cannot be covered by the license rule"
        );

        LicenseError::InfeasibleDemand { user_id, category }
    }
}

/// Validates `rule` and returns the total licenses needed for `summaries`.
pub fn compute_minimum_licenses(
    summaries: &[DemandSummary],
    rule: &LicenseRule,
) -> Result<u64, LicenseError> {
    LicenseCalculator::new(rule.clone())?.compute_minimum_licenses(summaries)
}
