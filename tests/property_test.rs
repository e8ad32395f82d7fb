//! Property tests for rule validation, deduplication and the allocation engine.

use flex_license::dedup::summarize_by_user;
use flex_license::{Category, DemandSummary, InstallRecord, LicenseCalculator, LicenseRule};
use proptest::prelude::*;

fn category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Desktop),
        Just(Category::Laptop),
        Just(Category::Mobile),
    ]
}

/// Valid rules: caps never above the total and at least one cap nonzero.
fn valid_rule() -> impl Strategy<Value = LicenseRule> {
    (1u32..=5)
        .prop_flat_map(|total| (Just(total), prop::array::uniform3(0..=total)))
        .prop_filter("some category must be coverable", |(_, caps)| {
            caps.iter().any(|c| *c > 0)
        })
        .prop_map(|(total, caps)| {
            LicenseRule::new(total, Category::ALL.into_iter().zip(caps))
        })
}

fn demand() -> impl Strategy<Value = [u32; 3]> {
    prop::array::uniform3(0u32..8)
}

fn summary_of(counts: [u32; 3]) -> DemandSummary {
    DemandSummary::new(1, Category::ALL.into_iter().zip(counts).collect())
}

fn ceil_div(n: u32, d: u32) -> u32 {
    (n + d - 1) / d
}

fn install_record() -> impl Strategy<Value = InstallRecord> {
    (1u64..3, 1u64..6, 1u64..4, category())
        .prop_map(|(app, device, user, category)| InstallRecord::new(app, device, user, category))
}

proptest! {
    #[test]
    fn zero_total_is_never_valid(caps in prop::array::uniform3(0u32..10)) {
        let rule = LicenseRule::new(0, Category::ALL.into_iter().zip(caps));
        prop_assert!(!rule.is_valid());
    }

    #[test]
    fn all_zero_caps_are_never_valid(total in 0u32..10) {
        let rule = LicenseRule::new(total, []);
        prop_assert!(!rule.is_valid());
    }

    #[test]
    fn cap_above_total_is_never_valid(total in 1u32..10, excess in 1u32..5, category in category()) {
        let rule = LicenseRule::new(total, [(category, total + excess)]);
        prop_assert!(!rule.is_valid());
    }

    #[test]
    fn generated_rules_are_valid(rule in valid_rule()) {
        prop_assert!(rule.is_valid());
    }

    #[test]
    fn dedup_is_idempotent(records in prop::collection::vec(install_record(), 0..40)) {
        let mut doubled = records.clone();
        doubled.extend(records.iter().copied());

        prop_assert_eq!(summarize_by_user(&records), summarize_by_user(&doubled));
    }

    #[test]
    fn more_demand_never_needs_fewer_licenses(
        rule in valid_rule(),
        counts in demand(),
        grow in 0usize..3,
    ) {
        let calculator = LicenseCalculator::new(rule).unwrap();
        let mut larger = counts;
        larger[grow] += 1;

        if let (Ok(base), Ok(more)) = (
            calculator.licenses_for(&summary_of(counts)),
            calculator.licenses_for(&summary_of(larger)),
        ) {
            prop_assert!(more >= base, "{:?} -> {}, {:?} -> {}", counts, base, larger, more);
        }
    }

    #[test]
    fn count_respects_lower_bound(rule in valid_rule(), counts in demand()) {
        let calculator = LicenseCalculator::new(rule.clone()).unwrap();
        let summary = summary_of(counts);

        match calculator.licenses_for(&summary) {
            Ok(licenses) => {
                let total: u32 = counts.iter().sum();
                let mut bound = ceil_div(total, rule.total_max_install);
                for category in Category::ALL {
                    let cap = rule.cap(category);
                    if cap > 0 {
                        bound = bound.max(ceil_div(summary.count(category), cap));
                    }
                }
                prop_assert!(licenses >= u64::from(bound));
                prop_assert!(licenses <= summary.total_installs());
            }
            Err(_) => {
                let uncoverable = Category::ALL
                    .into_iter()
                    .any(|c| summary.count(c) > 0 && rule.cap(c) == 0);
                prop_assert!(uncoverable);
            }
        }
    }
}
