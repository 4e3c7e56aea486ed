use std::collections::BTreeMap;
use crate::types::{ArticleRecord, ContributorId, CreditPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaboration {
    Solo,
    Collaborative,
}

/// One contributor's share of one article. Computed once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditedContribution {
    pub contributor: ContributorId,
    /// metric key → allocated value
    pub credits: BTreeMap<String, f64>,
    pub collaboration: Collaboration,
}

/// Distributes an article's metric values across its contributors.
///
/// Under [`CreditPolicy::EqualSplit`] the shares of each metric add back up to the
/// article's value. Under [`CreditPolicy::Full`] every contributor receives the whole
/// value, so totals across contributors intentionally exceed the source totals.
/// Article-count credit is never split: each contributor gets one.
pub fn allocate(
    record: &ArticleRecord,
    authors: &[ContributorId],
    policy: CreditPolicy,
) -> Vec<CreditedContribution> {
    if authors.is_empty() {
        return Vec::new();
    }
    let divisor = match policy {
        CreditPolicy::Full       => 1.0,
        CreditPolicy::EqualSplit => authors.len() as f64,
    };
    let collaboration = if authors.len() == 1 {
        Collaboration::Solo
    } else {
        Collaboration::Collaborative
    };
    let credits: BTreeMap<String, f64> = record.metrics.iter()
        .map(|(k, v)| (k.clone(), v / divisor))
        .collect();

    authors.iter()
        .map(|author| CreditedContribution {
            contributor: author.clone(),
            credits: credits.clone(),
            collaboration,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArticleId;
    use proptest::prelude::*;

    fn article(views: f64, minutes: f64) -> ArticleRecord {
        ArticleRecord {
            id: ArticleId("a".to_string()),
            url: "a".to_string(),
            title: "A".to_string(),
            published: None,
            authors_raw: None,
            metrics: BTreeMap::from([
                ("views".to_string(), views),
                ("engaged_minutes".to_string(), minutes),
            ]),
            source_file: "t.csv".to_string(),
        }
    }

    fn ids(n: usize) -> Vec<ContributorId> {
        (0..n).map(|i| ContributorId::new(format!("Author {i}"))).collect()
    }

    #[test]
    fn test_no_authors_contributes_nothing() {
        assert!(allocate(&article(999.0, 1.0), &[], CreditPolicy::EqualSplit).is_empty());
        assert!(allocate(&article(999.0, 1.0), &[], CreditPolicy::Full).is_empty());
    }

    #[test]
    fn test_equal_split_halves_values() {
        let out = allocate(&article(100.0, 30.0), &ids(2), CreditPolicy::EqualSplit);
        assert_eq!(out.len(), 2);
        for c in &out {
            assert_eq!(c.credits["views"], 50.0);
            assert_eq!(c.credits["engaged_minutes"], 15.0);
            assert_eq!(c.collaboration, Collaboration::Collaborative);
        }
    }

    #[test]
    fn test_full_credit_copies_values() {
        let out = allocate(&article(100.0, 30.0), &ids(3), CreditPolicy::Full);
        assert!(out.iter().all(|c| c.credits["views"] == 100.0),
            "each co-author receives the entire value under full credit");
    }

    #[test]
    fn test_single_author_is_solo() {
        let out = allocate(&article(10.0, 1.0), &ids(1), CreditPolicy::EqualSplit);
        assert_eq!(out[0].collaboration, Collaboration::Solo);
        assert_eq!(out[0].credits["views"], 10.0);
    }

    proptest! {
        #[test]
        fn prop_equal_split_sums_to_raw(views in 0.0f64..1e9, minutes in 0.0f64..1e6, k in 1usize..12) {
            let out = allocate(&article(views, minutes), &ids(k), CreditPolicy::EqualSplit);
            let total: f64 = out.iter().map(|c| c.credits["views"]).sum();
            prop_assert!((total - views).abs() <= 1e-9 * views.max(1.0));
            let total_min: f64 = out.iter().map(|c| c.credits["engaged_minutes"]).sum();
            prop_assert!((total_min - minutes).abs() <= 1e-9 * minutes.max(1.0));
        }

        #[test]
        fn prop_full_credit_is_exact_per_author(views in 0.0f64..1e9, k in 1usize..12) {
            let out = allocate(&article(views, 0.0), &ids(k), CreditPolicy::Full);
            prop_assert_eq!(out.len(), k);
            for c in &out {
                prop_assert_eq!(c.credits["views"], views);
            }
            let total: f64 = out.iter().map(|c| c.credits["views"]).sum();
            prop_assert!((total - views * k as f64).abs() <= 1e-9 * (views * k as f64).max(1.0));
        }
    }
}
