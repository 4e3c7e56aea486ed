use std::collections::BTreeMap;
use crate::attribution::allocator::{allocate, Collaboration, CreditedContribution};
use crate::attribution::AttributedArticle;
use crate::types::{AggregateBucket, ArticleId, ContributorBuckets, CreditPolicy, Period};

/// Overall and per-period running totals, filled in one pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub overall: ContributorBuckets,
    pub by_period: BTreeMap<Period, ContributorBuckets>,
}

impl Aggregates {
    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.by_period.keys()
    }
}

/// Single-writer fold over attributed articles. Accumulation is plain
/// summation, so input order never changes the totals.
#[derive(Debug)]
pub struct Aggregator {
    policy: CreditPolicy,
    totals: Aggregates,
}

impl Aggregator {
    pub fn new(policy: CreditPolicy) -> Self {
        Aggregator { policy, totals: Aggregates::default() }
    }

    pub fn add(&mut self, article: &AttributedArticle) {
        let contributions = allocate(&article.record, &article.authors, self.policy);
        if contributions.is_empty() { return; }

        // Period is derived once per article; undated articles skip the monthly view.
        let period = article.record.period();
        let id = &article.record.id;

        for c in &contributions {
            absorb(self.totals.overall.entry(c.contributor.clone()).or_default(), id, c);
            if let Some(p) = period {
                let month = self.totals.by_period.entry(p).or_default();
                absorb(month.entry(c.contributor.clone()).or_default(), id, c);
            }
        }
    }

    pub fn finish(self) -> Aggregates {
        self.totals
    }
}

/// Convenience wrapper: folds every article into fresh totals.
pub fn aggregate(articles: &[AttributedArticle], policy: CreditPolicy) -> Aggregates {
    let mut agg = Aggregator::new(policy);
    for a in articles {
        agg.add(a);
    }
    agg.finish()
}

fn absorb(bucket: &mut AggregateBucket, article: &ArticleId, contribution: &CreditedContribution) {
    for (key, value) in &contribution.credits {
        *bucket.metrics.entry(key.clone()).or_insert(0.0) += value;
    }
    // The same article exported twice adds its traffic twice but is one article.
    if bucket.seen.insert(article.clone()) {
        bucket.article_count += 1;
        match contribution.collaboration {
            Collaboration::Solo          => bucket.solo_count += 1,
            Collaboration::Collaborative => bucket.collab_count += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::{attribute, resolver::AuthorResolver};
    use crate::types::{ArticleRecord, ContributorId};
    use chrono::NaiveDate;

    fn rec(id: &str, authors: Option<&str>, views: f64, date: Option<(i32, u32, u32)>) -> ArticleRecord {
        ArticleRecord {
            id: ArticleId(id.to_string()),
            url: id.to_string(),
            title: id.to_string(),
            published: date.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(10, 0, 0).unwrap()),
            authors_raw: authors.map(str::to_string),
            metrics: BTreeMap::from([("views".to_string(), views)]),
            source_file: "t.csv".to_string(),
        }
    }

    fn scenario() -> Vec<ArticleRecord> {
        vec![
            rec("A", Some("Jane Doe, John Roe"), 100.0, Some((2024, 7, 3))),
            rec("B", Some("Jane Doe"), 50.0, Some((2024, 8, 9))),
            rec("C", None, 999.0, Some((2024, 8, 10))),
        ]
    }

    fn run(records: Vec<ArticleRecord>, ignored: &[&str], policy: CreditPolicy) -> Aggregates {
        let articles = attribute(records, &AuthorResolver::new(ignored.iter().copied()));
        aggregate(&articles, policy)
    }

    fn id(s: &str) -> ContributorId {
        ContributorId::new(s)
    }

    #[test]
    fn test_equal_split_scenario() {
        let agg = run(scenario(), &[], CreditPolicy::EqualSplit);
        assert_eq!(agg.overall[&id("Jane Doe")].metric("views"), 100.0, "50 (half of A) + 50 (all of B)");
        assert_eq!(agg.overall[&id("John Roe")].metric("views"), 50.0);
        assert_eq!(agg.overall[&id("Jane Doe")].article_count, 2);
        assert_eq!(agg.overall[&id("John Roe")].article_count, 1);
        assert_eq!(agg.overall.len(), 2, "article C has no authors and credits nobody");
    }

    #[test]
    fn test_full_credit_scenario() {
        let agg = run(scenario(), &[], CreditPolicy::Full);
        assert_eq!(agg.overall[&id("Jane Doe")].metric("views"), 150.0);
        assert_eq!(agg.overall[&id("John Roe")].metric("views"), 100.0);
        assert_eq!(agg.overall.len(), 2);
    }

    #[test]
    fn test_ignored_author_leaves_no_trace() {
        let agg = run(scenario(), &["John Roe"], CreditPolicy::EqualSplit);
        assert_eq!(agg.overall[&id("Jane Doe")].metric("views"), 100.0,
            "Jane's share is computed before ignoring, so it stays 50 + 50");
        assert!(!agg.overall.contains_key(&id("John Roe")));
        assert!(agg.by_period.values().all(|m| !m.contains_key(&id("John Roe"))),
            "ignored author must not appear in any period bucket");
    }

    #[test]
    fn test_solo_and_collab_counts() {
        let agg = run(scenario(), &[], CreditPolicy::EqualSplit);
        let jane = &agg.overall[&id("Jane Doe")];
        assert_eq!((jane.solo_count, jane.collab_count), (1, 1));
        let john = &agg.overall[&id("John Roe")];
        assert_eq!((john.solo_count, john.collab_count), (0, 1));
    }

    #[test]
    fn test_period_view_buckets_by_publish_month() {
        let agg = run(scenario(), &[], CreditPolicy::EqualSplit);
        let jul = Period::new(2024, 7).unwrap();
        let aug = Period::new(2024, 8).unwrap();
        assert_eq!(agg.periods().copied().collect::<Vec<_>>(), vec![jul, aug]);
        assert_eq!(agg.by_period[&jul][&id("Jane Doe")].metric("views"), 50.0);
        assert_eq!(agg.by_period[&aug][&id("Jane Doe")].metric("views"), 50.0);
        assert!(!agg.by_period[&aug].contains_key(&id("John Roe")));
    }

    #[test]
    fn test_undated_article_counts_overall_only() {
        let recs = vec![rec("U", Some("Jane Doe"), 10.0, None)];
        let agg = run(recs, &[], CreditPolicy::EqualSplit);
        assert_eq!(agg.overall[&id("Jane Doe")].metric("views"), 10.0);
        assert!(agg.by_period.is_empty());
    }

    #[test]
    fn test_duplicate_rows_count_one_article() {
        let recs = vec![
            rec("same-url", Some("Jane Doe"), 10.0, Some((2024, 7, 1))),
            rec("same-url", Some("Jane Doe"), 5.0, Some((2024, 7, 1))),
        ];
        let agg = run(recs, &[], CreditPolicy::EqualSplit);
        let jane = &agg.overall[&id("Jane Doe")];
        assert_eq!(jane.article_count, 1, "article_count counts distinct articles");
        assert_eq!(jane.metric("views"), 15.0, "metrics fold over every row");
    }

    #[test]
    fn test_input_order_does_not_change_totals() {
        let mut reversed = scenario();
        reversed.reverse();
        let a = run(scenario(), &[], CreditPolicy::EqualSplit);
        let b = run(reversed, &[], CreditPolicy::EqualSplit);
        for (who, bucket) in &a.overall {
            assert_eq!(bucket.metric("views"), b.overall[who].metric("views"));
            assert_eq!(bucket.article_count, b.overall[who].article_count);
        }
    }
}
