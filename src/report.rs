use std::collections::HashMap;
use crate::analyzers::aggregate::Aggregates;
use crate::analyzers::publications::count_publications;
use crate::analyzers::ranking::{baseline_mean, percent_gap, rank};
use crate::analyzers::win_tally::tally_wins;
use crate::attribution::AttributedArticle;
use crate::types::*;

/// Knobs that shape the rankings, resolved from CLI flags and config.
#[derive(Debug, Clone)]
pub struct RankSettings {
    pub top: usize,
    pub top_monthly: usize,
    pub ranked: Vec<RankedMetric>,
    pub baseline_cohort: Vec<ContributorId>,
}

/// The ranked metric list: every additive metric, then article count and
/// publications, then the requested per-article averages.
pub fn ranked_metrics(metrics: &[MetricSpec], averages: &[String]) -> Vec<RankedMetric> {
    let mut ranked: Vec<RankedMetric> = metrics.iter()
        .map(|m| RankedMetric::Sum { key: m.key.clone(), label: m.label.clone() })
        .collect();
    ranked.push(RankedMetric::Articles);
    ranked.push(RankedMetric::Publications);
    ranked.extend(averages.iter().filter_map(|key| {
        metrics.iter()
            .find(|m| &m.key == key)
            .map(|m| RankedMetric::Average { key: m.key.clone(), label: m.label.clone() })
    }));
    ranked
}

/// Ranks every configured metric overall and per period, and tallies monthly wins.
pub fn build_metric_reports(
    articles:      &[AttributedArticle],
    aggregates:    &Aggregates,
    overall_range: Option<DateRange>,
    settings:      &RankSettings,
) -> Vec<MetricReport> {
    // Publications are a distinct count per range, so each range gets its own pass.
    let needs_publications = settings.ranked.contains(&RankedMetric::Publications);
    let overall_pubs = match (needs_publications, overall_range) {
        (true, Some(range)) => count_publications(articles, &range),
        _ => HashMap::new(),
    };
    let period_pubs: HashMap<Period, HashMap<ContributorId, usize>> = if needs_publications {
        aggregates.periods()
            .map(|p| (*p, count_publications(articles, &p.range())))
            .collect()
    } else {
        HashMap::new()
    };
    let no_pubs = HashMap::new();

    settings.ranked.iter().map(|metric| {
        let standings_all = standings(metric, &aggregates.overall, &overall_pubs);
        let baseline = baseline_for(&standings_all, &settings.baseline_cohort);
        let overall = rank(standings_all, settings.top);
        let baseline = baseline.and_then(|(cohort, mean)| {
            overall.entries.first().map(|leader| BaselineComparison {
                cohort,
                mean,
                gap: percent_gap(leader.value, mean),
            })
        });

        let periods: Vec<PeriodRanking> = aggregates.by_period.iter()
            .map(|(period, buckets)| {
                let pubs = period_pubs.get(period).unwrap_or(&no_pubs);
                PeriodRanking {
                    period: *period,
                    ranking: rank(standings(metric, buckets, pubs), settings.top_monthly),
                }
            })
            .collect();
        let wins = tally_wins(&periods);

        MetricReport { metric: metric.clone(), overall, baseline, periods, wins }
    }).collect()
}

/// (unique contributors, contributors with at least one collaborative article)
pub fn collaboration_summary(aggregates: &Aggregates) -> (usize, usize) {
    let total = aggregates.overall.len();
    let collaborators = aggregates.overall.values().filter(|b| b.collab_count > 0).count();
    (total, collaborators)
}

fn standings(
    metric:       &RankedMetric,
    buckets:      &ContributorBuckets,
    publications: &HashMap<ContributorId, usize>,
) -> Vec<Standing> {
    buckets.iter().map(|(who, bucket)| Standing {
        contributor:   who.clone(),
        value:         metric_value(metric, who, bucket, publications),
        article_count: bucket.article_count,
        solo_count:    bucket.solo_count,
        collab_count:  bucket.collab_count,
    }).collect()
}

fn metric_value(
    metric:       &RankedMetric,
    who:          &ContributorId,
    bucket:       &AggregateBucket,
    publications: &HashMap<ContributorId, usize>,
) -> f64 {
    match metric {
        RankedMetric::Sum { key, .. } => bucket.metric(key),
        RankedMetric::Articles        => bucket.article_count as f64,
        RankedMetric::Publications    => publications.get(who).copied().unwrap_or(0) as f64,
        RankedMetric::Average { key, .. } => {
            if bucket.article_count == 0 { 0.0 } else { bucket.metric(key) / bucket.article_count as f64 }
        }
    }
}

fn baseline_for(standings: &[Standing], cohort: &[ContributorId]) -> Option<(Vec<ContributorId>, f64)> {
    if cohort.is_empty() { return None; }
    baseline_mean(standings, cohort).map(|mean| (cohort.to_vec(), mean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;
    use crate::analyzers::publications::overall_range;
    use crate::attribution::{attribute, resolver::AuthorResolver};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn rec(url: &str, title: &str, authors: &str, views: f64, minutes: f64, ymd: (i32, u32, u32)) -> ArticleRecord {
        let day = NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap();
        ArticleRecord {
            id: ArticleId(url.to_string()),
            url: url.to_string(),
            title: title.to_string(),
            published: Some(day.and_hms_opt(9, 0, 0).unwrap()),
            authors_raw: Some(authors.to_string()),
            metrics: BTreeMap::from([
                ("views".to_string(), views),
                ("engaged_minutes".to_string(), minutes),
            ]),
            source_file: "t.csv".to_string(),
        }
    }

    fn metrics() -> Vec<MetricSpec> {
        vec![
            MetricSpec::new("views", "Views", "VIEWS"),
            MetricSpec::new("engaged_minutes", "Engaged minutes", "ENGAGED MINUTES"),
        ]
    }

    fn settings(top: usize, cohort: &[&str]) -> RankSettings {
        RankSettings {
            top,
            top_monthly: 3,
            ranked: ranked_metrics(&metrics(), &["engaged_minutes".to_string()]),
            baseline_cohort: cohort.iter().map(|c| ContributorId::new(*c)).collect(),
        }
    }

    fn build(records: Vec<ArticleRecord>, s: &RankSettings) -> Vec<MetricReport> {
        let articles = attribute(records, &AuthorResolver::default());
        let agg = aggregate(&articles, CreditPolicy::EqualSplit);
        let range = overall_range(&articles, None, None);
        build_metric_reports(&articles, &agg, range, s)
    }

    fn find<'a>(reports: &'a [MetricReport], label: &str) -> &'a MetricReport {
        reports.iter().find(|r| r.metric.label() == label)
            .unwrap_or_else(|| panic!("no report for {label}"))
    }

    fn sample() -> Vec<ArticleRecord> {
        vec![
            rec("a", "Budget", "Jane Doe, John Roe", 100.0, 10.0, (2024, 7, 3)),
            rec("b", "Parks",  "Jane Doe",            50.0, 20.0, (2024, 7, 9)),
            rec("c", "Roads",  "John Roe",            80.0,  4.0, (2024, 8, 1)),
            rec("d", "Crime",  "Bob Poe",             30.0,  3.0, (2024, 8, 2)),
        ]
    }

    #[test]
    fn test_ranked_metric_order() {
        let ranked = ranked_metrics(&metrics(), &["engaged_minutes".to_string(), "missing".to_string()]);
        let labels: Vec<String> = ranked.iter().map(RankedMetric::label).collect();
        assert_eq!(labels, vec!["VIEWS", "ENGAGED MINUTES", "ARTICLES", "PUBLICATIONS", "AVG ENGAGED MINUTES"],
            "unknown average keys are skipped");
    }

    #[test]
    fn test_overall_views_ranking() {
        let reports = build(sample(), &settings(5, &[]));
        let views = find(&reports, "VIEWS");
        let order: Vec<(&str, f64)> = views.overall.entries.iter()
            .map(|e| (e.contributor.as_str(), e.value))
            .collect();
        assert_eq!(order, vec![("John Roe", 130.0), ("Jane Doe", 100.0), ("Bob Poe", 30.0)]);
        assert!((views.overall.leader_gap.unwrap() - 30.0).abs() < 1e-9);
        assert!(views.baseline.is_none(), "no cohort configured");
    }

    #[test]
    fn test_average_divides_by_article_count() {
        let reports = build(sample(), &settings(5, &[]));
        let avg = find(&reports, "AVG ENGAGED MINUTES");
        let jane = avg.overall.entries.iter().find(|e| e.contributor.as_str() == "Jane Doe").unwrap();
        // (10 / 2 + 20) / 2 articles
        assert!((jane.value - 12.5).abs() < 1e-9, "got {}", jane.value);
    }

    #[test]
    fn test_publications_per_period() {
        let reports = build(sample(), &settings(5, &[]));
        let pubs = find(&reports, "PUBLICATIONS");
        let jane = pubs.overall.entries.iter().find(|e| e.contributor.as_str() == "Jane Doe").unwrap();
        assert_eq!(jane.value, 2.0);
        let aug = pubs.periods.iter().find(|p| p.period.to_string() == "2024-08").unwrap();
        assert!(aug.ranking.entries.iter().all(|e| e.contributor.as_str() != "Jane Doe"),
            "Jane has no August bucket");
    }

    #[test]
    fn test_period_rankings_and_wins() {
        let reports = build(sample(), &settings(5, &[]));
        let views = find(&reports, "VIEWS");
        assert_eq!(views.periods.len(), 2);
        let jul_leader = views.periods[0].ranking.leaders().unwrap();
        assert_eq!(jul_leader.members, vec![ContributorId::new("Jane Doe")], "Jane 100 vs John 50 in July");
        let wins: Vec<(&str, usize)> = views.wins.iter().map(|w| (w.contributor.as_str(), w.wins)).collect();
        assert_eq!(wins, vec![("Jane Doe", 1), ("John Roe", 1)]);
    }

    #[test]
    fn test_baseline_gap_against_cohort() {
        let reports = build(sample(), &settings(5, &["Jane Doe", "Bob Poe"]));
        let views = find(&reports, "VIEWS");
        let b = views.baseline.as_ref().expect("cohort configured");
        assert!((b.mean - 65.0).abs() < 1e-9, "mean of 100 and 30");
        assert!((b.gap - (130.0 - 65.0) / 65.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_one_tie_shows_both_and_both_win() {
        let recs = vec![
            rec("a", "A", "Jane Doe", 70.0, 1.0, (2024, 7, 1)),
            rec("b", "B", "John Roe", 70.0, 1.0, (2024, 7, 2)),
            rec("c", "C", "Bob Poe",  10.0, 1.0, (2024, 7, 3)),
        ];
        let mut s = settings(1, &[]);
        s.top_monthly = 1;
        let reports = build(recs, &s);
        let views = find(&reports, "VIEWS");
        assert_eq!(views.overall.entries.len(), 2, "top-1 with a two-way tie shows both");
        assert!(views.periods[0].ranking.leaders().unwrap().is_tie());
        assert_eq!(views.wins.len(), 2);
        assert!(views.wins.iter().all(|w| w.wins == 1 && w.tied_wins == 1));
    }

    #[test]
    fn test_collaboration_summary() {
        let articles = attribute(sample(), &AuthorResolver::default());
        let agg = aggregate(&articles, CreditPolicy::EqualSplit);
        assert_eq!(collaboration_summary(&agg), (3, 2));
    }
}
