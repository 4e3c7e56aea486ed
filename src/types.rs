use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ─── Core Article Data ────────────────────────────────────────────────────────

/// Stable key for one article: the URL when the export carries one,
/// otherwise title + publish date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArticleId(pub String);

#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub id: ArticleId,
    pub url: String,
    pub title: String,
    pub published: Option<NaiveDateTime>,
    /// Raw comma-joined author field; `None` when the cell was empty.
    pub authors_raw: Option<String>,
    /// metric key → value. Every configured metric is present, missing values are 0.
    pub metrics: BTreeMap<String, f64>,
    pub source_file: String,
}

impl ArticleRecord {
    pub fn metric(&self, key: &str) -> f64 {
        self.metrics.get(key).copied().unwrap_or(0.0)
    }

    pub fn publish_date(&self) -> Option<NaiveDate> {
        self.published.map(|ts| ts.date())
    }

    pub fn period(&self) -> Option<Period> {
        self.publish_date().map(Period::from_date)
    }
}

/// Canonical contributor key: the full trimmed author token, case preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContributorId(pub String);

impl ContributorId {
    pub fn new(name: impl Into<String>) -> Self {
        ContributorId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading whitespace-delimited token, used for rendering only.
    /// Two contributors sharing a first name stay distinct keys.
    pub fn display_name(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ContributorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Periods & Ranges ─────────────────────────────────────────────────────────

/// Calendar year-month bucket. Ordered by (year, month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    start: NaiveDate,
}

impl Period {
    pub fn from_date(date: NaiveDate) -> Self {
        Period { start: date.with_day(1).unwrap_or(date) }
    }

    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|start| Period { start })
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// `[first day, first day of next month)`
    pub fn range(&self) -> DateRange {
        let end = self.start
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        DateRange { start: self.start, end }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Half-open calendar range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Builds a range from an inclusive last day.
    pub fn through(start: NaiveDate, last_day: NaiveDate) -> Self {
        DateRange { start, end: last_day.succ_opt().unwrap_or(NaiveDate::MAX) }
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.start)
    }
}

// ─── Metrics & Policy ─────────────────────────────────────────────────────────

/// One additive metric column of the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricSpec {
    pub key: String,
    pub column: String,
    pub label: String,
}

impl MetricSpec {
    pub fn new(key: &str, column: &str, label: &str) -> Self {
        MetricSpec { key: key.to_string(), column: column.to_string(), label: label.to_string() }
    }
}

pub fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new("views",           "Views",           "VIEWS"),
        MetricSpec::new("visitors",        "Visitors",        "VISITORS"),
        MetricSpec::new("social_refs",     "Social refs",     "SOCIAL REFS"),
        MetricSpec::new("new_visitors",    "New vis.",        "NEW VISITORS"),
        MetricSpec::new("engaged_minutes", "Engaged minutes", "ENGAGED MINUTES"),
    ]
}

/// How a shared article's metric values are distributed among co-authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum CreditPolicy {
    /// Every co-author receives the entire value. Totals may exceed the source totals.
    #[serde(rename = "full")]
    #[value(name = "full")]
    Full,
    /// The value is divided evenly among co-authors.
    #[serde(rename = "split")]
    #[value(name = "split")]
    EqualSplit,
}

impl fmt::Display for CreditPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditPolicy::Full       => write!(f, "full credit"),
            CreditPolicy::EqualSplit => write!(f, "equal split"),
        }
    }
}

/// How contributor names are rendered in compact per-period output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NameStyle {
    First,
    Full,
}

impl NameStyle {
    pub fn render<'a>(&self, id: &'a ContributorId) -> &'a str {
        match self {
            NameStyle::First => id.display_name(),
            NameStyle::Full  => id.as_str(),
        }
    }
}

/// A value contributors are ranked by.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankedMetric {
    /// Allocated sum of an additive metric.
    Sum { key: String, label: String },
    /// Distinct articles credited.
    Articles,
    /// Distinct (title, date) publications within the requested range.
    Publications,
    /// Allocated sum of `key` per credited article.
    Average { key: String, label: String },
}

impl RankedMetric {
    pub fn label(&self) -> String {
        match self {
            RankedMetric::Sum { label, .. }     => label.clone(),
            RankedMetric::Articles              => "ARTICLES".to_string(),
            RankedMetric::Publications          => "PUBLICATIONS".to_string(),
            RankedMetric::Average { label, .. } => format!("AVG {label}"),
        }
    }

    pub fn is_average(&self) -> bool {
        matches!(self, RankedMetric::Average { .. })
    }
}

// ─── Aggregation ──────────────────────────────────────────────────────────────

/// Running totals for one contributor (or contributor × period).
/// Only ever accumulates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateBucket {
    pub metrics: BTreeMap<String, f64>,
    pub article_count: usize,
    pub solo_count: usize,
    pub collab_count: usize,
    #[serde(skip)]
    pub(crate) seen: HashSet<ArticleId>,
}

impl AggregateBucket {
    pub fn metric(&self, key: &str) -> f64 {
        self.metrics.get(key).copied().unwrap_or(0.0)
    }
}

pub type ContributorBuckets = BTreeMap<ContributorId, AggregateBucket>;

// ─── Ranking ──────────────────────────────────────────────────────────────────

/// One contributor's value in a single ranking scope, before ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub contributor: ContributorId,
    pub value: f64,
    pub article_count: usize,
    pub solo_count: usize,
    pub collab_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    /// 1-based; tied entries share a rank.
    pub rank: usize,
    pub contributor: ContributorId,
    pub value: f64,
    pub article_count: usize,
    pub solo_count: usize,
    pub collab_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieGroup {
    pub rank: usize,
    pub value: f64,
    pub members: Vec<ContributorId>,
}

impl TieGroup {
    pub fn is_tie(&self) -> bool {
        self.members.len() > 1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    pub entries: Vec<RankingEntry>,
    pub groups: Vec<TieGroup>,
    /// Leader vs runner-up, in percent, taken before the top-N cut. `None` with
    /// fewer than two contributors.
    pub leader_gap: Option<f64>,
}

impl Ranking {
    pub fn leaders(&self) -> Option<&TieGroup> {
        self.groups.first().filter(|g| g.rank == 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineComparison {
    pub cohort: Vec<ContributorId>,
    pub mean: f64,
    pub gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRanking {
    pub period: Period,
    pub ranking: Ranking,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinRecord {
    pub contributor: ContributorId,
    pub wins: usize,
    pub tied_wins: usize,
}

// ─── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct InputFileMeta {
    pub name: String,
    pub path: String,
    pub modified: Option<String>,
    pub rows: usize,
    pub export_window: Option<DateRange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub inputs: Vec<InputFileMeta>,
    pub min_date: Option<NaiveDate>,
    pub top: usize,
    pub top_monthly: usize,
    pub ignored_authors: Vec<String>,
    pub credit_policy: CreditPolicy,
    pub metrics: Vec<String>,
    pub article_count: usize,
    pub undated_count: usize,
    pub contributor_count: usize,
    pub collaborator_count: usize,
    pub overall_range: Option<DateRange>,
    pub analyzed_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricReport {
    pub metric: RankedMetric,
    pub overall: Ranking,
    pub baseline: Option<BaselineComparison>,
    pub periods: Vec<PeriodRanking>,
    pub wins: Vec<WinRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub metrics: Vec<MetricReport>,
}
