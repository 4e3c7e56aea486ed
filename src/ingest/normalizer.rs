use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use std::collections::BTreeMap;
use crate::types::{ArticleId, ArticleRecord, MetricSpec};

pub const URL_COLUMN: &str = "URL";
pub const TITLE_COLUMN: &str = "Title";
pub const DATE_COLUMN: &str = "Publish date";
pub const AUTHORS_COLUMN: &str = "Authors";

// Tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
];

/// Column positions resolved once per file from its header row.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub url: Option<usize>,
    pub title: Option<usize>,
    pub date: usize,
    pub authors: usize,
    /// metric key → column position; `None` when the export lacks the column.
    pub metrics: Vec<(String, Option<usize>)>,
}

impl ColumnMap {
    /// Resolves required and metric columns. On failure returns the name of the
    /// first missing required column.
    pub fn resolve(headers: &StringRecord, metrics: &[MetricSpec]) -> Result<ColumnMap, String> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let url = find(URL_COLUMN);
        let title = find(TITLE_COLUMN);
        if url.is_none() && title.is_none() {
            return Err(format!("{URL_COLUMN}' or '{TITLE_COLUMN}"));
        }
        let date = find(DATE_COLUMN).ok_or_else(|| DATE_COLUMN.to_string())?;
        let authors = find(AUTHORS_COLUMN).ok_or_else(|| AUTHORS_COLUMN.to_string())?;

        let metrics = metrics.iter()
            .map(|m| (m.key.clone(), find(m.column.as_str())))
            .collect();

        Ok(ColumnMap { url, title, date, authors, metrics })
    }

    pub fn missing_metrics(&self) -> Vec<&str> {
        self.metrics.iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Per-file counts of locally recovered data problems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowStats {
    pub rows: usize,
    pub bad_dates: usize,
    pub bad_numbers: usize,
    pub no_authors: usize,
}

impl RowStats {
    pub fn merge(&mut self, other: RowStats) {
        self.rows += other.rows;
        self.bad_dates += other.bad_dates;
        self.bad_numbers += other.bad_numbers;
        self.no_authors += other.no_authors;
    }
}

/// Turns one raw export row into an [`ArticleRecord`]. Never fails: an
/// unparseable date becomes `None`, an unparseable number becomes 0.
pub fn normalize_row(
    row: &StringRecord,
    columns: &ColumnMap,
    source_file: &str,
    stats: &mut RowStats,
) -> ArticleRecord {
    stats.rows += 1;
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(str::trim).unwrap_or("");

    let url = cell(columns.url).to_string();
    let title = cell(columns.title).to_string();

    let date_raw = cell(Some(columns.date));
    let published = parse_publish_date(date_raw);
    if published.is_none() {
        stats.bad_dates += 1;
        tracing::debug!(file = source_file, row = stats.rows, value = date_raw, "unparseable publish date");
    }

    let authors_raw = match cell(Some(columns.authors)) {
        "" => {
            stats.no_authors += 1;
            None
        }
        a => Some(a.to_string()),
    };

    let mut metrics = BTreeMap::new();
    for (key, idx) in &columns.metrics {
        let raw = cell(*idx);
        let value = match parse_metric(raw) {
            Some(v) => v,
            None => {
                stats.bad_numbers += 1;
                tracing::debug!(file = source_file, row = stats.rows, metric = key.as_str(), value = raw, "non-numeric metric");
                0.0
            }
        };
        metrics.insert(key.clone(), value);
    }

    ArticleRecord {
        id: article_id(&url, &title, published),
        url,
        title,
        published,
        authors_raw,
        metrics,
        source_file: source_file.to_string(),
    }
}

fn article_id(url: &str, title: &str, published: Option<NaiveDateTime>) -> ArticleId {
    if !url.is_empty() {
        return ArticleId(url.to_string());
    }
    let day = published
        .map(|ts| ts.date().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_string());
    ArticleId(format!("{title}_{day}"))
}

/// Tolerant publish-date parsing. Returns `None` for empty or unrecognized input.
/// Offset timestamps keep the wall-clock time as written.
pub fn parse_publish_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() { return None; }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Parses a metric cell. Empty cells are a legitimate 0; `None` means the cell
/// held something that is not a usable non-negative number.
pub fn parse_metric(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() { return Some(0.0); }
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => None,
    }
}
