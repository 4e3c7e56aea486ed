use chrono::NaiveDate;
use crate::error::AnalysisError;
use crate::types::ArticleRecord;

/// Parses the `--min-date` value. Only `YYYY-MM-DD` is accepted so a typo
/// fails before any file is read.
pub fn parse_min_date(raw: &str) -> Result<NaiveDate, AnalysisError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AnalysisError::InvalidDateFilter(raw.to_string()))
}

/// Keeps articles published on or after `min_date` (inclusive).
///
/// With no filter every record is kept, including undated ones: they still count
/// toward overall totals and are skipped only by the monthly view. With a filter,
/// undated records are dropped since they cannot be shown to satisfy it.
pub fn apply_min_date(records: Vec<ArticleRecord>, min_date: Option<NaiveDate>) -> Vec<ArticleRecord> {
    let Some(min) = min_date else { return records };
    records.into_iter()
        .filter(|r| r.publish_date().is_some_and(|d| d >= min))
        .collect()
}
