use chrono::{DateTime, Local, NaiveDate};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use crate::error::AnalysisError;
use crate::ingest::normalizer::{normalize_row, ColumnMap, RowStats};
use crate::types::{ArticleRecord, DateRange, InputFileMeta, MetricSpec};

/// Export file names carry their window, e.g.
/// `posts-export-by-page-views-Jul-01-2024-Jul-31-2025-example-com.csv`.
static EXPORT_WINDOW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z]{3})-(\d{2})-(\d{4})-([A-Za-z]{3})-(\d{2})-(\d{4})").unwrap()
});

/// One parsed input file.
#[derive(Debug)]
pub struct LoadedFile {
    pub meta: InputFileMeta,
    pub records: Vec<ArticleRecord>,
    pub stats: RowStats,
}

/// Expands the given paths into the list of CSV files to load.
/// A directory contributes its immediate `.csv` children, sorted by name.
pub fn discover_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, AnalysisError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(AnalysisError::InputNotFound(path.clone()));
        }
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        let entries = std::fs::read_dir(path)
            .map_err(|source| AnalysisError::Io { path: path.clone(), source })?;
        let mut found: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_csv(p))
            .collect();
        if found.is_empty() {
            return Err(AnalysisError::NoInputFiles(path.clone()));
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Parses every file in parallel and returns them in input order.
/// The first structural error aborts the whole load.
pub fn load_all(paths: &[PathBuf], metrics: &[MetricSpec]) -> Result<Vec<LoadedFile>, AnalysisError> {
    paths.par_iter()
        .map(|p| load_file(p, metrics))
        .collect()
}

pub fn load_file(path: &Path, metrics: &[MetricSpec]) -> Result<LoadedFile, AnalysisError> {
    let file = File::open(path)
        .map_err(|source| AnalysisError::Io { path: path.to_path_buf(), source })?;
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()
        .map_err(|source| AnalysisError::Csv { path: path.to_path_buf(), source })?
        .clone();
    let columns = ColumnMap::resolve(&headers, metrics)
        .map_err(|column| AnalysisError::MissingColumn { path: path.to_path_buf(), column })?;

    let name = path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input.csv")
        .to_string();

    let missing = columns.missing_metrics();
    if !missing.is_empty() {
        tracing::warn!(file = name.as_str(), "metric columns missing, counted as 0: {}", missing.join(", "));
    }

    let mut stats = RowStats::default();
    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|source| AnalysisError::Csv { path: path.to_path_buf(), source })?;
        records.push(normalize_row(&row, &columns, &name, &mut stats));
    }

    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string());

    let meta = InputFileMeta {
        export_window: parse_export_window(&name),
        name,
        path: path.display().to_string(),
        modified,
        rows: records.len(),
    };
    Ok(LoadedFile { meta, records, stats })
}

/// Extracts the `Mon-DD-YYYY-Mon-DD-YYYY` export window from a file name.
/// The window's end day is inclusive.
pub fn parse_export_window(file_name: &str) -> Option<DateRange> {
    let caps = EXPORT_WINDOW_RE.captures(file_name)?;
    let day = |m: usize, d: usize, y: usize| {
        NaiveDate::parse_from_str(&format!("{} {} {}", &caps[m], &caps[d], &caps[y]), "%b %d %Y").ok()
    };
    let start = day(1, 2, 3)?;
    let last = day(4, 5, 6)?;
    if last < start { return None; }
    Some(DateRange::through(start, last))
}

/// The export window shared by every file, if they all carry the same one.
pub fn common_export_window(files: &[LoadedFile]) -> Option<DateRange> {
    let first = files.first()?.meta.export_window?;
    files.iter()
        .all(|f| f.meta.export_window == Some(first))
        .then_some(first)
}
