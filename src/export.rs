use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use crate::attribution::AttributedArticle;
use crate::error::AnalysisError;
use crate::types::{ContributorId, MetricSpec, Period};

static UNSAFE_FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\s/\\:*?"<>|]+"#).unwrap()
});

/// What a slice export produced.
#[derive(Debug)]
pub struct ExportSummary {
    pub dir: PathBuf,
    pub files: usize,
}

/// `<timestamp>_<after-YYYYMMDD|all-dates>_top-<N>`
pub fn run_dir_name(stamp: &str, min_date: Option<NaiveDate>, top: usize) -> String {
    let scope = min_date.map_or_else(
        || "all-dates".to_string(),
        |d| format!("after-{}", d.format("%Y%m%d")),
    );
    format!("{stamp}_{scope}_top-{top}")
}

/// Contributor names as file names: whitespace and path separators become `_`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = UNSAFE_FILENAME_RE.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches(|c| c == '_' || c == '.');
    if cleaned.is_empty() { "unnamed".to_string() } else { cleaned.to_string() }
}

/// One file stem per contributor, unique even on case-insensitive filesystems.
/// The first contributor (in identity order) keeps the sanitized name; later ones
/// that clean up to the same name get `-2`, `-3`, ...
fn file_stems<'a>(contributors: impl IntoIterator<Item = &'a ContributorId>) -> HashMap<&'a ContributorId, String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut stems = HashMap::new();
    for who in contributors {
        let base = sanitize_filename(who.as_str());
        let mut stem = base.clone();
        let mut n = 1;
        while !used.insert(stem.to_lowercase()) {
            n += 1;
            stem = format!("{base}-{n}");
        }
        stems.insert(who, stem);
    }
    stems
}

/// Writes the filtered rows and their per-month, per-contributor and
/// per-contributor-month slices under `root/run_name`.
///
/// Rows are written in the normalized layout (url, title, publish date, authors,
/// metric columns, source file). Slices only cover resolved contributors, so an
/// ignored author never gets a file.
pub fn export_slices(
    root:     &Path,
    run_name: &str,
    articles: &[AttributedArticle],
    metrics:  &[MetricSpec],
) -> Result<ExportSummary, AnalysisError> {
    let dir = root.join(run_name);

    let mut by_month: BTreeMap<Period, Vec<&AttributedArticle>> = BTreeMap::new();
    let mut by_author: BTreeMap<&ContributorId, Vec<&AttributedArticle>> = BTreeMap::new();
    let mut by_author_month: BTreeMap<(&ContributorId, Period), Vec<&AttributedArticle>> = BTreeMap::new();

    for a in articles {
        let period = a.record.period();
        if let Some(p) = period {
            by_month.entry(p).or_default().push(a);
        }
        for who in &a.authors {
            by_author.entry(who).or_default().push(a);
            if let Some(p) = period {
                by_author_month.entry((who, p)).or_default().push(a);
            }
        }
    }

    let all: Vec<&AttributedArticle> = articles.iter().collect();
    write_slice(&dir.join("articles.csv"), &all, metrics)?;
    let mut files = 1;

    for (period, rows) in &by_month {
        write_slice(&dir.join("months").join(format!("{period}.csv")), rows, metrics)?;
        files += 1;
    }
    let stems = file_stems(by_author.keys().copied());
    let stem = |who: &ContributorId| stems.get(who).cloned().unwrap_or_else(|| sanitize_filename(who.as_str()));

    for (who, rows) in &by_author {
        write_slice(&dir.join("by_author").join(format!("{}.csv", stem(*who))), rows, metrics)?;
        files += 1;
    }
    for ((who, period), rows) in &by_author_month {
        let path = dir.join("by_author_month")
            .join(stem(*who))
            .join(format!("{period}.csv"));
        write_slice(&path, rows, metrics)?;
        files += 1;
    }

    tracing::debug!(dir = %dir.display(), files, "slice export finished");
    Ok(ExportSummary { dir, files })
}

fn write_slice(path: &Path, rows: &[&AttributedArticle], metrics: &[MetricSpec]) -> Result<(), AnalysisError> {
    let fail = |reason: String| AnalysisError::Export { path: path.to_path_buf(), reason };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
    }
    let mut out = csv::Writer::from_path(path).map_err(|e| fail(e.to_string()))?;

    let mut header = vec!["url", "title", "publish date", "authors"];
    header.extend(metrics.iter().map(|m| m.column.as_str()));
    header.push("source file");
    out.write_record(&header).map_err(|e| fail(e.to_string()))?;

    for a in rows {
        let r = &a.record;
        let published = r.published
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let mut record = vec![
            r.url.clone(),
            r.title.clone(),
            published,
            r.authors_raw.clone().unwrap_or_default(),
        ];
        record.extend(metrics.iter().map(|m| r.metric(&m.key).to_string()));
        record.push(r.source_file.clone());
        out.write_record(&record).map_err(|e| fail(e.to_string()))?;
    }
    out.flush().map_err(|e| fail(e.to_string()))
}
