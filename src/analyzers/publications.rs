use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use crate::attribution::AttributedArticle;
use crate::types::{ContributorId, DateRange};

/// Counts distinct publications per contributor within `range`.
///
/// A publication is keyed by (title, publish date) rather than by row or URL, so an
/// article that shows up in several overlapping exports is counted once. This is a
/// set computation and must be rerun for each range; monthly results do not add up
/// to the overall figure.
pub fn count_publications(
    articles: &[AttributedArticle],
    range: &DateRange,
) -> HashMap<ContributorId, usize> {
    let mut seen: HashMap<&ContributorId, HashSet<(&str, NaiveDate)>> = HashMap::new();

    for a in articles {
        let Some(day) = a.record.publish_date() else { continue };
        if !range.contains(day) { continue; }
        let key = (a.record.title.trim(), day);
        for author in &a.authors {
            seen.entry(author).or_default().insert(key);
        }
    }

    seen.into_iter()
        .map(|(who, set)| (who.clone(), set.len()))
        .collect()
}

/// The range used for the overall publications count: the shared export window when
/// every input file declares the same one, otherwise from the date filter (or the
/// earliest publish date) through the latest publish date.
pub fn overall_range(
    articles: &[AttributedArticle],
    min_date: Option<NaiveDate>,
    export_window: Option<DateRange>,
) -> Option<DateRange> {
    if export_window.is_some() {
        return export_window;
    }
    let dates = articles.iter().filter_map(|a| a.record.publish_date());
    let (first, last) = dates.fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })?;
    Some(DateRange::through(min_date.unwrap_or(first), last))
}
