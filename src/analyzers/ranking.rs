use std::cmp::Ordering;
use crate::types::{ContributorId, Ranking, RankingEntry, Standing, TieGroup};

/// Ranks standings by value, highest first, and keeps the top `top_n` ranks.
///
/// Tied values share a rank (competition ranking: 1, 1, 3). Every entry whose rank is
/// within `top_n` is kept, so a tie straddling the cutoff makes the list longer than
/// `top_n` instead of cutting the group. Identity ascending orders entries within a
/// tie for display only.
pub fn rank(mut standings: Vec<Standing>, top_n: usize) -> Ranking {
    standings.sort_by(compare);

    let leader_gap = match standings.as_slice() {
        [first, second, ..] => Some(percent_gap(first.value, second.value)),
        _ => None,
    };

    let mut entries: Vec<RankingEntry> = Vec::new();
    let mut groups: Vec<TieGroup> = Vec::new();

    for (i, s) in standings.into_iter().enumerate() {
        let same_as_prev = groups.last().is_some_and(|g| g.value == s.value);
        let rank = if same_as_prev {
            groups.last().map_or(i + 1, |g| g.rank)
        } else {
            i + 1
        };
        if rank > top_n { break; }

        match groups.last_mut() {
            Some(g) if same_as_prev => g.members.push(s.contributor.clone()),
            _ => groups.push(TieGroup { rank, value: s.value, members: vec![s.contributor.clone()] }),
        }
        entries.push(RankingEntry {
            rank,
            contributor: s.contributor,
            value: s.value,
            article_count: s.article_count,
            solo_count: s.solo_count,
            collab_count: s.collab_count,
        });
    }

    Ranking { entries, groups, leader_gap }
}

fn compare(a: &Standing, b: &Standing) -> Ordering {
    b.value.total_cmp(&a.value)
        .then_with(|| a.contributor.cmp(&b.contributor))
}

/// `(leader - other) / other * 100`, or 0 when `other` is 0 so no infinity or
/// NaN ever reaches the output.
pub fn percent_gap(leader: f64, other: f64) -> f64 {
    if other == 0.0 || !other.is_finite() || !leader.is_finite() {
        return 0.0;
    }
    (leader - other) / other * 100.0
}

/// Mean value across the baseline cohort members that have a positive value.
/// `None` when no member does.
pub fn baseline_mean(standings: &[Standing], cohort: &[ContributorId]) -> Option<f64> {
    let values: Vec<f64> = standings.iter()
        .filter(|s| cohort.contains(&s.contributor) && s.value > 0.0)
        .map(|s| s.value)
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
