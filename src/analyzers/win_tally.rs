use std::collections::HashMap;
use crate::types::{ContributorId, PeriodRanking, WinRecord};

/// Counts, per contributor, the periods they led.
///
/// Every member of a period's rank-1 group earns a win; when that group has more
/// than one member each of them also earns a tied win. Contributors with zero wins
/// are omitted. Sorted by wins descending, then identity.
pub fn tally_wins(periods: &[PeriodRanking]) -> Vec<WinRecord> {
    let mut counts: HashMap<&ContributorId, (usize, usize)> = HashMap::new();

    for p in periods {
        let Some(leaders) = p.ranking.leaders() else { continue };
        let tied = leaders.is_tie();
        for who in &leaders.members {
            let entry = counts.entry(who).or_default();
            entry.0 += 1;
            if tied { entry.1 += 1; }
        }
    }

    let mut records: Vec<WinRecord> = counts.into_iter()
        .map(|(who, (wins, tied_wins))| WinRecord { contributor: who.clone(), wins, tied_wins })
        .collect();
    records.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.contributor.cmp(&b.contributor)));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ranking::rank;
    use crate::types::{Period, Standing};

    fn period(m: u32, values: &[(&str, f64)]) -> PeriodRanking {
        let standings = values.iter()
            .map(|(name, v)| Standing {
                contributor: ContributorId::new(*name),
                value: *v,
                article_count: 1,
                solo_count: 1,
                collab_count: 0,
            })
            .collect();
        PeriodRanking { period: Period::new(2024, m).unwrap(), ranking: rank(standings, 3) }
    }

    fn find<'a>(records: &'a [WinRecord], name: &str) -> &'a WinRecord {
        records.iter().find(|r| r.contributor.as_str() == name)
            .unwrap_or_else(|| panic!("{name} should have a win record"))
    }

    #[test]
    fn test_outright_winner() {
        let wins = tally_wins(&[period(1, &[("Jane Doe", 10.0), ("John Roe", 5.0)])]);
        assert_eq!(wins.len(), 1);
        assert_eq!((wins[0].wins, wins[0].tied_wins), (1, 0));
        assert_eq!(wins[0].contributor.as_str(), "Jane Doe");
    }

    #[test]
    fn test_two_way_tie_credits_both() {
        let wins = tally_wins(&[period(1, &[("Jane Doe", 10.0), ("John Roe", 10.0), ("Bob Poe", 2.0)])]);
        assert_eq!(wins.len(), 2, "only the tied leaders earn a win");
        for name in ["Jane Doe", "John Roe"] {
            let r = find(&wins, name);
            assert_eq!((r.wins, r.tied_wins), (1, 1), "{name} should have one tied win");
        }
    }

    #[test]
    fn test_wins_accumulate_across_periods_and_sort() {
        let wins = tally_wins(&[
            period(1, &[("Bob Poe", 9.0), ("Jane Doe", 1.0)]),
            period(2, &[("Jane Doe", 9.0), ("Bob Poe", 1.0)]),
            period(3, &[("Jane Doe", 4.0), ("Bob Poe", 4.0)]),
            period(4, &[("Jane Doe", 7.0)]),
        ]);
        let summary: Vec<(&str, usize, usize)> = wins.iter()
            .map(|r| (r.contributor.as_str(), r.wins, r.tied_wins))
            .collect();
        assert_eq!(summary, vec![("Jane Doe", 3, 1), ("Bob Poe", 2, 1)]);
    }

    #[test]
    fn test_zero_valued_tie_still_credits_both_leaders() {
        let wins = tally_wins(&[period(1, &[("Jane Doe", 0.0), ("John Roe", 0.0)])]);
        assert_eq!(wins.len(), 2, "a period led at 0 still has winners");
        for name in ["Jane Doe", "John Roe"] {
            let r = find(&wins, name);
            assert_eq!((r.wins, r.tied_wins), (1, 1), "{name} should have one tied win");
        }
    }

    #[test]
    fn test_equal_wins_sorted_by_identity() {
        let wins = tally_wins(&[
            period(1, &[("Zed Roe", 3.0)]),
            period(2, &[("Amy Poe", 3.0)]),
        ]);
        assert_eq!(wins[0].contributor.as_str(), "Amy Poe");
        assert_eq!(wins[1].contributor.as_str(), "Zed Roe");
    }
}
