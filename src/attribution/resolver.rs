use std::collections::HashSet;
use crate::types::ContributorId;

/// Maps raw author fields to canonical contributor identities and applies
/// the ignore list.
#[derive(Debug, Clone, Default)]
pub struct AuthorResolver {
    ignored: HashSet<String>,
}

impl AuthorResolver {
    pub fn new<I, S>(ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Tokens are compared after trimming, so ignore entries are too.
        let ignored = ignored.into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        AuthorResolver { ignored }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// Splits on commas, trims, drops empty tokens, collapses byte-identical
    /// repeats and removes ignored names. Order of first appearance is kept.
    pub fn resolve(&self, raw: Option<&str>) -> Vec<ContributorId> {
        let Some(raw) = raw else { return Vec::new() };
        let mut seen: HashSet<&str> = HashSet::new();
        split_authors(raw)
            .into_iter()
            .filter(|name| seen.insert(*name))
            .filter(|name| !self.is_ignored(name))
            .map(ContributorId::new)
            .collect()
    }
}

/// Raw comma split with whitespace trimmed and empty tokens removed.
pub fn split_authors(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ids: &[ContributorId]) -> Vec<&str> {
        ids.iter().map(|i| i.as_str()).collect()
    }

    #[test]
    fn test_split_trims_and_drops_empty_tokens() {
        assert_eq!(split_authors(" Jane Doe ,John Roe,, ,"), vec!["Jane Doe", "John Roe"]);
    }

    #[test]
    fn test_missing_field_resolves_to_nobody() {
        let r = AuthorResolver::default();
        assert!(r.resolve(None).is_empty());
        assert!(r.resolve(Some(" , ")).is_empty());
    }

    #[test]
    fn test_case_is_preserved() {
        let r = AuthorResolver::default();
        assert_eq!(names(&r.resolve(Some("jane doe, Jane Doe"))), vec!["jane doe", "Jane Doe"],
            "identities differing only in case are distinct contributors");
    }

    #[test]
    fn test_identical_tokens_in_one_row_collapse() {
        let r = AuthorResolver::default();
        let ids = r.resolve(Some("Jane Doe, John Roe, Jane Doe"));
        assert_eq!(names(&ids), vec!["Jane Doe", "John Roe"],
            "a contributor listed twice in one row gets a single credit");
    }

    #[test]
    fn test_ignored_authors_removed() {
        let r = AuthorResolver::new(["John Roe ", "Staff"]);
        assert_eq!(names(&r.resolve(Some("Jane Doe, John Roe, Staff"))), vec!["Jane Doe"]);
        assert!(r.resolve(Some("Staff")).is_empty(), "row with only ignored authors credits nobody");
    }

    #[test]
    fn test_ignore_is_exact_match() {
        let r = AuthorResolver::new(["John"]);
        assert_eq!(names(&r.resolve(Some("John Roe"))), vec!["John Roe"],
            "ignore list must not match on prefixes or first names");
    }
}
