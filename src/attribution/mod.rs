pub mod allocator;
pub mod resolver;

use crate::types::{ArticleRecord, ContributorId};
use resolver::AuthorResolver;

/// An article paired with its resolved, non-ignored contributors.
#[derive(Debug, Clone)]
pub struct AttributedArticle {
    pub record: ArticleRecord,
    pub authors: Vec<ContributorId>,
}

/// Resolves every record's author field once. Records left with no
/// contributors are kept; they simply credit nobody.
pub fn attribute(records: Vec<ArticleRecord>, resolver: &AuthorResolver) -> Vec<AttributedArticle> {
    records.into_iter()
        .map(|record| {
            let authors = resolver.resolve(record.authors_raw.as_deref());
            AttributedArticle { record, authors }
        })
        .collect()
}
