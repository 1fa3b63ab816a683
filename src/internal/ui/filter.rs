use strum_macros::Display;

use crate::internal::models::{Article, ArticleStatus};

/// Status filter applied to the visible list.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Display)]
pub enum StatusFilter {
    #[default]
    All,
    Public,
    Private,
}

impl StatusFilter {
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Public,
            Self::Public => Self::Private,
            Self::Private => Self::All,
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        match self {
            Self::All => true,
            Self::Public => article.status == ArticleStatus::Public,
            Self::Private => article.status == ArticleStatus::Private,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_returns_to_all() {
        let f = StatusFilter::default();
        assert_eq!(f.next().next().next(), StatusFilter::All);
        assert_eq!(f.next().to_string(), "Public");
    }

    #[test]
    fn test_matches_status() {
        let article = Article {
            status: ArticleStatus::Private,
            ..Default::default()
        };
        assert!(StatusFilter::All.matches(&article));
        assert!(StatusFilter::Private.matches(&article));
        assert!(!StatusFilter::Public.matches(&article));
    }
}
