use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Moderation status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArticleStatus {
    Pending,
    #[default]
    Public,
    Private,
    Rejected,
    #[serde(other)]
    Unknown,
}

/// Who can see a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArticleVisibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub article_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: ArticleVisibility,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub image_keys: Vec<String>,
    #[serde(default)]
    pub likes: Option<u32>,
    #[serde(default)]
    pub comments: Option<u32>,
}

impl Article {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }

    pub fn is_pending(&self) -> bool {
        self.status == ArticleStatus::Pending
    }
}

/// One page of `/articles`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    #[serde(default)]
    pub items: Vec<Article>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Which listing the feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ArticleScope {
    #[default]
    #[strum(serialize = "public")]
    Public,
    #[strum(serialize = "mine")]
    Mine,
}

impl ArticleScope {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Mine => "mine",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Public => "Feed",
            Self::Mine => "My posts",
        }
    }
}

/// Newest article the user has loaded; anything created after it is "new".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    pub article_id: String,
    pub created_at: Option<Timestamp>,
}

impl Watermark {
    pub fn from_articles(articles: &[Article]) -> Option<Self> {
        let newest = articles
            .iter()
            .filter(|a| a.created_at.is_some())
            .max_by_key(|a| a.created_at)
            .or_else(|| articles.first())?;
        Some(Self {
            article_id: newest.article_id.clone(),
            created_at: newest.created_at,
        })
    }

    /// Count articles in a newest-first listing that came after this mark.
    pub fn count_newer(&self, listing: &[Article]) -> u64 {
        match self.created_at {
            Some(mark) => listing
                .iter()
                .filter(|a| a.article_id != self.article_id)
                .filter(|a| a.created_at.is_some_and(|t| t > mark))
                .count() as u64,
            None => listing
                .iter()
                .take_while(|a| a.article_id != self.article_id)
                .count() as u64,
        }
    }
}
