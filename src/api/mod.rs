use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::internal::cache::RequestCache;
use crate::internal::models::{Article, ArticlePage, ArticleScope, Watermark};
use crate::internal::pending::PendingSource;
use crate::internal::polling::CheckNewPosts;

/// How long cached GET responses stay fresh.
const CACHE_TTL: Duration = Duration::from_secs(300);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("article API base URL is not configured")]
    MissingBaseUrl,

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Parameters for `GET /articles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub scope: ArticleScope,
    pub limit: u32,
    pub next_token: Option<String>,
}

impl ListQuery {
    pub fn first_page(scope: ArticleScope, limit: u32) -> Self {
        Self {
            scope,
            limit,
            next_token: None,
        }
    }

    pub fn after(&self, next_token: impl Into<String>) -> Self {
        Self {
            next_token: Some(next_token.into()),
            ..self.clone()
        }
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::first_page(ArticleScope::Public, 10)
    }
}

/// HTTP client for the travel journal article API.
///
/// Listing and single-article reads go through a shared 5-minute cache;
/// polling paths use the `_no_cache` variants so they always see fresh data.
#[derive(Clone)]
pub struct ArticleService {
    client: Client,
    base_url: String,
    id_token: Option<String>,
    user_id: Option<String>,
    page_cache: RequestCache<ArticlePage>,
    article_cache: RequestCache<Article>,
}

impl ArticleService {
    pub fn new(config: &ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });
        if config.base_url.is_empty() {
            tracing::warn!("api.base_url is empty; article requests will fail");
        }

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            id_token: config.id_token.clone(),
            user_id: config.user_id.clone(),
            page_cache: RequestCache::new(CACHE_TTL),
            article_cache: RequestCache::new(CACHE_TTL),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::new(&ApiConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    pub fn with_credentials(mut self, id_token: Option<String>, user_id: Option<String>) -> Self {
        self.id_token = id_token;
        self.user_id = user_id;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if self.base_url.is_empty() {
            return Err(ApiError::MissingBaseUrl.into());
        }
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid API base URL {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn list_url(&self, query: &ListQuery) -> Result<Url> {
        let mut url = self.endpoint(&["articles"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("scope", query.scope.as_api_str());
            if query.limit > 0 {
                pairs.append_pair("limit", &query.limit.to_string());
            }
            if let Some(token) = &query.next_token {
                pairs.append_pair("nextToken", token);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.id_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(user_id) = &self.user_id {
            builder = builder.header("X-User-Id", user_id);
        }
        builder
    }

    /// Send a request and deserialize its JSON body, turning non-2xx replies
    /// into [`ApiError::Status`] with the server's message.
    async fn send_json<T>(&self, method: Method, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        tracing::debug!(%method, %url, "article API request");
        let resp = self
            .request(method.clone(), url.clone())
            .send()
            .await
            .with_context(|| format!("failed to send {} request to {}", method, url))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.or(b.message))
                .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
                .unwrap_or_else(|| status.to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        resp.json::<T>()
            .await
            .with_context(|| format!("failed to parse JSON response from {}", url))
    }

    /// List articles, serving repeats from the cache.
    pub async fn list_articles(&self, query: &ListQuery) -> Result<ArticlePage> {
        let url = self.list_url(query)?;
        let key = RequestCache::<ArticlePage>::key("GET", url.as_str());
        if let Some(page) = self.page_cache.get(&key) {
            tracing::trace!(%url, "serving article page from cache");
            return Ok(page);
        }

        let page: ArticlePage = self
            .send_json(Method::GET, url)
            .await
            .with_context(|| format!("list_articles failed for scope {}", query.scope))?;
        self.page_cache.set(key, page.clone());
        Ok(page)
    }

    /// List articles straight from the server, bypassing and not filling the cache.
    pub async fn list_articles_no_cache(&self, query: &ListQuery) -> Result<ArticlePage> {
        let url = self.list_url(query)?;
        self.send_json(Method::GET, url)
            .await
            .with_context(|| format!("list_articles_no_cache failed for scope {}", query.scope))
    }

    pub async fn get_article(&self, article_id: &str) -> Result<Article> {
        let url = self.endpoint(&["articles", article_id])?;
        let key = RequestCache::<Article>::key("GET", url.as_str());
        if let Some(article) = self.article_cache.get(&key) {
            return Ok(article);
        }

        let article: Article = self
            .send_json(Method::GET, url)
            .await
            .with_context(|| format!("get_article failed for id {}", article_id))?;
        self.article_cache.set(key, article.clone());
        Ok(article)
    }

    /// Count feed articles newer than `watermark`. Without a watermark there
    /// is nothing to compare against, so the answer is zero.
    pub async fn count_new_posts(&self, watermark: Option<&Watermark>, limit: u32) -> Result<u64> {
        let Some(mark) = watermark else {
            return Ok(0);
        };
        let page = self
            .list_articles_no_cache(&ListQuery::first_page(ArticleScope::Public, limit))
            .await?;
        Ok(mark.count_newer(&page.items))
    }

    /// Drop cached listings so the next read reflects new posts.
    pub fn invalidate_articles_cache(&self) {
        let removed = self.page_cache.invalidate_matching("/articles")
            + self.article_cache.invalidate_matching("/articles");
        tracing::debug!(removed, "invalidated article caches");
    }

    pub fn clear_cache(&self) {
        self.page_cache.clear();
        self.article_cache.clear();
    }
}

/// Polling source that compares the public feed against the newest article
/// the user has already loaded.
#[derive(Clone)]
pub struct NewPostsCheck {
    api: ArticleService,
    watermark: Arc<RwLock<Option<Watermark>>>,
    limit: u32,
}

impl NewPostsCheck {
    pub fn new(api: ArticleService, limit: u32) -> Self {
        Self {
            api,
            watermark: Arc::new(RwLock::new(None)),
            limit,
        }
    }

    pub fn set_watermark(&self, watermark: Option<Watermark>) {
        match self.watermark.write() {
            Ok(mut current) => *current = watermark,
            Err(_) => tracing::warn!("watermark lock poisoned; keeping previous value"),
        }
    }

    pub fn watermark(&self) -> Option<Watermark> {
        self.watermark.read().ok().and_then(|w| w.clone())
    }
}

impl CheckNewPosts for NewPostsCheck {
    fn check_new_posts(&self) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let mark = self.watermark();
            self.api.count_new_posts(mark.as_ref(), self.limit).await
        })
    }
}

/// Page size used when re-listing the user's own posts for moderation changes.
const PENDING_LIST_LIMIT: u32 = 50;

impl PendingSource for ArticleService {
    fn list_mine(&self) -> BoxFuture<'_, Result<Vec<Article>>> {
        Box::pin(async move {
            let page = self
                .list_articles_no_cache(&ListQuery::first_page(
                    ArticleScope::Mine,
                    PENDING_LIST_LIMIT,
                ))
                .await?;
            Ok(page.items)
        })
    }
}
