use anyhow::{Context, Result};
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use super::models::ArticleStatus;

/// Entries older than this are forgotten on load.
const MAX_AGE: SignedDuration = SignedDuration::from_hours(24);

/// Status changes the user has already been told about, so a restart does
/// not repeat "your post was approved".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifiedPosts {
    pub keys: BTreeSet<String>,
    pub saved_at: Option<Timestamp>,
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

impl NotifiedPosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_key(article_id: &str, status: ArticleStatus) -> String {
        format!("{}:{}", article_id, status)
    }

    pub fn load_or_create() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("travel-feed-tui");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        Self::load_from(config_dir.join("notified_posts.json"))
    }

    pub fn load_from(file_path: PathBuf) -> Result<Self> {
        if !file_path.exists() {
            return Ok(Self {
                file_path: Some(file_path),
                ..Default::default()
            });
        }

        let content =
            fs::read_to_string(&file_path).context("Failed to read notified posts file")?;
        let mut store: NotifiedPosts =
            serde_json::from_str(&content).context("Failed to parse notified posts file")?;

        if store.is_expired_at(Timestamp::now()) {
            tracing::info!("Notified posts older than 24h, clearing");
            let _ = fs::remove_file(&file_path);
            return Ok(Self {
                file_path: Some(file_path),
                ..Default::default()
            });
        }

        tracing::debug!(count = store.keys.len(), "Loaded notified posts");
        store.file_path = Some(file_path);
        Ok(store)
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        match self.saved_at {
            Some(saved_at) => now.duration_since(saved_at) > MAX_AGE,
            None => !self.keys.is_empty(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Record a key. Returns false when it was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn save(&mut self) -> Result<()> {
        self.saved_at = Some(Timestamp::now());
        if let Some(path) = &self.file_path {
            let content =
                serde_json::to_string_pretty(self).context("Failed to serialize notified posts")?;
            fs::write(path, content).context("Failed to write notified posts file")?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.keys.clear();
        self.saved_at = None;
        if let Some(path) = &self.file_path
            && path.exists()
        {
            fs::remove_file(path).context("Failed to remove notified posts file")?;
        }
        tracing::info!("Cleared notified posts");
        Ok(())
    }
}
