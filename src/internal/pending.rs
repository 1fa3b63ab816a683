//! Watch the user's own posts while they sit in moderation.
//!
//! Posts created by the user start out `pending`. The watcher re-lists the
//! user's posts on a fixed interval and reports each post whose status moved
//! on, once per `(post, status)` pair, even across restarts (see
//! [`NotifiedPosts`]). It gives up after `max_duration` or once nothing is
//! left to watch.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::models::{Article, ArticleStatus};
use super::notified::NotifiedPosts;

/// Lists the current user's posts, bypassing any response cache.
pub trait PendingSource: Send + Sync + 'static {
    fn list_mine(&self) -> BoxFuture<'_, Result<Vec<Article>>>;
}

/// Bookkeeping for which posts are watched and which changes were announced.
#[derive(Debug, Default)]
pub struct PendingTracker {
    tracked: BTreeSet<String>,
    notified: NotifiedPosts,
    poll_count: u64,
}

impl PendingTracker {
    pub fn new(notified: NotifiedPosts) -> Self {
        Self {
            tracked: BTreeSet::new(),
            notified,
            poll_count: 0,
        }
    }

    /// Start watching every pending post not already watched. Returns how
    /// many were added.
    pub fn track(&mut self, posts: &[Article]) -> usize {
        let mut added = 0;
        for post in posts.iter().filter(|p| p.is_pending() && !p.article_id.is_empty()) {
            if self.tracked.insert(post.article_id.clone()) {
                tracing::debug!(article_id = %post.article_id, "watching pending post");
                added += 1;
            }
        }
        added
    }

    /// Reconcile watched posts with a fresh listing and return the posts
    /// whose status change has not been announced yet.
    pub fn apply(&mut self, listing: &[Article]) -> Vec<Article> {
        let mut announce = Vec::new();

        for article_id in self.tracked.clone() {
            let Some(current) = listing.iter().find(|a| a.article_id == article_id) else {
                // Might be a transient gap in the listing; keep watching.
                tracing::debug!(%article_id, "pending post missing from listing");
                continue;
            };
            if current.status == ArticleStatus::Pending {
                continue;
            }

            self.tracked.remove(&article_id);
            let key = NotifiedPosts::status_key(&article_id, current.status);
            if self.notified.contains(&key) {
                tracing::debug!(%key, "status change already announced");
                continue;
            }

            tracing::info!(%article_id, status = %current.status, "pending post status changed");
            self.notified.insert(key);
            self.notified.insert(article_id);
            announce.push(current.clone());
        }

        if !announce.is_empty()
            && let Err(e) = self.notified.save()
        {
            tracing::error!("Failed to save notified posts: {:#}", e);
        }
        announce
    }

    pub fn is_idle(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn tracked_ids(&self) -> impl Iterator<Item = &str> {
        self.tracked.iter().map(String::as_str)
    }

    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    pub fn stop(&mut self) {
        self.tracked.clear();
    }

    pub fn clear_notified(&mut self) -> Result<()> {
        self.notified.clear()
    }
}

/// Timing for a watcher run.
#[derive(Debug, Clone, Copy)]
pub struct PendingWatchConfig {
    pub interval: Duration,
    pub max_duration: Duration,
}

impl Default for PendingWatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
            max_duration: Duration::from_secs(120),
        }
    }
}

/// Handle to a running watcher. Dropping it stops the watcher.
pub struct PendingWatchHandle {
    cancel: CancellationToken,
    posts: mpsc::UnboundedSender<Vec<Article>>,
    task: JoinHandle<()>,
}

impl PendingWatchHandle {
    /// Hand newly loaded posts to the watcher; pending ones get watched.
    pub fn track(&self, posts: Vec<Article>) {
        let _ = self.posts.send(posts);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PendingWatchHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn a watcher over `posts`. The first poll happens immediately;
/// `on_change` receives every newly announced post.
pub fn spawn_pending_watcher<S, F>(
    source: Arc<S>,
    mut tracker: PendingTracker,
    posts: &[Article],
    config: PendingWatchConfig,
    on_change: F,
) -> PendingWatchHandle
where
    S: PendingSource + ?Sized,
    F: Fn(Article) + Send + 'static,
{
    tracker.track(posts);
    let cancel = CancellationToken::new();
    let (posts_tx, posts_rx) = mpsc::unbounded_channel();

    tracing::info!(
        interval = ?config.interval,
        max_duration = ?config.max_duration,
        tracked = tracker.tracked.len(),
        "starting pending posts watcher"
    );

    let task = tokio::spawn(run_watcher(
        source,
        tracker,
        config,
        posts_rx,
        cancel.clone(),
        on_change,
    ));

    PendingWatchHandle {
        cancel,
        posts: posts_tx,
        task,
    }
}

async fn run_watcher<S, F>(
    source: Arc<S>,
    mut tracker: PendingTracker,
    config: PendingWatchConfig,
    mut posts_rx: mpsc::UnboundedReceiver<Vec<Article>>,
    cancel: CancellationToken,
    on_change: F,
) where
    S: PendingSource + ?Sized,
    F: Fn(Article) + Send + 'static,
{
    let started = Instant::now();
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(posts) = posts_rx.recv() => {
                tracker.track(&posts);
                continue;
            }
            _ = ticker.tick() => {}
        }

        if started.elapsed() > config.max_duration {
            tracing::info!(elapsed = ?started.elapsed(), "pending watch timed out");
            break;
        }
        if tracker.is_idle() {
            tracing::info!("no more pending posts, stopping watcher");
            break;
        }

        tracker.poll_count += 1;
        let listing = tokio::select! {
            _ = cancel.cancelled() => break,
            listing = source.list_mine() => listing,
        };
        match listing {
            Ok(listing) => {
                let changed = tracker.apply(&listing);
                tracing::debug!(
                    poll = tracker.poll_count,
                    changed = changed.len(),
                    still_pending = tracker.tracked.len(),
                    "pending poll finished"
                );
                for article in changed {
                    on_change(article);
                }
            }
            Err(e) => {
                tracing::warn!(poll = tracker.poll_count, "pending poll failed: {:#}", e);
            }
        }
    }

    tracker.stop();
    tracing::debug!("pending posts watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::models::ArticleStatus;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn post(id: &str, status: ArticleStatus) -> Article {
        Article {
            article_id: id.to_string(),
            title: Some(format!("Post {}", id)),
            status,
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
        listings: Mutex<VecDeque<Result<Vec<Article>, &'static str>>>,
    }

    impl PendingSource for FakeSource {
        fn list_mine(&self) -> BoxFuture<'_, Result<Vec<Article>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .listings
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Vec::new()));
            Box::pin(async move { next.map_err(|e| anyhow::anyhow!(e)) })
        }
    }

    #[test]
    fn test_track_only_adds_pending_posts_once() {
        let mut tracker = PendingTracker::default();
        let posts = vec![
            post("a", ArticleStatus::Pending),
            post("b", ArticleStatus::Public),
            post("", ArticleStatus::Pending),
        ];
        assert_eq!(tracker.track(&posts), 1);
        assert_eq!(tracker.track(&posts), 0);
        assert_eq!(tracker.tracked_ids().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_apply_announces_each_change_once() {
        let mut tracker = PendingTracker::default();
        tracker.track(&[
            post("a", ArticleStatus::Pending),
            post("b", ArticleStatus::Pending),
            post("c", ArticleStatus::Pending),
        ]);

        // "c" is missing from the listing and stays watched.
        let changed = tracker.apply(&[
            post("a", ArticleStatus::Public),
            post("b", ArticleStatus::Pending),
        ]);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].article_id, "a");
        assert_eq!(tracker.tracked_ids().collect::<Vec<_>>(), vec!["b", "c"]);

        // Re-tracking a post whose change was announced does not repeat it.
        tracker.track(&[post("a", ArticleStatus::Pending)]);
        let changed = tracker.apply(&[post("a", ArticleStatus::Public)]);
        assert!(changed.is_empty());
    }

    #[test]
    fn test_notified_store_survives_new_tracker() {
        let path = std::env::temp_dir().join("travel_feed_pending_restart.json");
        let _ = std::fs::remove_file(&path);

        let mut first = PendingTracker::new(NotifiedPosts::load_from(path.clone()).unwrap());
        first.track(&[post("a", ArticleStatus::Pending)]);
        assert_eq!(first.apply(&[post("a", ArticleStatus::Rejected)]).len(), 1);

        let mut second = PendingTracker::new(NotifiedPosts::load_from(path.clone()).unwrap());
        second.track(&[post("a", ArticleStatus::Pending)]);
        assert!(second.apply(&[post("a", ArticleStatus::Rejected)]).is_empty());
        assert!(second.is_idle());

        second.clear_notified().unwrap();
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_reports_change_and_stops_when_idle() {
        let source = Arc::new(FakeSource::default());
        source.listings.lock().unwrap().extend([
            Ok(vec![post("a", ArticleStatus::Pending)]),
            Err("503"),
            Ok(vec![post("a", ArticleStatus::Public)]),
        ]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = spawn_pending_watcher(
            Arc::clone(&source),
            PendingTracker::default(),
            &[post("a", ArticleStatus::Pending)],
            PendingWatchConfig {
                interval: Duration::from_secs(20),
                max_duration: Duration::from_secs(120),
            },
            move |article| sink.lock().unwrap().push(article.article_id),
        );

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string()]);

        // Next tick finds nothing tracked and the task ends.
        tokio::time::sleep(Duration::from_secs(21)).await;
        assert!(handle.is_finished());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_gives_up_after_max_duration() {
        let source = Arc::new(FakeSource::default());
        let handle = spawn_pending_watcher(
            Arc::clone(&source),
            PendingTracker::default(),
            &[post("slow", ArticleStatus::Pending)],
            PendingWatchConfig {
                interval: Duration::from_secs(20),
                max_duration: Duration::from_secs(50),
            },
            |_| {},
        );

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert!(handle.is_finished());
        // Polls at 0s, 20s and 40s; the 60s tick is past the deadline.
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_watcher() {
        let source = Arc::new(FakeSource::default());
        let handle = spawn_pending_watcher(
            Arc::clone(&source),
            PendingTracker::default(),
            &[post("a", ArticleStatus::Pending)],
            PendingWatchConfig::default(),
            |_| {},
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(handle.is_finished());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
