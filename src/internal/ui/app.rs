use anyhow::Result;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::api::{ArticleService, ListQuery, NewPostsCheck};
use crate::config::AppConfig;
use crate::internal::models::{Article, ArticlePage, ArticleScope, ArticleStatus, Watermark};
use crate::internal::notification::Toast;
use crate::internal::notified::NotifiedPosts;
use crate::internal::pending::{
    PendingTracker, PendingWatchConfig, PendingWatchHandle, spawn_pending_watcher,
};
use crate::internal::polling::{FocusVisibility, NewPostsPoller, PollSnapshot, PollerHandle};
use crate::internal::scroll::ScrollSentinel;
use crate::internal::ui::filter::StatusFilter;

use ratatui::Frame;
use ratatui::widgets::ListState;

/// Application view modes.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ViewMode {
    List,
    Detail,
}

/// Actions/messages sent through the app action channel.
#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    NavigateUp,
    NavigateDown,
    Enter,
    Back,
    OpenBrowser,
    SwitchScope(ArticleScope),
    CycleFilter,
    LoadArticles,
    LoadMore,
    ArticlesLoaded {
        scope: ArticleScope,
        page: ArticlePage,
        append: bool,
    },
    ArticleLoaded(Article),
    LoadNewPosts,
    ResumePolling,
    TogglePolling,
    PendingStatusChanged(Article),
    Error(String),
}

pub struct App {
    pub running: bool,
    pub app_version: String,
    pub view_mode: ViewMode,
    pub scope: ArticleScope,
    pub filter: StatusFilter,
    pub articles: Vec<Article>,
    pub next_token: Option<String>,
    pub list_state: ListState,
    pub loading: bool,
    pub selected_article: Option<Article>,
    pub detail_scroll: usize,
    pub api: ArticleService,
    pub new_posts: NewPostsCheck,
    pub poller: Option<PollerHandle>,
    pub poll_snapshot: PollSnapshot,
    pub visibility: FocusVisibility,
    pub pending_watch: Option<PendingWatchHandle>,
    pub sentinel: ScrollSentinel,
    pub toast: Option<Toast>,
    pub spinner_state: usize,
    pub last_spinner_update: Option<tokio::time::Instant>,
    pub config: AppConfig,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
}

impl App {
    #[tracing::instrument]
    pub fn new() -> Self {
        Self::with_config(AppConfig::load())
    }

    /// Build the app without touching the terminal or spawning tasks.
    pub fn with_config(config: AppConfig) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let api = ArticleService::new(&config.api);
        let new_posts = NewPostsCheck::new(api.clone(), config.api.page_size);

        Self {
            running: true,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            view_mode: ViewMode::List,
            scope: ArticleScope::Public,
            filter: StatusFilter::All,
            articles: Vec::new(),
            next_token: None,
            list_state: ListState::default(),
            loading: false,
            selected_article: None,
            detail_scroll: 0,
            api,
            new_posts,
            poller: None,
            poll_snapshot: PollSnapshot {
                is_tab_visible: true,
                ..Default::default()
            },
            visibility: FocusVisibility::new(true),
            pending_watch: None,
            sentinel: ScrollSentinel::new(config.ui.scroll_margin),
            toast: None,
            spinner_state: 0,
            last_spinner_update: None,
            config,
            action_tx,
            action_rx,
        }
    }

    pub fn notify(&mut self, toast: Toast) {
        self.toast = Some(toast);
    }

    /// Start the new posts poller. A bad polling config is reported as a
    /// toast and leaves polling off.
    pub fn start_polling(&mut self) {
        let started = NewPostsPoller::new(self.config.polling.to_poll_config())
            .check_with(self.new_posts.clone())
            .start(&self.visibility);
        match started {
            Ok(handle) => {
                self.poll_snapshot = handle.snapshot();
                self.poller = Some(handle);
            }
            Err(e) => {
                tracing::error!("Failed to start new posts poller: {}", e);
                self.notify(Toast::error(format!("Polling disabled: {}", e)));
            }
        }
    }

    pub async fn run(&mut self, mut tui: crate::tui::Tui) -> Result<()> {
        self.start_polling();
        let mut snapshots = self.poller.as_ref().map(|p| p.subscribe());

        // Initial load
        let _ = self.action_tx.send(Action::LoadArticles);

        let mut event_interval = tokio::time::interval(std::time::Duration::from_millis(16));

        loop {
            // Update spinner animation every 100ms
            let now = tokio::time::Instant::now();
            match self.last_spinner_update {
                Some(last_update) if now.duration_since(last_update).as_millis() >= 100 => {
                    self.spinner_state = self.spinner_state.wrapping_add(1);
                    self.last_spinner_update = Some(now);
                }
                Some(_) => {}
                None => self.last_spinner_update = Some(now),
            }

            if let Some(toast) = &self.toast
                && toast.should_dismiss()
            {
                self.toast = None;
            }

            tui.draw(|f| self.ui(f))?;

            tokio::select! {
                _ = event_interval.tick() => {
                    if event::poll(std::time::Duration::from_millis(0))? {
                        self.handle_terminal_event(event::read()?);
                    }
                }
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action).await;
                }
                snapshot = next_snapshot(&mut snapshots) => match snapshot {
                    Some(snapshot) => self.apply_snapshot(snapshot),
                    None => snapshots = None,
                },
            }

            if !self.running {
                break;
            }
        }

        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
        if let Some(pending) = self.pending_watch.take() {
            pending.stop();
        }
        Ok(())
    }

    pub fn handle_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
            Event::FocusGained => self.visibility.set_visible(true),
            Event::FocusLost => self.visibility.set_visible(false),
            _ => {}
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        let action = match (key.code, self.view_mode) {
            (KeyCode::Char('c'), _) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            (KeyCode::Char('q'), _) => Some(Action::Quit),
            (KeyCode::Char('j') | KeyCode::Down, _) => Some(Action::NavigateDown),
            (KeyCode::Char('k') | KeyCode::Up, _) => Some(Action::NavigateUp),
            (KeyCode::Enter, ViewMode::List) => Some(Action::Enter),
            (KeyCode::Esc, ViewMode::Detail) => Some(Action::Back),
            (KeyCode::Char('o'), _) => Some(Action::OpenBrowser),
            (KeyCode::Char('1'), ViewMode::List) => Some(Action::SwitchScope(ArticleScope::Public)),
            (KeyCode::Char('2'), ViewMode::List) => Some(Action::SwitchScope(ArticleScope::Mine)),
            (KeyCode::Char('f'), ViewMode::List) => Some(Action::CycleFilter),
            (KeyCode::Char('n'), ViewMode::List) => Some(Action::LoadNewPosts),
            (KeyCode::Char('r'), _) => Some(Action::ResumePolling),
            (KeyCode::Char('p'), _) => Some(Action::TogglePolling),
            _ => None,
        };
        if let Some(action) = action {
            let _ = self.action_tx.send(action);
        }
    }

    #[tracing::instrument(skip(self, action))]
    pub async fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::NavigateUp => match self.view_mode {
                ViewMode::Detail => self.detail_scroll = self.detail_scroll.saturating_sub(1),
                ViewMode::List => self.select_prev(),
            },
            Action::NavigateDown => match self.view_mode {
                ViewMode::Detail => self.detail_scroll = self.detail_scroll.saturating_add(1),
                ViewMode::List => {
                    self.select_next();
                    self.maybe_load_more();
                }
            },
            Action::Enter => {
                let Some(article) = self.selected().cloned() else {
                    return;
                };
                self.view_mode = ViewMode::Detail;
                self.detail_scroll = 0;
                self.selected_article = Some(article.clone());

                let api = self.api.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    match api.get_article(&article.article_id).await {
                        Ok(full) => {
                            let _ = tx.send(Action::ArticleLoaded(full));
                        }
                        Err(e) => {
                            tracing::warn!(
                                article_id = %article.article_id,
                                "Failed to load article: {:#}",
                                e
                            );
                        }
                    }
                });
            }
            Action::ArticleLoaded(article) => {
                if let Some(current) = &mut self.selected_article
                    && current.article_id == article.article_id
                {
                    *current = article;
                }
            }
            Action::Back => {
                self.view_mode = ViewMode::List;
                self.selected_article = None;
            }
            Action::OpenBrowser => self.open_in_browser(),
            Action::SwitchScope(scope) => {
                if scope != self.scope {
                    self.scope = scope;
                    let _ = self.action_tx.send(Action::LoadArticles);
                }
            }
            Action::CycleFilter => {
                self.filter = self.filter.next();
                self.reset_selection();
                self.notify(Toast::info(format!("Filter: {}", self.filter)));
            }
            Action::LoadArticles => {
                self.loading = true;
                self.articles.clear();
                self.next_token = None;
                self.list_state.select(None);
                let query = ListQuery::first_page(self.scope, self.config.api.page_size);
                self.spawn_page_load(query, false);
            }
            Action::LoadMore => {
                if self.loading {
                    return;
                }
                let Some(token) = self.next_token.clone() else {
                    return;
                };
                self.loading = true;
                let query =
                    ListQuery::first_page(self.scope, self.config.api.page_size).after(token);
                self.spawn_page_load(query, true);
            }
            Action::ArticlesLoaded {
                scope,
                page,
                append,
            } => self.apply_page(scope, page, append),
            Action::LoadNewPosts => {
                if let Some(poller) = &self.poller {
                    poller.reset_new_posts();
                }
                self.api.invalidate_articles_cache();
                self.scope = ArticleScope::Public;
                self.view_mode = ViewMode::List;
                let _ = self.action_tx.send(Action::LoadArticles);
            }
            Action::ResumePolling => {
                if self.poll_snapshot.is_paused()
                    && let Some(poller) = &self.poller
                {
                    poller.resume();
                    self.notify(Toast::info("Checking for new posts again"));
                }
            }
            Action::TogglePolling => {
                self.config.polling.enabled = !self.config.polling.enabled;
                if let Some(poller) = &self.poller {
                    poller.set_enabled(self.config.polling.enabled);
                }
                self.config.save();

                let status = match self.config.polling.enabled {
                    true => "enabled",
                    false => "disabled",
                };
                self.notify(Toast::info(format!("New posts polling {}", status)));
            }
            Action::PendingStatusChanged(article) => self.apply_status_change(article),
            Action::Error(msg) => {
                self.loading = false;
                self.notify(Toast::error(msg));
            }
        }
    }

    fn spawn_page_load(&self, query: ListQuery, append: bool) {
        let api = self.api.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match api.list_articles(&query).await {
                Ok(page) => {
                    let _ = tx.send(Action::ArticlesLoaded {
                        scope: query.scope,
                        page,
                        append,
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to load articles: {:#}", e);
                    let _ = tx.send(Action::Error("Failed to load posts".to_string()));
                }
            }
        });
    }

    fn apply_page(&mut self, scope: ArticleScope, page: ArticlePage, append: bool) {
        if scope != self.scope {
            tracing::debug!(%scope, current = %self.scope, "dropping page for inactive scope");
            return;
        }
        self.loading = false;
        self.next_token = page.next_token;

        if scope == ArticleScope::Public && !append {
            self.new_posts.set_watermark(Watermark::from_articles(&page.items));
        }
        if scope == ArticleScope::Mine {
            self.watch_pending(&page.items);
        }

        if append {
            self.articles.extend(page.items);
            if !self.visible_articles().is_empty() && self.list_state.selected().is_none() {
                self.list_state.select(Some(0));
            }
        } else {
            self.articles = page.items;
            self.reset_selection();
        }
    }

    /// Hand the user's posts to the pending watcher, starting one when none
    /// is running and something is awaiting moderation.
    fn watch_pending(&mut self, posts: &[Article]) {
        if let Some(pending) = &self.pending_watch
            && !pending.is_finished()
        {
            pending.track(posts.to_vec());
            return;
        }
        if !posts.iter().any(Article::is_pending) {
            return;
        }

        let notified = NotifiedPosts::load_or_create().unwrap_or_else(|e| {
            tracing::error!("Failed to load notified posts: {:#}", e);
            NotifiedPosts::new()
        });
        let tx = self.action_tx.clone();
        self.pending_watch = Some(spawn_pending_watcher(
            Arc::new(self.api.clone()),
            PendingTracker::new(notified),
            posts,
            PendingWatchConfig {
                interval: self.config.pending.interval(),
                max_duration: self.config.pending.max_duration(),
            },
            move |article| {
                let _ = tx.send(Action::PendingStatusChanged(article));
            },
        ));
    }

    fn apply_status_change(&mut self, article: Article) {
        let title = article.display_title().to_string();
        let toast = match article.status {
            ArticleStatus::Public => Toast::success(format!("\"{}\" is now public", title)),
            ArticleStatus::Private => Toast::info(format!("\"{}\" was approved as private", title)),
            ArticleStatus::Rejected => Toast::warning(format!("\"{}\" was rejected", title)),
            status => Toast::info(format!("\"{}\" is now {}", title, status)),
        };
        self.notify(toast);
        self.api.invalidate_articles_cache();

        if let Some(existing) = self
            .articles
            .iter_mut()
            .find(|a| a.article_id == article.article_id)
        {
            *existing = article;
        }
    }

    /// Track poller state; the transition into `Paused` is announced once.
    pub fn apply_snapshot(&mut self, snapshot: PollSnapshot) {
        if snapshot.is_paused() && !self.poll_snapshot.is_paused() {
            self.notify(Toast::warning(format!(
                "Stopped checking for new posts after {} failed attempts. Press r to retry.",
                snapshot.consecutive_failures
            )));
        }
        self.poll_snapshot = snapshot;
    }

    fn open_in_browser(&mut self) {
        let Some(article) = self.current_article().cloned() else {
            return;
        };
        let Some(base) = self.config.api.web_base_url.clone() else {
            self.notify(Toast::warning("Set api.web_base_url to open posts"));
            return;
        };
        match crate::utils::url::post_url(&base, &article.article_id) {
            Some(url) => {
                if let Err(e) = open::that(&url) {
                    tracing::error!(%url, "Failed to open browser: {}", e);
                    self.notify(Toast::error("Could not open browser"));
                }
            }
            None => self.notify(Toast::error(format!("Invalid web_base_url: {}", base))),
        }
    }

    pub fn visible_articles(&self) -> Vec<&Article> {
        self.articles
            .iter()
            .filter(|a| self.filter.matches(a))
            .collect()
    }

    pub fn selected(&self) -> Option<&Article> {
        let index = self.list_state.selected()?;
        self.visible_articles().get(index).copied()
    }

    fn current_article(&self) -> Option<&Article> {
        match self.view_mode {
            ViewMode::Detail => self.selected_article.as_ref(),
            ViewMode::List => self.selected(),
        }
    }

    fn reset_selection(&mut self) {
        let selected = match self.visible_articles().is_empty() {
            true => None,
            false => Some(0),
        };
        self.list_state.select(selected);
    }

    fn maybe_load_more(&self) {
        let total = self.visible_articles().len();
        if self.sentinel.should_load_more(
            self.list_state.selected(),
            total,
            self.next_token.is_some(),
            self.loading,
        ) {
            tracing::debug!(total, "scroll sentinel reached, loading next page");
            let _ = self.action_tx.send(Action::LoadMore);
        }
    }

    fn select_next(&mut self) {
        let len = self.visible_articles().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn select_prev(&mut self) {
        if self.visible_articles().is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn get_spinner_char(&self) -> &'static str {
        const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER_FRAMES[self.spinner_state % SPINNER_FRAMES.len()]
    }

    pub fn ui(&mut self, f: &mut Frame) {
        super::view::draw(self, f);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

async fn next_snapshot(rx: &mut Option<watch::Receiver<PollSnapshot>>) -> Option<PollSnapshot> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::polling::PollPhase;

    fn article(id: &str, created_at: &str, status: ArticleStatus) -> Article {
        Article {
            article_id: id.to_string(),
            title: Some(format!("Post {}", id)),
            created_at: Some(created_at.parse().unwrap()),
            status,
            ..Default::default()
        }
    }

    fn page(count: usize, next_token: Option<&str>) -> ArticlePage {
        ArticlePage {
            items: (0..count)
                .map(|i| {
                    article(
                        &format!("p{}", i),
                        &format!("2024-05-{:02}T00:00:00Z", 28 - i),
                        ArticleStatus::Public,
                    )
                })
                .collect(),
            next_token: next_token.map(String::from),
        }
    }

    fn app() -> App {
        App::with_config(AppConfig::default())
    }

    #[tokio::test]
    async fn test_first_page_sets_watermark_and_selection() {
        let mut app = app();
        app.handle_action(Action::ArticlesLoaded {
            scope: ArticleScope::Public,
            page: page(5, Some("t2")),
            append: false,
        })
        .await;

        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.next_token.as_deref(), Some("t2"));
        assert_eq!(app.new_posts.watermark().unwrap().article_id, "p0");
    }

    #[tokio::test]
    async fn test_overlapping_first_pages_do_not_duplicate_rows() {
        let mut app = app();
        let single = ArticlePage {
            items: vec![article("a", "2024-05-01T00:00:00Z", ArticleStatus::Public)],
            next_token: None,
        };
        for _ in 0..2 {
            app.handle_action(Action::ArticlesLoaded {
                scope: ArticleScope::Public,
                page: single.clone(),
                append: false,
            })
            .await;
        }

        assert_eq!(app.articles.len(), 1);
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[tokio::test]
    async fn test_page_for_other_scope_is_ignored() {
        let mut app = app();
        app.handle_action(Action::ArticlesLoaded {
            scope: ArticleScope::Mine,
            page: page(3, None),
            append: false,
        })
        .await;
        assert!(app.articles.is_empty());
    }

    #[tokio::test]
    async fn test_navigating_into_margin_requests_next_page() {
        let mut app = app();
        app.handle_action(Action::ArticlesLoaded {
            scope: ArticleScope::Public,
            page: page(6, Some("t2")),
            append: false,
        })
        .await;

        // Rows 2..=5 are inside the default margin of 3.
        app.handle_action(Action::NavigateDown).await;
        assert!(app.action_rx.try_recv().is_err());
        app.handle_action(Action::NavigateDown).await;
        assert!(matches!(app.action_rx.try_recv(), Ok(Action::LoadMore)));
    }

    #[tokio::test]
    async fn test_no_load_more_without_next_token() {
        let mut app = app();
        app.handle_action(Action::ArticlesLoaded {
            scope: ArticleScope::Public,
            page: page(2, None),
            append: false,
        })
        .await;
        app.handle_action(Action::NavigateDown).await;
        assert!(app.action_rx.try_recv().is_err());
        assert_eq!(app.list_state.selected(), Some(1));

        // Stays on the last row.
        app.handle_action(Action::NavigateDown).await;
        assert_eq!(app.list_state.selected(), Some(1));
    }

    #[tokio::test]
    async fn test_appended_page_keeps_watermark() {
        let mut app = app();
        app.handle_action(Action::ArticlesLoaded {
            scope: ArticleScope::Public,
            page: page(2, Some("t2")),
            append: false,
        })
        .await;
        app.handle_action(Action::ArticlesLoaded {
            scope: ArticleScope::Public,
            page: ArticlePage {
                items: vec![article("old", "2024-01-01T00:00:00Z", ArticleStatus::Public)],
                next_token: None,
            },
            append: true,
        })
        .await;

        assert_eq!(app.articles.len(), 3);
        assert!(app.next_token.is_none());
        assert_eq!(app.new_posts.watermark().unwrap().article_id, "p0");
    }

    #[test]
    fn test_pause_transition_toasts_once() {
        let mut app = app();
        let paused = PollSnapshot {
            consecutive_failures: 3,
            phase: PollPhase::Paused,
            is_tab_visible: true,
            ..Default::default()
        };

        app.apply_snapshot(paused);
        let toast = app.toast.take().unwrap();
        assert!(toast.message.contains("3 failed attempts"));

        app.apply_snapshot(paused);
        assert!(app.toast.is_none());
    }

    #[tokio::test]
    async fn test_filter_hides_other_statuses() {
        let mut app = app();
        app.articles = vec![
            article("a", "2024-05-01T00:00:00Z", ArticleStatus::Public),
            article("b", "2024-05-02T00:00:00Z", ArticleStatus::Private),
        ];
        app.handle_action(Action::CycleFilter).await;
        assert_eq!(app.filter, StatusFilter::Public);
        assert_eq!(app.visible_articles().len(), 1);

        app.handle_action(Action::CycleFilter).await;
        assert_eq!(app.selected().unwrap().article_id, "b");
    }

    #[tokio::test]
    async fn test_status_change_updates_row_and_toasts() {
        let mut app = app();
        app.articles = vec![article("a", "2024-05-01T00:00:00Z", ArticleStatus::Pending)];

        app.handle_action(Action::PendingStatusChanged(article(
            "a",
            "2024-05-01T00:00:00Z",
            ArticleStatus::Rejected,
        )))
        .await;

        assert_eq!(app.articles[0].status, ArticleStatus::Rejected);
        assert!(app.toast.unwrap().message.contains("rejected"));
    }

    #[test]
    fn test_focus_events_drive_visibility() {
        use crate::internal::polling::VisibilitySource;

        let mut app = app();
        app.handle_terminal_event(Event::FocusLost);
        assert!(!app.visibility.is_visible());
        app.handle_terminal_event(Event::FocusGained);
        assert!(app.visibility.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_keeps_new_posts_count() {
        use crate::internal::polling::PollConfig;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let check = move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                match call {
                    0 => anyhow::Ok(4_u64),
                    _ => Err(anyhow::anyhow!("offline")),
                }
            }
        };

        let mut app = app();
        let handle = NewPostsPoller::new(PollConfig {
            interval: Duration::from_secs(10),
            enabled: true,
            max_retries: 2,
        })
        .check_with(check)
        .start(&app.visibility)
        .unwrap();
        let mut rx = handle.subscribe();
        app.poller = Some(handle);

        let paused = *rx.wait_for(|s| s.is_paused()).await.unwrap();
        assert_eq!(paused.pending_count, 4);
        app.apply_snapshot(paused);
        app.toast = None;

        app.handle_action(Action::ResumePolling).await;
        let resumed = *rx.wait_for(|s| !s.is_paused()).await.unwrap();
        assert_eq!(resumed.pending_count, 4);
        assert_eq!(resumed.consecutive_failures, 0);
        assert!(app.toast.unwrap().message.contains("again"));
    }

    #[tokio::test]
    async fn test_resume_is_ignored_unless_paused() {
        let mut app = app();
        app.handle_action(Action::ResumePolling).await;
        assert!(app.toast.is_none());
    }
}
