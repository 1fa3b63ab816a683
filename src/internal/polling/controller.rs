use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use super::{
    CheckNewPosts, ConfigurationError, PollConfig, PollPhase, PollSnapshot, PollState,
    Visibility, VisibilitySource,
};

type CheckFuture = BoxFuture<'static, anyhow::Result<u64>>;

#[derive(Debug, Clone, Copy)]
enum Command {
    Reset,
    Resume,
    SetEnabled(bool),
}

/// Builder for a visibility-aware new posts poller.
///
/// ```ignore
/// let handle = NewPostsPoller::new(PollConfig::default())
///     .check_with(move || api.count_new_posts())
///     .start(&visibility)?;
/// ```
pub struct NewPostsPoller {
    config: PollConfig,
    check: Option<Arc<dyn CheckNewPosts>>,
}

impl NewPostsPoller {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            check: None,
        }
    }

    pub fn check_with<C: CheckNewPosts>(mut self, check: C) -> Self {
        self.check = Some(Arc::new(check));
        self
    }

    pub fn check_shared(mut self, check: Arc<dyn CheckNewPosts>) -> Self {
        self.check = Some(check);
        self
    }

    /// Validate the config and spawn the poller task on the current runtime.
    ///
    /// When enabled and visible, the first check runs immediately.
    pub fn start(
        self,
        visibility: &dyn VisibilitySource,
    ) -> Result<PollerHandle, ConfigurationError> {
        self.config.validate()?;
        let check = self.check.ok_or(ConfigurationError::MissingCheck)?;

        let visibility = visibility.subscribe();
        let seen_changes = visibility.borrow().changes;
        let state = PollState {
            is_tab_visible: visibility.borrow().visible,
            ..Default::default()
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(PollSnapshot {
            is_tab_visible: state.is_tab_visible,
            ..Default::default()
        });
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = PollTask {
            check,
            config: self.config,
            state,
            visibility,
            seen_changes,
            commands: command_rx,
            snapshot: snapshot_tx,
            cancel: cancel.clone(),
            next_tick: None,
            in_flight: None,
        };

        tracing::info!(
            interval = ?self.config.interval,
            max_retries = self.config.max_retries,
            enabled = self.config.enabled,
            visible = state.is_tab_visible,
            "starting new posts poller"
        );

        Ok(PollerHandle {
            snapshot: snapshot_rx,
            commands: command_tx,
            cancel,
            task: Some(tokio::spawn(task.run())),
        })
    }
}

/// Host-side handle to a running poller. Dropping it disposes the poller.
pub struct PollerHandle {
    snapshot: watch::Receiver<PollSnapshot>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn pending_count(&self) -> u64 {
        self.snapshot.borrow().pending_count
    }

    pub fn snapshot(&self) -> PollSnapshot {
        *self.snapshot.borrow()
    }

    /// Receiver notified whenever the published snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.snapshot.clone()
    }

    /// Clear the pending count and the failure streak. A paused poller
    /// re-arms its timer if it is enabled and visible.
    pub fn reset_new_posts(&self) {
        self.send(Command::Reset);
    }

    /// Clear the failure streak of a paused poller and re-arm its timer,
    /// keeping the pending count. Does nothing unless paused.
    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.send(Command::SetEnabled(enabled));
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the timer and the visibility subscription. An in-flight check is
    /// dropped and its result discarded.
    pub fn dispose(&mut self) {
        if self.cancel.is_cancelled() && self.task.is_none() {
            return;
        }
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        tracing::debug!("new posts poller disposed");
    }

    /// Dispose and wait for the task to wind down.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!(?command, "poller already stopped; command dropped");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct PollTask {
    check: Arc<dyn CheckNewPosts>,
    config: PollConfig,
    state: PollState,
    visibility: watch::Receiver<Visibility>,
    seen_changes: u64,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshot: watch::Sender<PollSnapshot>,
    cancel: CancellationToken,
    next_tick: Option<Instant>,
    in_flight: Option<CheckFuture>,
}

impl PollTask {
    async fn run(mut self) {
        let mut visibility_open = true;

        if self.should_poll() {
            self.launch();
        }
        self.publish();

        loop {
            let checking = self.in_flight.is_some();
            let tick = self.next_tick;

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },

                changed = self.visibility.changed(), if visibility_open => match changed {
                    Ok(()) => {
                        let update = *self.visibility.borrow_and_update();
                        self.on_visibility(update);
                    }
                    Err(_) => {
                        tracing::debug!("visibility source closed; keeping last known state");
                        visibility_open = false;
                    }
                },

                outcome = wait_in_flight(&mut self.in_flight), if checking => {
                    self.in_flight = None;
                    self.on_outcome(outcome);
                }

                _ = sleep_until(tick.unwrap_or_else(Instant::now)), if tick.is_some() && !checking => {
                    self.next_tick = None;
                    if self.should_poll() {
                        self.launch();
                    }
                }
            }

            self.publish();
        }

        tracing::debug!("new posts poller stopped");
    }

    fn should_poll(&self) -> bool {
        self.config.enabled
            && self.state.is_tab_visible
            && !self.state.exhausted(self.config.max_retries)
    }

    fn phase(&self) -> PollPhase {
        if self.in_flight.is_some() {
            PollPhase::Checking
        } else if self.state.exhausted(self.config.max_retries) {
            PollPhase::Paused
        } else if self.next_tick.is_some() {
            PollPhase::Scheduled
        } else {
            PollPhase::Idle
        }
    }

    fn publish(&self) {
        let next = PollSnapshot {
            pending_count: self.state.pending_count,
            is_tab_visible: self.state.is_tab_visible,
            consecutive_failures: self.state.consecutive_failures,
            phase: self.phase(),
        };
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    /// Start a check unless one is already outstanding.
    fn launch(&mut self) {
        if self.in_flight.is_some() {
            tracing::debug!("check already in flight; skipping");
            return;
        }
        self.next_tick = None;
        let check = Arc::clone(&self.check);
        tracing::debug!("checking for new posts");
        self.in_flight = Some(Box::pin(async move { check.check_new_posts().await }));
    }

    /// Arm the timer one interval from now, or clear it when polling is off.
    fn arm(&mut self) {
        self.next_tick = self
            .should_poll()
            .then(|| Instant::now() + self.config.interval);
    }

    fn on_outcome(&mut self, outcome: anyhow::Result<u64>) {
        let tripped = self.state.record(&outcome, self.config.max_retries);

        match &outcome {
            Ok(count) if *count > 0 => tracing::info!(count, "found new posts"),
            Ok(_) => tracing::debug!("no new posts"),
            Err(err) => tracing::warn!(
                error = %err,
                failures = self.state.consecutive_failures,
                "new posts check failed"
            ),
        }
        if tripped {
            tracing::warn!(
                max_retries = self.config.max_retries,
                "max retries reached, pausing new posts polling"
            );
        }

        self.arm();
    }

    fn on_visibility(&mut self, update: Visibility) {
        let returned = update.returned_since(self.seen_changes);
        self.seen_changes = update.changes;
        let visible = update.visible;
        if self.state.is_tab_visible == visible && !returned {
            return;
        }
        self.state.is_tab_visible = visible;

        if !visible {
            self.next_tick = None;
            return;
        }
        if self.should_poll() {
            tracing::info!("terminal focused, checking for new posts");
            self.launch();
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Reset => {
                let was_paused = self.state.exhausted(self.config.max_retries);
                self.state.reset();
                tracing::info!(was_paused, "new posts reset");
                if was_paused && self.in_flight.is_none() {
                    self.arm();
                }
            }
            Command::Resume => {
                if !self.state.exhausted(self.config.max_retries) {
                    return;
                }
                self.state.consecutive_failures = 0;
                tracing::info!(
                    pending = self.state.pending_count,
                    "resuming new posts polling"
                );
                if self.in_flight.is_none() {
                    self.arm();
                }
            }
            Command::SetEnabled(enabled) => {
                if self.config.enabled == enabled {
                    return;
                }
                self.config.enabled = enabled;
                tracing::info!(enabled, "new posts polling toggled");
                if !enabled {
                    self.next_tick = None;
                } else if self.should_poll() {
                    self.launch();
                }
            }
        }
    }
}

async fn wait_in_flight(in_flight: &mut Option<CheckFuture>) -> anyhow::Result<u64> {
    match in_flight.as_mut() {
        Some(check) => check.await,
        None => std::future::pending().await,
    }
}
