use tokio::sync::watch;

/// Last published visibility plus the number of changes so far.
///
/// A watch receiver only sees the latest value, so a hide immediately
/// followed by a show reads as "still visible". The counter lets a
/// subscriber tell that a round trip happened in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility {
    pub visible: bool,
    pub changes: u64,
}

impl Visibility {
    /// True when the receiver missed a hide and a show since `seen`.
    pub fn returned_since(&self, seen: u64) -> bool {
        self.visible && self.changes.wrapping_sub(seen) >= 2
    }
}

/// Capability that reports whether the user is looking at the app.
pub trait VisibilitySource: Send + Sync {
    fn is_visible(&self) -> bool;

    /// Receiver that is notified on every visibility change.
    fn subscribe(&self) -> watch::Receiver<Visibility>;
}

/// Visibility driven by terminal focus events.
///
/// The app calls [`FocusVisibility::set_visible`] on `FocusGained` /
/// `FocusLost`; tests call it directly to simulate tab switches.
#[derive(Debug, Clone)]
pub struct FocusVisibility {
    tx: watch::Sender<Visibility>,
}

impl FocusVisibility {
    pub fn new(visible: bool) -> Self {
        let (tx, _rx) = watch::channel(Visibility {
            visible,
            changes: 0,
        });
        Self { tx }
    }

    /// Publish a new visibility value. Repeating the current value is a no-op.
    pub fn set_visible(&self, visible: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if current.visible == visible {
                false
            } else {
                current.visible = visible;
                current.changes = current.changes.wrapping_add(1);
                true
            }
        });
        if changed {
            tracing::debug!(visible, "visibility changed");
        }
    }
}

impl Default for FocusVisibility {
    fn default() -> Self {
        Self::new(true)
    }
}

impl VisibilitySource for FocusVisibility {
    fn is_visible(&self) -> bool {
        self.tx.borrow().visible
    }

    fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.tx.subscribe()
    }
}
