use std::time::{Duration, Instant};

/// Kind of toast shown over the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    fn timeout(&self) -> Duration {
        match self {
            ToastKind::Info | ToastKind::Success => Duration::from_secs(3),
            ToastKind::Warning => Duration::from_secs(5),
            ToastKind::Error => Duration::from_secs(10),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ToastKind::Info => "Info",
            ToastKind::Success => "Done",
            ToastKind::Warning => "Warning",
            ToastKind::Error => "Error",
        }
    }
}

/// A toast message that dismisses itself after its kind's timeout
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Error)
    }

    fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        }
    }

    pub fn should_dismiss(&self) -> bool {
        self.shown_at.elapsed() > self.kind.timeout()
    }

    pub fn remaining_time(&self) -> Duration {
        self.kind.timeout().saturating_sub(self.shown_at.elapsed())
    }
}
