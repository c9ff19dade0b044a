use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::{ClientError, Disposition};

pub const MAX_VISIBLE: usize = 3;
pub const DEFAULT_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: Instant,
}

/// Short-lived messages, oldest first. Showing a fourth evicts the oldest.
#[derive(Debug, Default)]
pub struct ToastQueue {
    visible: VecDeque<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(
        &mut self,
        message: impl Into<String>,
        kind: ToastKind,
        duration: Duration,
        now: Instant,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        if self.visible.len() == MAX_VISIBLE {
            self.visible.pop_front();
        }
        self.visible.push_back(Toast {
            id,
            message: message.into(),
            kind,
            expires_at: now + duration,
        });
        id
    }

    /// Info toast with the default lifetime.
    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, ToastKind::Info, DEFAULT_DURATION, Instant::now())
    }

    pub fn hide(&mut self, id: u64) -> bool {
        let before = self.visible.len();
        self.visible.retain(|t| t.id != id);
        self.visible.len() != before
    }

    /// Drop every toast whose lifetime has run out. Returns how many went.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.visible.len();
        self.visible.retain(|t| t.expires_at > now);
        before - self.visible.len()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.visible.iter()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Show the toast an error calls for, if any.
    pub fn report(&mut self, error: &ClientError, now: Instant) -> Option<u64> {
        let (message, kind) = toast_for(error)?;
        Some(self.show(message, kind, DEFAULT_DURATION, now))
    }
}

/// Toast text for an error. Silent errors and login redirects get none.
pub fn toast_for(error: &ClientError) -> Option<(String, ToastKind)> {
    match error.disposition() {
        Disposition::Toast | Disposition::ToastThenRedirect(_) => {
            Some((error.to_string(), ToastKind::Error))
        }
        Disposition::RedirectToLogin | Disposition::Silent => None,
    }
}

// ── Tests ──────────────────────────────────────────────────────
