//! Toast notifications.

use memorybank_core::presentation::{PresentationHost, PresentationState};
use std::sync::Mutex;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

impl ToastLevel {
    fn marker(self) -> &'static str {
        match self {
            ToastLevel::Success => "✓",
            ToastLevel::Info => "•",
            ToastLevel::Error => "✗",
        }
    }
}

/// A short user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub message: Option<String>,
}

impl Toast {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            title: title.into(),
            message: None,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            title: title.into(),
            message: None,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            title: title.into(),
            message: Some(message.into()),
        }
    }

    /// One-line rendering, e.g. `✗ Save failed: HTTP 500`.
    pub fn format(&self) -> String {
        match &self.message {
            Some(message) => format!("{} {}: {}", self.level.marker(), self.title, message),
            None => format!("{} {}", self.level.marker(), self.title),
        }
    }
}

/// Sink for toasts.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Prints toasts to the terminal. Errors go to stderr.
///
/// While an exclusive presentation is held, success and info toasts are
/// queued and printed when the last guard is released. Errors always print
/// immediately.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    /// Suppress success and info toasts (`--json` output).
    pub quiet: bool,
    presentation: PresentationState,
    pending: Mutex<Vec<Toast>>,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            ..Self::default()
        }
    }

    /// Number of queued toasts.
    pub fn pending(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or_default()
    }

    fn print(&self, toast: &Toast) {
        if self.quiet {
            log::info!("{}", toast.format());
        } else {
            println!("{}", toast.format());
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        if toast.level == ToastLevel::Error {
            log::error!("{}", toast.format());
            eprintln!("{}", toast.format());
        } else if self.presentation.is_exclusive() {
            if let Ok(mut pending) = self.pending.lock() {
                pending.push(toast);
            }
        } else {
            self.print(&toast);
        }
    }
}

impl PresentationHost for ConsoleNotifier {
    fn enter_exclusive(&self) {
        self.presentation.enter_exclusive();
    }

    fn exit_exclusive(&self) {
        self.presentation.exit_exclusive();
        if self.presentation.is_exclusive() {
            return;
        }
        let pending = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for toast in &pending {
            self.print(toast);
        }
    }
}

/// Keeps toasts in memory.
#[derive(Debug, Default)]
pub struct ToastLog {
    toasts: Mutex<Vec<Toast>>,
}

impl ToastLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

impl Notifier for ToastLog {
    fn notify(&self, toast: Toast) {
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(toast);
        }
    }
}
