//! Memory Bank Application
//!
//! The `memorybank` command-line shell: configuration, the session gate,
//! note/graph/auth commands and the annotation controller.

pub mod annotate;
pub mod commands;
mod config;
mod notify;
mod shortcuts;

pub use annotate::{AnnotateError, AnnotationController, AnnotationScript, PdfState, SaveFlag};
pub use config::AppConfig;
pub use notify::{ConsoleNotifier, Notifier, Toast, ToastLevel, ToastLog};
pub use shortcuts::{Shortcut, ShortcutRegistry};
