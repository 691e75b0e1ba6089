//! Exclusive full-screen presentation.
//!
//! The annotation view takes over the whole window: page scrolling and
//! overscroll are disabled while it is open. That takeover is a resource.
//! [`ExclusivePresentation`] acquires it on construction and releases it on
//! drop, so the host is restored on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Platform side of the takeover (e.g. toggling document overflow styles).
pub trait PresentationHost {
    fn enter_exclusive(&self);
    fn exit_exclusive(&self);
}

/// Nesting-aware presentation state.
///
/// Nested views share one takeover: the host is entered by the first guard
/// and exited by the last.
#[derive(Debug, Default)]
pub struct PresentationState {
    depth: AtomicUsize,
}

impl PresentationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_exclusive(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

impl PresentationHost for PresentationState {
    fn enter_exclusive(&self) {
        self.depth.fetch_add(1, Ordering::SeqCst);
    }

    fn exit_exclusive(&self) {
        // Saturate so an unbalanced exit cannot wrap
        let _ = self
            .depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| d.checked_sub(1));
    }
}

/// Guard holding the exclusive presentation for its lifetime.
#[must_use = "the presentation is released as soon as the guard is dropped"]
pub struct ExclusivePresentation<'a, H: PresentationHost + ?Sized> {
    host: &'a H,
}

impl<'a, H: PresentationHost + ?Sized> ExclusivePresentation<'a, H> {
    pub fn acquire(host: &'a H) -> Self {
        log::debug!("Entering exclusive presentation");
        host.enter_exclusive();
        Self { host }
    }
}

impl<H: PresentationHost + ?Sized> Drop for ExclusivePresentation<'_, H> {
    fn drop(&mut self) {
        log::debug!("Leaving exclusive presentation");
        self.host.exit_exclusive();
    }
}
