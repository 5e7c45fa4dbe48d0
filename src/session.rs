use std::sync::atomic::{AtomicBool, Ordering};

/// Flags shared between the trigger thread, the overlay thread and the
/// shutdown handler.
///
/// `visible` is only written from the overlay thread; `stop_requested` is
/// written by the shutdown handler and read by everyone else.
#[derive(Debug, Default)]
pub struct OverlaySession {
    stop_requested: AtomicBool,
    visible: AtomicBool,
}

impl OverlaySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        if !self.stop_requested.swap(true, Ordering::SeqCst) {
            tracing::debug!("stop requested");
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }
}
