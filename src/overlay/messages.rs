/// Requests posted to the overlay thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayRequest {
    Show,
    Hide,
    /// Hide, stop the sound and leave the overlay loop.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideReason {
    PointerEntered,
    Requested,
    AutoHide,
    Shutdown,
}
