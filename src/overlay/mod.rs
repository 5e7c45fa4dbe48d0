pub mod controller;
pub mod fade;
pub mod messages;
pub mod placement;
pub mod runtime;
pub mod surface;
pub mod window;

pub use controller::{OverlayConfig, OverlayController, OverlayState};
pub use messages::{HideReason, OverlayRequest};
pub use surface::{HeadlessSurface, OverlayPointerEvent, OverlaySurface, SurfaceCapabilities};
