use anyhow::Result;

/// Optional platform features, detected once when the surface is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceCapabilities {
    /// Background colour is keyed out.
    pub chroma_key: bool,
    /// Whole-surface opacity can be changed; required for the fade-in.
    pub opacity: bool,
    /// Surface is kept out of the taskbar and task switcher.
    pub hidden_from_taskbar: bool,
}

impl SurfaceCapabilities {
    pub fn all() -> Self {
        Self {
            chroma_key: true,
            opacity: true,
            hidden_from_taskbar: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPointerEvent {
    /// The pointer crossed into the surface bounds.
    Entered,
}

/// Window-system surface showing the overlay image.
///
/// Every method is called from the overlay thread only.
pub trait OverlaySurface {
    fn capabilities(&self) -> SurfaceCapabilities;

    /// Usable screen size in pixels.
    fn screen_size(&self) -> (i32, i32);

    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    fn show(&mut self) -> Result<()>;

    fn hide(&mut self) -> Result<()>;

    /// Set whole-surface opacity in `[0, 1]`. Only called when
    /// [`SurfaceCapabilities::opacity`] is set.
    fn set_opacity(&mut self, opacity: f32) -> Result<()>;

    /// Dispatch pending window-system messages.
    fn pump(&mut self) {}

    fn drain_pointer_events(&mut self) -> Vec<OverlayPointerEvent>;
}

impl<T: OverlaySurface + ?Sized> OverlaySurface for Box<T> {
    fn capabilities(&self) -> SurfaceCapabilities {
        (**self).capabilities()
    }

    fn screen_size(&self) -> (i32, i32) {
        (**self).screen_size()
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        (**self).move_to(x, y)
    }

    fn show(&mut self) -> Result<()> {
        (**self).show()
    }

    fn hide(&mut self) -> Result<()> {
        (**self).hide()
    }

    fn set_opacity(&mut self, opacity: f32) -> Result<()> {
        (**self).set_opacity(opacity)
    }

    fn pump(&mut self) {
        (**self).pump()
    }

    fn drain_pointer_events(&mut self) -> Vec<OverlayPointerEvent> {
        (**self).drain_pointer_events()
    }
}

/// Stand-in used when no window-system surface can be created. Tracks
/// nothing on screen and never reports pointer events, so the trigger loop
/// and state machine keep running until shutdown.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    screen: (i32, i32),
}

impl HeadlessSurface {
    pub fn new(screen: (i32, i32)) -> Self {
        Self { screen }
    }
}

impl OverlaySurface for HeadlessSurface {
    fn capabilities(&self) -> SurfaceCapabilities {
        SurfaceCapabilities::default()
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }

    fn move_to(&mut self, _x: i32, _y: i32) -> Result<()> {
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        tracing::debug!("headless overlay shown");
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        tracing::debug!("headless overlay hidden");
        Ok(())
    }

    fn set_opacity(&mut self, _opacity: f32) -> Result<()> {
        Ok(())
    }

    fn drain_pointer_events(&mut self) -> Vec<OverlayPointerEvent> {
        Vec::new()
    }
}
