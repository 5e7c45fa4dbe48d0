use crate::overlay::fade::{FadeAnimation, FadeConfig};
use crate::overlay::messages::{HideReason, OverlayRequest};
use crate::overlay::placement::random_position;
use crate::overlay::surface::{OverlaySurface, SurfaceCapabilities};
use crate::session::OverlaySession;
use crate::settings::{Settings, SoundMode};
use crate::sound::SoundPlayer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Hidden,
    /// Visible with a fade-in still running.
    Showing,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayConfig {
    pub image_size: (i32, i32),
    pub margin: i32,
    pub fade: FadeConfig,
    pub sound_mode: SoundMode,
    pub auto_hide_after: Option<Duration>,
}

impl OverlayConfig {
    pub fn from_settings(settings: &Settings, image_size: (i32, i32)) -> Self {
        Self {
            image_size,
            margin: settings.margin,
            fade: FadeConfig::new(settings.fade_in(), settings.fade_steps),
            sound_mode: settings.sound_mode,
            auto_hide_after: settings.auto_hide_after(),
        }
    }
}

/// Show/hide state machine for the single overlay surface.
///
/// Lives on the overlay thread; every transition and fade step runs here.
/// Platform failures abort the transition in progress and are logged, never
/// returned.
pub struct OverlayController<S, R = StdRng> {
    surface: S,
    sound: Option<Box<dyn SoundPlayer>>,
    config: OverlayConfig,
    session: Arc<OverlaySession>,
    capabilities: SurfaceCapabilities,
    rng: R,
    visible: bool,
    fade: Option<FadeAnimation>,
    position: Option<(i32, i32)>,
    opacity: f32,
    shown_at: Option<Instant>,
}

impl<S: OverlaySurface> OverlayController<S, StdRng> {
    pub fn new(
        surface: S,
        sound: Option<Box<dyn SoundPlayer>>,
        config: OverlayConfig,
        session: Arc<OverlaySession>,
    ) -> Self {
        Self::with_rng(surface, sound, config, session, StdRng::from_entropy())
    }
}

impl<S: OverlaySurface, R: Rng> OverlayController<S, R> {
    pub fn with_rng(
        surface: S,
        sound: Option<Box<dyn SoundPlayer>>,
        config: OverlayConfig,
        session: Arc<OverlaySession>,
        rng: R,
    ) -> Self {
        let capabilities = surface.capabilities();
        tracing::debug!(?capabilities, "overlay surface capabilities");
        session.set_visible(false);
        Self {
            surface,
            sound,
            config,
            session,
            capabilities,
            rng,
            visible: false,
            fade: None,
            position: None,
            opacity: 0.0,
            shown_at: None,
        }
    }

    pub fn state(&self) -> OverlayState {
        match (self.visible, self.fade.is_some()) {
            (false, _) => OverlayState::Hidden,
            (true, true) => OverlayState::Showing,
            (true, false) => OverlayState::Visible,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        self.position
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn handle(&mut self, request: OverlayRequest, now: Instant) -> bool {
        match request {
            OverlayRequest::Show => self.show(now),
            OverlayRequest::Hide => self.hide(HideReason::Requested),
            OverlayRequest::Shutdown => self.hide(HideReason::Shutdown),
        }
    }

    /// `Hidden -> Showing`. Returns `false` when already visible or when the
    /// surface could not be placed or shown.
    pub fn show(&mut self, now: Instant) -> bool {
        if self.visible {
            tracing::debug!("show ignored; overlay already visible");
            return false;
        }

        let screen = self.surface.screen_size();
        let (x, y) = random_position(
            &mut self.rng,
            screen,
            self.config.image_size,
            self.config.margin,
        );
        if let Err(err) = self.surface.move_to(x, y) {
            tracing::warn!("failed to place overlay at ({x}, {y}): {err:#}");
            return false;
        }
        self.position = Some((x, y));

        if let Err(err) = self.surface.show() {
            tracing::warn!("failed to show overlay: {err:#}");
            return false;
        }
        self.visible = true;
        self.session.set_visible(true);
        self.shown_at = Some(now);
        tracing::debug!(x, y, "overlay shown");

        if self.config.sound_mode == SoundMode::Loop {
            if let Some(sound) = self.sound.as_mut() {
                sound.start_loop();
            }
        }

        self.begin_fade(now);
        true
    }

    fn begin_fade(&mut self, now: Instant) {
        self.fade = None;
        if !self.capabilities.opacity {
            self.opacity = 1.0;
            return;
        }
        if !self.config.fade.is_enabled() {
            self.apply_opacity(1.0);
            return;
        }
        if self.apply_opacity(0.0) {
            self.fade = Some(FadeAnimation::start(self.config.fade, now));
        }
    }

    fn apply_opacity(&mut self, value: f32) -> bool {
        match self.surface.set_opacity(value) {
            Ok(()) => {
                self.opacity = value;
                true
            }
            Err(err) => {
                tracing::warn!("failed to set overlay opacity to {value}: {err:#}");
                false
            }
        }
    }

    /// `Showing/Visible -> Hidden`. Returns `false` when already hidden.
    pub fn hide(&mut self, reason: HideReason) -> bool {
        if !self.visible {
            return false;
        }

        match self.config.sound_mode {
            SoundMode::Loop => {
                if let Some(sound) = self.sound.as_mut() {
                    sound.stop();
                }
            }
            SoundMode::OneShot => {
                if reason == HideReason::PointerEntered {
                    if let Some(sound) = self.sound.as_mut() {
                        sound.play_once();
                    }
                }
            }
        }

        if let Err(err) = self.surface.hide() {
            tracing::warn!("failed to hide overlay: {err:#}");
        }
        self.visible = false;
        self.session.set_visible(false);
        self.fade = None;
        self.shown_at = None;
        tracing::debug!(?reason, "overlay hidden");
        true
    }

    /// Pointer crossed into the surface. Ignored unless visible.
    pub fn pointer_entered(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.hide(HideReason::PointerEntered)
    }

    /// Run at most one due fade step and the auto-hide check.
    pub fn advance(&mut self, now: Instant) {
        if let Some(mut fade) = self.fade {
            if !self.visible {
                self.fade = None;
            } else if fade.is_due(now) {
                let value = fade.current_opacity();
                self.fade = if !self.apply_opacity(value) {
                    None
                } else if fade.advance(now) {
                    Some(fade)
                } else {
                    tracing::debug!("fade-in complete");
                    None
                };
            }
        }

        if let (Some(after), Some(shown_at)) = (self.config.auto_hide_after, self.shown_at) {
            if self.visible && now >= shown_at + after {
                self.hide(HideReason::AutoHide);
            }
        }
    }

    /// Earliest instant at which [`OverlayController::advance`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        let fade_due = self.fade.map(|fade| fade.next_due);
        let auto_hide = match (self.config.auto_hide_after, self.shown_at) {
            (Some(after), Some(shown_at)) => Some(shown_at + after),
            _ => None,
        };
        match (fade_due, auto_hide) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
