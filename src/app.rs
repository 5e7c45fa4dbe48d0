use crate::assets::{load_overlay_image, resolve_asset_path, resolve_sound_path};
use crate::overlay::runtime::spawn_overlay_thread;
use crate::overlay::window::open_surface;
use crate::overlay::{OverlayConfig, OverlayRequest};
use crate::session::OverlaySession;
use crate::settings::Settings;
use crate::sound::open_player;
use crate::trigger::{spawn_trigger_thread, TriggerConfig};
use anyhow::Result;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Cloneable trigger for a clean shutdown from any thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    session: Arc<OverlaySession>,
    requests: Sender<OverlayRequest>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.session.request_stop();
        let _ = self.requests.send(OverlayRequest::Shutdown);
    }
}

/// A started overlay: the overlay thread plus the trigger loop feeding it.
pub struct App {
    session: Arc<OverlaySession>,
    shutdown: ShutdownHandle,
    overlay_thread: JoinHandle<()>,
    trigger_thread: Option<JoinHandle<()>>,
}

impl App {
    /// Load assets and start both threads.
    ///
    /// The only fatal failure is an image that cannot be loaded. A host
    /// without an overlay window runs headless and a missing sound runs
    /// silent.
    pub fn start(settings: &Settings) -> Result<Self> {
        let image_path = resolve_asset_path(&settings.image_path);
        let image = load_overlay_image(&image_path, settings.target_width)?;
        let sound_path = resolve_sound_path(settings.sound_path.as_deref());

        let session = Arc::new(OverlaySession::new());
        let config = OverlayConfig::from_settings(settings, image.size());
        tracing::info!(
            image = %image_path.display(),
            sound_mode = %settings.sound_mode,
            min_delay_s = settings.min_delay_s,
            max_delay_s = settings.max_delay_s,
            "starting overlay"
        );

        let margin = config.margin;
        let handles = spawn_overlay_thread(
            move || Ok(open_surface(&image, margin)),
            move || sound_path.and_then(open_player),
            config,
            session.clone(),
        )?;
        let shutdown = ShutdownHandle {
            session: session.clone(),
            requests: handles.requests,
        };

        let trigger_thread = match spawn_trigger_thread(
            TriggerConfig::from_settings(settings),
            session.clone(),
            shutdown.requests.clone(),
        ) {
            Ok(trigger) => Some(trigger),
            Err(err) => {
                tracing::error!("{err:#}");
                shutdown.shutdown();
                None
            }
        };

        Ok(Self {
            session,
            shutdown,
            overlay_thread: handles.overlay_thread_handle,
            trigger_thread,
        })
    }

    pub fn session(&self) -> &Arc<OverlaySession> {
        &self.session
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Block until the overlay thread exits, then stop the trigger loop.
    pub fn wait(self) {
        let Self {
            session,
            shutdown,
            overlay_thread,
            trigger_thread,
        } = self;
        drop(shutdown);

        if overlay_thread.join().is_err() {
            tracing::error!("overlay thread panicked");
        }
        session.request_stop();
        if let Some(trigger) = trigger_thread {
            if trigger.join().is_err() {
                tracing::error!("trigger thread panicked");
            }
        }
        tracing::info!("overlay stopped");
    }
}

/// Run the overlay until a shutdown signal arrives.
///
/// Returns an error only when the image cannot be loaded; nothing is shown
/// in that case.
pub fn run(settings: Settings) -> Result<()> {
    let app = App::start(&settings)?;
    let shutdown = app.shutdown_handle();
    if let Err(err) = ctrlc::set_handler(move || shutdown.shutdown()) {
        tracing::warn!("failed to install shutdown handler: {err}");
    }
    app.wait();
    Ok(())
}
