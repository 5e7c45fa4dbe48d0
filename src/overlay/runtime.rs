use crate::overlay::controller::{OverlayConfig, OverlayController};
use crate::overlay::messages::{HideReason, OverlayRequest};
use crate::overlay::surface::{OverlayPointerEvent, OverlaySurface};
use crate::session::OverlaySession;
use crate::sound::SoundPlayer;
use anyhow::{anyhow, Result};
use rand::Rng;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest the overlay loop blocks before pumping window messages again.
pub const IDLE_POLL: Duration = Duration::from_millis(16);

pub struct OverlayHandles {
    pub overlay_thread_handle: JoinHandle<()>,
    pub requests: Sender<OverlayRequest>,
}

/// Spawn the overlay thread.
///
/// The surface and the sound player are built on the new thread because both
/// are bound to the thread that created them. Returns once the surface exists,
/// or with the creation error.
pub fn spawn_overlay_thread<S, F, P>(
    make_surface: F,
    make_sound: P,
    config: OverlayConfig,
    session: Arc<OverlaySession>,
) -> Result<OverlayHandles>
where
    S: OverlaySurface + 'static,
    F: FnOnce() -> Result<S> + Send + 'static,
    P: FnOnce() -> Option<Box<dyn SoundPlayer>> + Send + 'static,
{
    let (requests_tx, requests_rx) = channel::<OverlayRequest>();
    let (ready_tx, ready_rx) = channel::<Result<(), String>>();

    let overlay_thread_handle = thread::Builder::new()
        .name("golem-overlay".to_string())
        .spawn(move || {
            let surface = match make_surface() {
                Ok(surface) => surface,
                Err(err) => {
                    let _ = ready_tx.send(Err(format!("{err:#}")));
                    return;
                }
            };
            let sound = make_sound();
            let mut controller = OverlayController::new(surface, sound, config, session);
            let _ = ready_tx.send(Ok(()));
            run_overlay_loop(&mut controller, &requests_rx);
        })
        .map_err(|err| anyhow!("failed to spawn overlay thread: {err}"))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(OverlayHandles {
            overlay_thread_handle,
            requests: requests_tx,
        }),
        Ok(Err(msg)) => {
            let _ = overlay_thread_handle.join();
            Err(anyhow!("failed to create overlay surface: {msg}"))
        }
        Err(_) => {
            let _ = overlay_thread_handle.join();
            Err(anyhow!("overlay thread exited during startup"))
        }
    }
}

/// Drive `controller` until a shutdown request arrives or every sender is
/// gone. Always leaves the overlay hidden with its sound stopped.
pub fn run_overlay_loop<S, R>(
    controller: &mut OverlayController<S, R>,
    requests: &Receiver<OverlayRequest>,
) where
    S: OverlaySurface,
    R: Rng,
{
    loop {
        controller.surface_mut().pump();
        controller.advance(Instant::now());

        for event in controller.surface_mut().drain_pointer_events() {
            match event {
                OverlayPointerEvent::Entered => {
                    controller.pointer_entered();
                }
            }
        }

        let wait = controller
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()).min(IDLE_POLL))
            .unwrap_or(IDLE_POLL);

        match requests.recv_timeout(wait) {
            Ok(OverlayRequest::Shutdown) => {
                controller.hide(HideReason::Shutdown);
                break;
            }
            Ok(request) => {
                controller.handle(request, Instant::now());
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                controller.hide(HideReason::Shutdown);
                break;
            }
        }
    }
    tracing::debug!("overlay loop exited");
}
