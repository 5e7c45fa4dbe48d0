use crate::overlay::messages::OverlayRequest;
use crate::session::OverlaySession;
use crate::settings::Settings;
use anyhow::{anyhow, Result};
use rand::Rng;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Sleep increment while waiting for the next show.
pub const DELAY_INCREMENT: Duration = Duration::from_millis(500);

/// Sleep increment during the cooldown after a show.
pub const COOLDOWN_INCREMENT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerConfig {
    pub min_delay_s: u64,
    pub max_delay_s: u64,
    pub cooldown: Duration,
    pub delay_increment: Duration,
    pub cooldown_increment: Duration,
}

impl TriggerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let (min_delay_s, max_delay_s) = ordered(settings.min_delay_s, settings.max_delay_s);
        Self {
            min_delay_s,
            max_delay_s,
            cooldown: settings.cooldown(),
            delay_increment: DELAY_INCREMENT,
            cooldown_increment: COOLDOWN_INCREMENT,
        }
    }
}

fn ordered(a: u64, b: u64) -> (u64, u64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Draw the next wait, in whole seconds, uniformly from `[min, max]`.
pub fn draw_delay<R: Rng + ?Sized>(rng: &mut R, min_delay_s: u64, max_delay_s: u64) -> Duration {
    let (lo, hi) = ordered(min_delay_s, max_delay_s);
    Duration::from_secs(rng.gen_range(lo..=hi))
}

/// Sleep for `total` in `increment` slices, checking the stop flag before each
/// slice. Returns `false` if stop was requested before the time ran out.
pub fn interruptible_sleep(total: Duration, increment: Duration, session: &OverlaySession) -> bool {
    let increment = increment.max(Duration::from_millis(1));
    let mut slept = Duration::ZERO;
    while slept < total {
        if session.stop_requested() {
            return false;
        }
        let slice = increment.min(total - slept);
        thread::sleep(slice);
        slept += slice;
    }
    !session.stop_requested()
}

/// Background loop: wait a random delay, request a show, cool down, repeat.
///
/// Ends when stop is requested (sending one final hide) or when the overlay
/// thread has gone away.
pub fn run_trigger_loop<R: Rng>(
    config: TriggerConfig,
    session: &OverlaySession,
    requests: &Sender<OverlayRequest>,
    rng: &mut R,
) {
    while !session.stop_requested() {
        let delay = draw_delay(rng, config.min_delay_s, config.max_delay_s);
        tracing::debug!(delay_s = delay.as_secs(), "next overlay scheduled");
        if !interruptible_sleep(delay, config.delay_increment, session) {
            break;
        }
        if requests.send(OverlayRequest::Show).is_err() {
            tracing::debug!("overlay thread gone; trigger loop exiting");
            return;
        }
        if !interruptible_sleep(config.cooldown, config.cooldown_increment, session) {
            break;
        }
    }
    let _ = requests.send(OverlayRequest::Hide);
    tracing::debug!("trigger loop stopped");
}

/// Run [`run_trigger_loop`] on its own thread with a fresh RNG.
pub fn spawn_trigger_thread(
    config: TriggerConfig,
    session: Arc<OverlaySession>,
    requests: Sender<OverlayRequest>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("golem-trigger".to_string())
        .spawn(move || {
            let mut rng = rand::thread_rng();
            run_trigger_loop(config, &session, &requests, &mut rng);
        })
        .map_err(|err| anyhow!("failed to spawn trigger thread: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Instant;

    #[test]
    fn delay_draws_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let d = draw_delay(&mut rng, 3, 9).as_secs();
            assert!((3..=9).contains(&d), "delay {d}");
        }
    }

    #[test]
    fn equal_bounds_give_fixed_delay() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(draw_delay(&mut rng, 0, 0), Duration::ZERO);
    }

    #[test]
    fn sleep_returns_early_when_stopped() {
        let session = OverlaySession::new();
        session.request_stop();
        let start = Instant::now();
        assert!(!interruptible_sleep(
            Duration::from_secs(60),
            Duration::from_millis(10),
            &session
        ));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_completes_without_stop() {
        let session = OverlaySession::new();
        assert!(interruptible_sleep(
            Duration::from_millis(30),
            Duration::from_millis(10),
            &session
        ));
    }
}
