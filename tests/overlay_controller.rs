use golem_overlay::overlay::fade::FadeConfig;
use golem_overlay::overlay::{
    HideReason, OverlayConfig, OverlayController, OverlayRequest, OverlayState,
    SurfaceCapabilities,
};
use golem_overlay::session::OverlaySession;
use golem_overlay::settings::SoundMode;
use golem_overlay::sound::SoundPlayer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mock_surface::{MockSound, MockSurface, SoundCall, SurfaceCall};

fn config(fade_ms: u64, steps: u32) -> OverlayConfig {
    OverlayConfig {
        image_size: (128, 128),
        margin: 20,
        fade: FadeConfig::new(Duration::from_millis(fade_ms), steps),
        sound_mode: SoundMode::Loop,
        auto_hide_after: None,
    }
}

fn controller(
    surface: &MockSurface,
    sound: Option<Box<dyn SoundPlayer>>,
    config: OverlayConfig,
) -> (OverlayController<MockSurface, StdRng>, Arc<OverlaySession>) {
    let session = Arc::new(OverlaySession::new());
    let controller = OverlayController::with_rng(
        surface.clone(),
        sound,
        config,
        session.clone(),
        StdRng::seed_from_u64(11),
    );
    (controller, session)
}

#[test]
fn starts_hidden_with_zero_opacity() {
    let surface = MockSurface::default();
    let (ctl, session) = controller(&surface, None, config(1500, 30));
    assert_eq!(ctl.state(), OverlayState::Hidden);
    assert_eq!(ctl.opacity(), 0.0);
    assert!(!session.is_visible());
    assert!(surface.calls().is_empty());
}

#[test]
fn show_places_shows_plays_then_fades_in_order() {
    let surface = MockSurface::default();
    let sound = MockSound::default();
    let (mut ctl, session) = controller(&surface, sound.boxed(), config(1500, 30));

    assert!(ctl.show(Instant::now()));

    let calls = surface.calls();
    let (x, y) = ctl.position().unwrap();
    assert_eq!(
        calls,
        vec![
            SurfaceCall::MoveTo(x, y),
            SurfaceCall::Show,
            SurfaceCall::SetOpacity(0.0)
        ]
    );
    assert!((20..=1920 - 128 - 20).contains(&x));
    assert!((20..=1080 - 128 - 20).contains(&y));
    assert_eq!(ctl.state(), OverlayState::Showing);
    assert!(session.is_visible());
    assert_eq!(sound.calls(), vec![SoundCall::StartLoop]);
}

#[test]
fn second_show_is_a_no_op() {
    let surface = MockSurface::default();
    let sound = MockSound::default();
    let (mut ctl, _) = controller(&surface, sound.boxed(), config(1500, 30));
    let now = Instant::now();

    assert!(ctl.show(now));
    let position = ctl.position();
    let calls_before = surface.calls();

    assert!(!ctl.show(now + Duration::from_millis(10)));
    assert!(!ctl.handle(OverlayRequest::Show, now + Duration::from_millis(20)));

    assert_eq!(ctl.position(), position);
    assert_eq!(surface.calls(), calls_before);
    assert_eq!(sound.calls(), vec![SoundCall::StartLoop]);
}

#[test]
fn hide_while_hidden_is_a_no_op() {
    let surface = MockSurface::default();
    let sound = MockSound::default();
    let (mut ctl, _) = controller(&surface, sound.boxed(), config(1500, 30));

    assert!(!ctl.hide(HideReason::Requested));
    assert!(!ctl.hide(HideReason::Shutdown));

    ctl.show(Instant::now());
    assert!(ctl.hide(HideReason::Requested));
    assert!(!ctl.hide(HideReason::Requested));

    assert_eq!(surface.count(&SurfaceCall::Hide), 1);
    assert_eq!(sound.calls(), vec![SoundCall::StartLoop, SoundCall::Stop]);
}

#[test]
fn pointer_enter_while_hidden_changes_nothing() {
    let surface = MockSurface::default();
    let sound = MockSound::default();
    let (mut ctl, _) = controller(&surface, sound.boxed(), config(1500, 30));

    assert!(!ctl.pointer_entered());

    assert_eq!(ctl.state(), OverlayState::Hidden);
    assert!(surface.calls().is_empty());
    assert!(sound.calls().is_empty());
}

#[test]
fn hide_stops_sound_before_hiding_surface() {
    let surface = MockSurface::default();
    let sound = MockSound::default();
    let (mut ctl, session) = controller(&surface, sound.boxed(), config(0, 0));

    ctl.show(Instant::now());
    assert!(ctl.pointer_entered());

    assert_eq!(ctl.state(), OverlayState::Hidden);
    assert!(!session.is_visible());
    assert_eq!(sound.calls(), vec![SoundCall::StartLoop, SoundCall::Stop]);
    assert_eq!(surface.calls().last(), Some(&SurfaceCall::Hide));
}

#[test]
fn completed_fade_is_strictly_increasing_and_evenly_spaced() {
    let surface = MockSurface::default();
    let (mut ctl, _) = controller(&surface, None, config(1500, 30));
    let start = Instant::now();
    let interval = Duration::from_millis(50);

    ctl.show(start);
    assert_eq!(ctl.next_deadline(), Some(start + interval));

    // Nothing happens before the first step is due.
    ctl.advance(start + Duration::from_millis(49));
    assert_eq!(surface.opacity_calls(), vec![0.0]);

    let mut now = start;
    for _ in 0..30 {
        let due = ctl.next_deadline().expect("fade step pending");
        assert_eq!(due - now, interval);
        now = due;
        ctl.advance(now);
    }

    let ramp: Vec<f32> = surface.opacity_calls().into_iter().skip(1).collect();
    assert_eq!(ramp.len(), 30);
    assert!(ramp.windows(2).all(|w| w[0] < w[1]), "ramp not increasing: {ramp:?}");
    assert_eq!(*ramp.last().unwrap(), 1.0);
    assert!((ramp[0] - 1.0 / 30.0).abs() < 1e-6);

    assert_eq!(ctl.state(), OverlayState::Visible);
    assert!(!ctl.is_fading());
    assert_eq!(ctl.next_deadline(), None);

    // Further ticks are inert once the fade is done.
    ctl.advance(now + Duration::from_secs(5));
    assert_eq!(surface.opacity_calls().len(), 31);
}

#[test]
fn one_step_per_tick_even_when_late() {
    let surface = MockSurface::default();
    let (mut ctl, _) = controller(&surface, None, config(100, 4));
    let start = Instant::now();

    ctl.show(start);
    ctl.advance(start + Duration::from_secs(1));

    assert_eq!(surface.opacity_calls(), vec![0.0, 0.25]);
    assert_eq!(
        ctl.next_deadline(),
        Some(start + Duration::from_secs(1) + Duration::from_millis(25))
    );
}

#[test]
fn hide_mid_fade_stops_all_further_opacity_changes() {
    let surface = MockSurface::default();
    let (mut ctl, _) = controller(&surface, None, config(1000, 10));
    let start = Instant::now();

    ctl.show(start);
    for k in 1..=3 {
        ctl.advance(start + Duration::from_millis(100 * k));
    }
    assert_eq!(surface.opacity_calls().len(), 4);

    ctl.hide(HideReason::PointerEntered);
    let calls_at_hide = surface.calls().len();

    for k in 4..=20 {
        ctl.advance(start + Duration::from_millis(100 * k));
    }

    assert_eq!(surface.calls().len(), calls_at_hide);
    assert!(!ctl.is_fading());
    assert_eq!(ctl.next_deadline(), None);
}

#[test]
fn single_step_fade_jumps_straight_to_full_opacity() {
    let surface = MockSurface::default();
    let (mut ctl, _) = controller(&surface, None, config(1500, 1));

    ctl.show(Instant::now());

    assert_eq!(surface.opacity_calls(), vec![1.0]);
    assert_eq!(ctl.state(), OverlayState::Visible);
    assert_eq!(ctl.opacity(), 1.0);
}

#[test]
fn zero_duration_fade_jumps_straight_to_full_opacity() {
    let surface = MockSurface::default();
    let (mut ctl, _) = controller(&surface, None, config(0, 30));

    ctl.show(Instant::now());

    assert_eq!(surface.opacity_calls(), vec![1.0]);
    assert!(!ctl.is_fading());
}

#[test]
fn pointer_enter_after_first_step_applies_exactly_one_step() {
    let surface = MockSurface::default();
    let sound = MockSound::default();
    let (mut ctl, _) = controller(&surface, sound.boxed(), config(1500, 30));
    let start = Instant::now();

    ctl.show(start);
    ctl.advance(start + Duration::from_millis(50));
    assert!(ctl.pointer_entered());
    for k in 2..=40 {
        ctl.advance(start + Duration::from_millis(50 * k));
    }

    let ramp: Vec<f32> = surface.opacity_calls().into_iter().skip(1).collect();
    assert_eq!(ramp.len(), 1);
    assert!((ramp[0] - 0.033).abs() < 0.001);
    let stops = sound
        .calls()
        .iter()
        .filter(|call| **call == SoundCall::Stop)
        .count();
    assert_eq!(stops, 1);
}

#[test]
fn missing_sound_leaves_cycle_intact() {
    let surface = MockSurface::default();
    let (mut ctl, _) = controller(&surface, None, config(0, 0));

    assert!(ctl.show(Instant::now()));
    assert!(ctl.pointer_entered());
    assert!(ctl.show(Instant::now()));

    assert_eq!(surface.count(&SurfaceCall::Show), 2);
    assert_eq!(surface.count(&SurfaceCall::Hide), 1);
}

#[test]
fn one_shot_mode_plays_on_pointer_enter_only() {
    let surface = MockSurface::default();
    let sound = MockSound::default();
    let mut cfg = config(0, 0);
    cfg.sound_mode = SoundMode::OneShot;
    let (mut ctl, _) = controller(&surface, sound.boxed(), cfg);

    ctl.show(Instant::now());
    assert!(sound.calls().is_empty());

    ctl.pointer_entered();
    assert_eq!(sound.calls(), vec![SoundCall::PlayOnce]);

    ctl.show(Instant::now());
    ctl.hide(HideReason::Shutdown);
    assert_eq!(sound.calls(), vec![SoundCall::PlayOnce]);
}

#[test]
fn auto_hide_fires_after_configured_time() {
    let surface = MockSurface::default();
    let sound = MockSound::default();
    let mut cfg = config(0, 0);
    cfg.auto_hide_after = Some(Duration::from_secs(3));
    let (mut ctl, _) = controller(&surface, sound.boxed(), cfg);
    let start = Instant::now();

    ctl.show(start);
    assert_eq!(ctl.next_deadline(), Some(start + Duration::from_secs(3)));

    ctl.advance(start + Duration::from_millis(2999));
    assert!(ctl.is_visible());

    ctl.advance(start + Duration::from_secs(3));
    assert!(!ctl.is_visible());
    assert_eq!(sound.calls(), vec![SoundCall::StartLoop, SoundCall::Stop]);
    assert_eq!(ctl.next_deadline(), None);
}

#[test]
fn missing_opacity_capability_skips_every_opacity_call() {
    let mut surface = MockSurface::default();
    surface.capabilities = SurfaceCapabilities {
        chroma_key: true,
        opacity: false,
        hidden_from_taskbar: false,
    };
    let (mut ctl, _) = controller(&surface, None, config(1500, 30));
    let start = Instant::now();

    ctl.show(start);
    ctl.advance(start + Duration::from_secs(2));

    assert!(surface.opacity_calls().is_empty());
    assert_eq!(ctl.state(), OverlayState::Visible);
    assert_eq!(ctl.opacity(), 1.0);
}

#[test]
fn placement_failure_aborts_show_without_side_effects() {
    let surface = MockSurface::default();
    surface.fail_move.store(true, Ordering::SeqCst);
    let sound = MockSound::default();
    let (mut ctl, session) = controller(&surface, sound.boxed(), config(1500, 30));

    assert!(!ctl.show(Instant::now()));

    assert_eq!(ctl.state(), OverlayState::Hidden);
    assert!(!session.is_visible());
    assert!(surface.calls().is_empty());
    assert!(sound.calls().is_empty());

    surface.fail_move.store(false, Ordering::SeqCst);
    assert!(ctl.show(Instant::now()));
}

#[test]
fn show_failure_leaves_overlay_hidden() {
    let surface = MockSurface::default();
    surface.fail_show.store(true, Ordering::SeqCst);
    let sound = MockSound::default();
    let (mut ctl, _) = controller(&surface, sound.boxed(), config(1500, 30));

    assert!(!ctl.show(Instant::now()));
    assert_eq!(ctl.state(), OverlayState::Hidden);
    assert!(sound.calls().is_empty());
}

#[test]
fn opacity_failure_mid_fade_ends_fade_but_keeps_overlay() {
    let surface = MockSurface::default();
    let (mut ctl, _) = controller(&surface, None, config(1000, 10));
    let start = Instant::now();

    ctl.show(start);
    ctl.advance(start + Duration::from_millis(100));
    surface.fail_opacity.store(true, Ordering::SeqCst);
    ctl.advance(start + Duration::from_millis(200));

    assert!(!ctl.is_fading());
    assert_eq!(ctl.state(), OverlayState::Visible);
    assert_eq!(surface.opacity_calls(), vec![0.0, 0.1]);
}

#[test]
fn shutdown_request_forces_hide() {
    let surface = MockSurface::default();
    let sound = MockSound::default();
    let (mut ctl, session) = controller(&surface, sound.boxed(), config(1500, 30));

    ctl.show(Instant::now());
    assert!(ctl.handle(OverlayRequest::Shutdown, Instant::now()));

    assert!(!session.is_visible());
    assert_eq!(sound.calls(), vec![SoundCall::StartLoop, SoundCall::Stop]);
}

#[test]
fn position_is_rerandomized_on_each_show() {
    let surface = MockSurface::default();
    let (mut ctl, _) = controller(&surface, None, config(0, 0));
    let mut positions = std::collections::HashSet::new();

    for _ in 0..20 {
        ctl.show(Instant::now());
        positions.insert(ctl.position().unwrap());
        ctl.hide(HideReason::Requested);
    }

    assert!(positions.len() > 1);
}
