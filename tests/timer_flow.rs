use std::{sync::Arc, time::Duration};

use tokio::{sync::broadcast, time::sleep};

use pomodoro_daemon::{
    services::{
        geometry::Display,
        platform::{NotificationKind, Platform},
        HeadlessPlatform, PushEvent,
    },
    state::{AppState, Command, Phase, RuntimeOptions, Settings, SettingsUpdate, StartOptions},
    tasks::window_watch_task,
};

fn setup(focus: u64, rest: u64, platform: HeadlessPlatform) -> (Arc<AppState>, Arc<HeadlessPlatform>) {
    let platform = Arc::new(platform);
    let dyn_platform: Arc<dyn Platform> = platform.clone();
    let state = AppState::new(
        Settings::from_seconds(focus, rest),
        dyn_platform,
        RuntimeOptions::default(),
    );
    (state, platform)
}

fn drain(rx: &mut broadcast::Receiver<PushEvent>) -> Vec<PushEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn focus_expiry_flips_to_idle_break_and_notifies() {
    let (state, platform) = setup(3, 5, HeadlessPlatform::default());
    let mut rx = state.subscribe();

    state.dispatch(Command::StartTimer(StartOptions::default()));
    sleep(Duration::from_millis(3500)).await;

    let snapshot = state.dispatch(Command::GetState);
    assert_eq!(snapshot.phase, Phase::Break);
    assert_eq!(snapshot.remaining_seconds, 5);
    assert!(!snapshot.running);
    assert_eq!(state.active_clocks(), 0);

    let events = drain(&mut rx);
    assert!(events.contains(&PushEvent::PlaySound { sound_type: Phase::Focus }));
    let remaining: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            PushEvent::TimeUpdate(s) => Some(s.remaining_seconds),
            PushEvent::PlaySound { .. } => None,
        })
        .collect();
    // Start, two decrements and the flip, each repeated once
    assert_eq!(remaining, vec![3, 3, 2, 2, 1, 1, 5, 5]);

    let notifications = platform.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].request.kind, NotificationKind::PhaseEnded(Phase::Focus));
    assert!(state.tracked_windows().end_of_phase.is_some());
    assert!(platform.created_windows()[0].url.contains("isEndScreen=true"));
}

#[tokio::test(start_paused = true)]
async fn continue_button_starts_next_phase() {
    let (state, platform) = setup(2, 4, HeadlessPlatform::default());
    state.start(None).unwrap();
    sleep(Duration::from_millis(2500)).await;

    let id = platform.notifications()[0].id.clone();
    assert!(platform.press_button(&id, 0));
    sleep(Duration::from_millis(10)).await;

    let snapshot = state.snapshot().unwrap();
    assert_eq!(snapshot.phase, Phase::Break);
    assert_eq!(snapshot.remaining_seconds, 4);
    assert!(snapshot.running);
    assert_eq!(state.active_clocks(), 1);
    assert!(platform.notifications()[0].cleared);
}

#[tokio::test(start_paused = true)]
async fn pause_button_and_dismissal_leave_timer_idle() {
    let (state, platform) = setup(1, 2, HeadlessPlatform::default());
    state.start(None).unwrap();
    sleep(Duration::from_millis(1500)).await;

    let id = platform.notifications()[0].id.clone();
    assert!(platform.press_button(&id, 1));
    sleep(Duration::from_millis(10)).await;
    assert!(!state.snapshot().unwrap().running);

    state.start(None).unwrap();
    sleep(Duration::from_millis(2500)).await;
    let notification = platform.notifications()[1].clone();
    assert_eq!(notification.request.kind, NotificationKind::PhaseEnded(Phase::Break));
    assert!(platform.dismiss(&notification.id));
    sleep(Duration::from_millis(10)).await;

    let snapshot = state.snapshot().unwrap();
    assert_eq!(snapshot.phase, Phase::Focus);
    assert!(!snapshot.running);
}

#[tokio::test(start_paused = true)]
async fn double_start_decrements_once_per_period() {
    let (state, _platform) = setup(60, 30, HeadlessPlatform::default());
    state.dispatch(Command::StartTimer(StartOptions::default()));
    state.dispatch(Command::StartTimer(StartOptions::default()));
    assert_eq!(state.active_clocks(), 1);

    sleep(Duration::from_millis(2500)).await;
    let snapshot = state.snapshot().unwrap();
    assert_eq!(snapshot.remaining_seconds, 58);
    assert!(snapshot.running);
}

#[tokio::test(start_paused = true)]
async fn pause_keeps_remaining_and_reset_restores_focus() {
    let (state, _platform) = setup(60, 30, HeadlessPlatform::default());
    state.start(Some(Phase::Break)).unwrap();
    sleep(Duration::from_millis(5500)).await;

    let paused = state.dispatch(Command::PauseTimer);
    assert_eq!(paused.phase, Phase::Break);
    assert_eq!(paused.remaining_seconds, 25);

    sleep(Duration::from_secs(3)).await;
    assert_eq!(state.snapshot().unwrap().remaining_seconds, 25);

    let reset = state.dispatch(Command::ResetTimer);
    assert_eq!(reset.phase, Phase::Focus);
    assert_eq!(reset.remaining_seconds, 60);
    assert!(!reset.running);
    assert_eq!(state.active_clocks(), 0);
}

#[tokio::test(start_paused = true)]
async fn settings_resync_idle_active_phase() {
    let (state, _platform) = setup(1500, 300, HeadlessPlatform::default());

    let snapshot = state.dispatch(Command::UpdateSettings(SettingsUpdate::new(Some(25), Some(5))));
    assert_eq!(snapshot.remaining_seconds, 1500);

    let snapshot = state.dispatch(Command::UpdateSettings(SettingsUpdate::new(Some(30), None)));
    assert_eq!(snapshot.remaining_seconds, 1800);
    assert_eq!(snapshot.settings.focus_minutes, 30);

    let snapshot = state.dispatch(Command::UpdateSettings(SettingsUpdate::new(Some(0), Some(5))));
    assert_eq!(snapshot.settings.focus_minutes, 30);
    assert_eq!(snapshot.remaining_seconds, 1800);
}

#[tokio::test(start_paused = true)]
async fn near_expiry_warning_does_not_touch_state() {
    let (state, platform) = setup(5, 5, HeadlessPlatform::default());
    state.start(None).unwrap();
    sleep(Duration::from_millis(2500)).await;

    let notifications = platform.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].request.kind, NotificationKind::NearExpiry(Phase::Focus));

    assert!(platform.press_button(&notifications[0].id, 0));
    sleep(Duration::from_millis(10)).await;

    let snapshot = state.snapshot().unwrap();
    assert_eq!(snapshot.phase, Phase::Focus);
    assert_eq!(snapshot.remaining_seconds, 3);
    assert!(snapshot.running);
}

#[tokio::test(start_paused = true)]
async fn misplaced_window_is_moved_back_once() {
    let display = Display::new(0, 0, 1920, 1080).primary();
    let (state, platform) = setup(60, 30, HeadlessPlatform::new(vec![display]).with_placement_offset(10, 20));

    assert!(state.toggle_status_window().await.unwrap());
    let id = state.tracked_windows().status.unwrap();
    assert!(platform.moves().is_empty());

    sleep(Duration::from_millis(150)).await;
    assert_eq!(platform.moves(), vec![(id, 760, 240)]);
    let window = platform.get_window(id).await.unwrap().unwrap();
    assert_eq!((window.left, window.top, window.width, window.height), (760, 240, 400, 600));
}

#[tokio::test(start_paused = true)]
async fn status_window_toggles_and_tracks_user_close() {
    let (state, platform) = setup(60, 30, HeadlessPlatform::default());

    assert!(state.toggle_status_window().await.unwrap());
    assert_eq!(platform.open_windows(), 1);
    assert!(!state.toggle_status_window().await.unwrap());
    assert_eq!(platform.open_windows(), 0);
    assert!(state.tracked_windows().status.is_none());

    // Closed behind the daemon's back: the next toggle reopens
    assert!(state.toggle_status_window().await.unwrap());
    let id = state.tracked_windows().status.unwrap();
    platform.remove_window(id).await.unwrap();
    assert!(state.toggle_status_window().await.unwrap());
    assert_ne!(state.tracked_windows().status, Some(id));
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_tracked_windows() {
    let (state, platform) = setup(60, 30, HeadlessPlatform::default());
    state.start(None).unwrap();
    state.toggle_status_window().await.unwrap();

    state.shutdown().await;
    assert_eq!(platform.open_windows(), 0);
    assert_eq!(state.active_clocks(), 0);
    assert!(!state.snapshot().unwrap().running);
}

#[tokio::test(start_paused = true)]
async fn closed_windows_are_forgotten_by_watcher() {
    let (state, platform) = setup(1, 30, HeadlessPlatform::default());
    tokio::spawn(window_watch_task(Arc::clone(&state)));

    state.start(None).unwrap();
    sleep(Duration::from_millis(1500)).await;
    assert!(state.toggle_status_window().await.unwrap());

    let tracked = state.tracked_windows();
    let status = tracked.status.unwrap();
    let end_of_phase = tracked.end_of_phase.unwrap();
    assert_eq!(platform.open_windows(), 2);

    platform.remove_window(status).await.unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(state.tracked_windows().status, None);
    assert_eq!(state.tracked_windows().end_of_phase, Some(end_of_phase));

    platform.remove_window(end_of_phase).await.unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(state.tracked_windows().end_of_phase, None);
    assert_eq!(platform.open_windows(), 0);
}

#[tokio::test(start_paused = true)]
async fn phase_end_clears_outstanding_warning() {
    let (state, platform) = setup(5, 30, HeadlessPlatform::default());
    state.start(None).unwrap();
    sleep(Duration::from_millis(2500)).await;

    let warning = platform.notifications()[0].clone();
    assert_eq!(warning.request.kind, NotificationKind::NearExpiry(Phase::Focus));
    assert!(!warning.cleared);

    sleep(Duration::from_secs(3)).await;
    let notifications = platform.notifications();
    assert_eq!(notifications.len(), 2);
    assert!(notifications[0].cleared);
    assert_eq!(notifications[1].request.kind, NotificationKind::PhaseEnded(Phase::Focus));
    assert!(!notifications[1].cleared);

    // The warning no longer accepts input
    assert!(!platform.press_button(&warning.id, 0));
}

#[tokio::test(start_paused = true)]
async fn shutdown_clears_outstanding_warning() {
    let (state, platform) = setup(5, 30, HeadlessPlatform::default());
    state.start(None).unwrap();
    sleep(Duration::from_millis(2500)).await;

    state.shutdown().await;
    sleep(Duration::from_millis(10)).await;
    assert!(platform.notifications()[0].cleared);
}
