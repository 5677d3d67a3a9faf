use std::{sync::Arc, time::Duration};

use tokio::net::TcpListener;

use pomodoro_daemon::{
    client::{MirrorUpdate, RemoteClient},
    create_router,
    services::{platform::Platform, HeadlessPlatform},
    state::{AppState, Command, Phase, RuntimeOptions, Settings, Snapshot, StartOptions},
};

async fn serve(settings: Settings, options: RuntimeOptions) -> String {
    let platform: Arc<dyn Platform> = Arc::new(HeadlessPlatform::default());
    let state = AppState::new(settings, platform, options);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn send_returns_snapshot() {
    let url = serve(Settings::from_minutes(25, 5), RuntimeOptions::default()).await;
    let client = RemoteClient::new(url);

    let snapshot = client
        .send(&Command::StartTimer(StartOptions { force_focus: Some(false) }))
        .await
        .unwrap();
    assert_eq!(snapshot.phase, Phase::Break);
    assert!(snapshot.running);
}

#[tokio::test]
async fn watch_follows_pushed_events() {
    let options = RuntimeOptions {
        tick_period: Duration::from_millis(50),
        republish_delay: Duration::from_millis(10),
        correction_delay: Duration::from_millis(10),
    };
    let url = serve(Settings::from_seconds(2, 3), options).await;
    let client = RemoteClient::new(url.clone());

    // Start only once the watcher has subscribed
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        RemoteClient::new(url).send(&Command::StartTimer(StartOptions::default())).await.unwrap();
    });

    let mut seen: Vec<(MirrorUpdate, Option<Snapshot>)> = Vec::new();
    let watching = tokio::time::timeout(
        Duration::from_millis(1200),
        // Polling is slow enough that only pushes can report the countdown
        client.watch(Duration::from_secs(60), |update, mirror| {
            seen.push((update, mirror.current().copied()));
        }),
    )
    .await;
    assert!(watching.is_err());

    let (first_update, first) = seen[0];
    assert_eq!(first_update, MirrorUpdate::Changed);
    assert_eq!(first.map(|s| (s.remaining_seconds, s.running)), Some((2, false)));

    let remaining: Vec<u64> = seen
        .iter()
        .filter(|(update, _)| *update == MirrorUpdate::Changed)
        .filter_map(|(_, snapshot)| snapshot.map(|s| s.remaining_seconds))
        .collect();
    assert_eq!(remaining, vec![2, 2, 1, 3]);

    assert!(seen.iter().any(|(update, _)| *update == MirrorUpdate::PlaySound(Phase::Focus)));
    let last = seen.last().and_then(|(_, snapshot)| *snapshot).unwrap();
    assert_eq!(last.phase, Phase::Break);
    assert!(!last.running);
}
