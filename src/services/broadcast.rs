//! Push channel towards connected UI surfaces
//!
//! Delivery is best-effort. Every state push is repeated once after a short
//! delay to mask surfaces that missed the first send; clients additionally
//! poll. This is a redundancy heuristic, not guaranteed delivery, and clients
//! may observe snapshots out of order.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::state::{Phase, Snapshot};

pub const DEFAULT_REPUBLISH_DELAY: Duration = Duration::from_millis(100);

/// Events pushed to every connected surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushEvent {
    TimeUpdate(Snapshot),
    #[serde(rename_all = "camelCase")]
    PlaySound { sound_type: Phase },
}

impl PushEvent {
    /// Event name used on the SSE stream
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::TimeUpdate(_) => "TIME_UPDATE",
            PushEvent::PlaySound { .. } => "PLAY_SOUND",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<PushEvent>,
    republish_delay: Duration,
}

impl Broadcaster {
    pub fn new(republish_delay: Duration) -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx, republish_delay }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.tx.subscribe()
    }

    /// Push a snapshot now and once more after the republish delay
    pub fn publish(&self, snapshot: Snapshot) {
        self.send(PushEvent::TimeUpdate(snapshot));

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available, skipping delayed republish");
            return;
        };
        let tx = self.tx.clone();
        let delay = self.republish_delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            send_event(&tx, PushEvent::TimeUpdate(snapshot));
        });
    }

    /// Ask surfaces to play the end-of-phase sound
    pub fn play_sound(&self, phase: Phase) {
        self.send(PushEvent::PlaySound { sound_type: phase });
    }

    fn send(&self, event: PushEvent) {
        send_event(&self.tx, event);
    }
}

fn send_event(tx: &broadcast::Sender<PushEvent>, event: PushEvent) {
    // No surface connected is an expected condition
    if tx.send(event).is_err() {
        debug!("No surface listening for push events");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SettingsView;

    fn snapshot(remaining_seconds: u64) -> Snapshot {
        Snapshot {
            remaining_seconds,
            phase: Phase::Focus,
            running: true,
            settings: SettingsView { focus_minutes: 25, break_minutes: 5 },
        }
    }

    #[test]
    fn events_use_type_and_payload_envelope() {
        let json = serde_json::to_value(PushEvent::PlaySound { sound_type: Phase::Break }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "PLAY_SOUND", "payload": {"soundType": "break"}}));

        let json = serde_json::to_value(PushEvent::TimeUpdate(snapshot(7))).unwrap();
        assert_eq!(json["type"], "TIME_UPDATE");
        assert_eq!(json["payload"]["remainingSeconds"], 7);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_is_repeated_after_delay() {
        let broadcaster = Broadcaster::new(Duration::from_millis(100));
        let mut rx = broadcaster.subscribe();

        broadcaster.publish(snapshot(42));
        assert_eq!(rx.try_recv().unwrap(), PushEvent::TimeUpdate(snapshot(42)));
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(rx.try_recv().unwrap(), PushEvent::TimeUpdate(snapshot(42)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_listeners_is_silent() {
        let broadcaster = Broadcaster::new(DEFAULT_REPUBLISH_DELAY);
        broadcaster.publish(snapshot(1));
        broadcaster.play_sound(Phase::Focus);
    }
}
