//! Clock driver: the single periodic tick registration

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::state::AppState;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// An active clock registration.
///
/// Dropping the handle cancels the registration, so emptying the slot that
/// holds it is all it takes to stop ticking.
#[derive(Debug)]
pub struct ClockHandle {
    id: u64,
    task: JoinHandle<()>,
    live: Arc<AtomicUsize>,
}

impl ClockHandle {
    /// Spawn a clock that ticks `state` every `period`, first tick one period
    /// from now. `live` counts registrations that have not been cancelled.
    pub fn spawn(state: Weak<AppState>, id: u64, period: Duration, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        let task = tokio::spawn(run_clock(state, id, period));
        debug!("Clock {} registered", id);
        Self { id, task, live }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.task.abort();
        self.live.fetch_sub(1, Ordering::SeqCst);
        debug!("Clock {} cancelled", self.id);
    }
}

async fn run_clock(state: Weak<AppState>, id: u64, period: Duration) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let Some(state) = state.upgrade() else {
            break;
        };
        if state.tick(id).stops_clock() {
            break;
        }
    }
}
