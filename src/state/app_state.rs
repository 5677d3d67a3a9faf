//! Main application state management

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    error::StateError,
    services::{
        broadcast::{Broadcaster, PushEvent, DEFAULT_REPUBLISH_DELAY},
        notifications,
        platform::{NotificationId, Platform, WindowId},
        windows::{self, TrackedWindows, DEFAULT_CORRECTION_DELAY},
    },
    tasks::{ClockHandle, DEFAULT_TICK_PERIOD},
};

use super::{
    command::Command,
    machine::{TickOutcome, TimerMachine},
    settings::{Settings, SettingsUpdate},
    timer_state::{Phase, Snapshot},
};

/// Timing knobs of the daemon
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Period of the clock driver
    pub tick_period: Duration,
    /// Delay before every push is repeated
    pub republish_delay: Duration,
    /// Delay before a new window's position is verified
    pub correction_delay: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            republish_delay: DEFAULT_REPUBLISH_DELAY,
            correction_delay: DEFAULT_CORRECTION_DELAY,
        }
    }
}

/// Most recent command handled by the daemon
#[derive(Debug, Clone, Serialize)]
pub struct LastAction {
    pub action: String,
    pub at: DateTime<Utc>,
}

/// The state machine together with its clock registration.
///
/// `clock` is `Some` exactly while `machine` is running.
#[derive(Debug)]
struct TimerSlot {
    machine: TimerMachine,
    clock: Option<ClockHandle>,
    next_clock_id: u64,
}

/// Main application state shared by the HTTP handlers and background tasks
pub struct AppState {
    me: Weak<AppState>,
    timer: Mutex<TimerSlot>,
    /// Clock registrations not yet cancelled
    live_clocks: Arc<AtomicUsize>,
    broadcaster: Broadcaster,
    windows: Mutex<TrackedWindows>,
    /// Near-expiry notification still on screen, with the phase it warns about
    warning: Mutex<Option<(Phase, NotificationId)>>,
    platform: Arc<dyn Platform>,
    options: RuntimeOptions,
    /// Server metadata
    start_time: Instant,
    last_action: Mutex<Option<LastAction>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("timer", &self.timer)
            .field("windows", &self.windows)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create the application state with an idle focus timer
    pub fn new(settings: Settings, platform: Arc<dyn Platform>, options: RuntimeOptions) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            timer: Mutex::new(TimerSlot {
                machine: TimerMachine::new(settings),
                clock: None,
                next_clock_id: 1,
            }),
            live_clocks: Arc::new(AtomicUsize::new(0)),
            broadcaster: Broadcaster::new(options.republish_delay),
            windows: Mutex::new(TrackedWindows::default()),
            warning: Mutex::new(None),
            platform,
            options,
            start_time: Instant::now(),
            last_action: Mutex::new(None),
        })
    }

    fn lock_timer(&self) -> Result<MutexGuard<'_, TimerSlot>, StateError> {
        self.timer.lock().map_err(|_| StateError::Poisoned("timer state"))
    }

    fn lock_windows(&self) -> MutexGuard<'_, TrackedWindows> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Subscribe to `TIME_UPDATE` / `PLAY_SOUND` pushes
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.broadcaster.subscribe()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Result<Snapshot, StateError> {
        Ok(self.lock_timer()?.machine.snapshot())
    }

    /// Current snapshot, read even from a poisoned lock
    pub fn best_effort_snapshot(&self) -> Snapshot {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .machine
            .snapshot()
    }

    pub fn settings(&self) -> Result<Settings, StateError> {
        Ok(self.lock_timer()?.machine.settings())
    }

    /// Number of clock registrations currently alive
    pub fn active_clocks(&self) -> usize {
        self.live_clocks.load(Ordering::SeqCst)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or restart) the countdown. Any previous clock registration is
    /// cancelled before the new one is stored.
    pub fn start(&self, force: Option<Phase>) -> Result<Snapshot, StateError> {
        let snapshot = {
            let mut timer = self.lock_timer()?;
            if timer.clock.take().is_some() {
                debug!("Timer already running, replacing clock registration");
            }
            timer.machine.start(force);

            let id = timer.next_clock_id;
            timer.next_clock_id += 1;
            timer.clock = Some(ClockHandle::spawn(
                self.me.clone(),
                id,
                self.options.tick_period,
                Arc::clone(&self.live_clocks),
            ));
            timer.machine.snapshot()
        };

        info!("Starting {} timer with {}s left", snapshot.phase, snapshot.remaining_seconds);
        self.broadcaster.publish(snapshot);
        Ok(snapshot)
    }

    /// Stop the countdown, keeping the remaining time
    pub fn pause(&self) -> Result<Snapshot, StateError> {
        let snapshot = {
            let mut timer = self.lock_timer()?;
            timer.clock = None;
            timer.machine.pause();
            timer.machine.snapshot()
        };

        info!("Paused {} timer at {}s", snapshot.phase, snapshot.remaining_seconds);
        self.broadcaster.publish(snapshot);
        Ok(snapshot)
    }

    /// Back to an idle focus phase with the full focus duration
    pub fn reset(&self) -> Result<Snapshot, StateError> {
        let snapshot = {
            let mut timer = self.lock_timer()?;
            timer.clock = None;
            timer.machine.reset();
            timer.machine.snapshot()
        };

        info!("Timer reset");
        self.broadcaster.publish(snapshot);
        Ok(snapshot)
    }

    /// Pause when running, start otherwise
    pub fn toggle(&self) -> Result<Snapshot, StateError> {
        let running = self.lock_timer()?.machine.is_running();
        if running {
            self.pause()
        } else {
            self.start(None)
        }
    }

    /// Apply a settings update. Invalid updates leave settings untouched.
    pub fn configure(&self, update: &SettingsUpdate) -> Result<Snapshot, StateError> {
        let Some(update) = update.validate() else {
            debug!("Ignoring invalid settings update: {:?}", update);
            return self.snapshot();
        };
        if update.is_empty() {
            return self.snapshot();
        }

        let snapshot = {
            let mut timer = self.lock_timer()?;
            timer.machine.configure(update);
            timer.machine.snapshot()
        };

        info!(
            "Settings updated: focus={}min, break={}min",
            snapshot.settings.focus_minutes, snapshot.settings.break_minutes
        );
        self.broadcaster.publish(snapshot);
        Ok(snapshot)
    }

    /// Clock callback. Ticks from a registration other than the active one
    /// are dropped.
    pub fn tick(&self, clock_id: u64) -> TickOutcome {
        let (outcome, snapshot) = {
            let mut timer = match self.lock_timer() {
                Ok(timer) => timer,
                Err(e) => {
                    error!("Failed to tick: {}", e);
                    return TickOutcome::Stale;
                }
            };
            if timer.clock.as_ref().map(ClockHandle::id) != Some(clock_id) {
                debug!("Dropping tick from stale clock {}", clock_id);
                return TickOutcome::Stale;
            }

            let outcome = timer.machine.tick();
            if outcome.stops_clock() {
                timer.clock = None;
            }
            (outcome, timer.machine.snapshot())
        };

        self.broadcaster.publish(snapshot);

        match outcome {
            TickOutcome::Warning { phase, remaining_seconds } => {
                info!("{} phase ends in {}s", phase, remaining_seconds);
                match self.me.upgrade() {
                    Some(state) => {
                        tokio::spawn(notifications::near_expiry(state, phase));
                    }
                    None => warn!("Application state dropped, skipping near-expiry warning"),
                }
            }
            TickOutcome::Expired { ended } => {
                info!("{} phase complete, switched to {}", ended, snapshot.phase);
                match self.me.upgrade() {
                    Some(state) => {
                        tokio::spawn(notifications::phase_completed(state, ended));
                    }
                    None => warn!("Application state dropped, skipping end-of-phase flow"),
                }
            }
            TickOutcome::Counting { .. } | TickOutcome::Stale => {}
        }

        outcome
    }

    /// Push the current state with an explicit running flag
    pub fn publish(&self, running: bool) {
        let mut snapshot = self.best_effort_snapshot();
        snapshot.running = running;
        self.broadcaster.publish(snapshot);
    }

    /// Run a client command and always answer with a snapshot, falling back
    /// to the best currently known state when the command fails
    pub fn dispatch(&self, command: Command) -> Snapshot {
        let name = command.name();
        debug!("Dispatching {}", name);

        let result = match &command {
            Command::GetState => self.snapshot(),
            Command::StartTimer(options) => self.start(options.forced_phase()),
            Command::PauseTimer => self.pause(),
            Command::ResetTimer => self.reset(),
            Command::UpdateSettings(update) => self.configure(update),
            Command::ToggleTimer => self.toggle(),
        };

        if !matches!(command, Command::GetState) {
            self.record_action(name);
        }

        match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("{} failed: {}", name, e);
                self.best_effort_snapshot()
            }
        }
    }

    // ── Windows ──────────────────────────────────────────────────────

    pub fn tracked_windows(&self) -> TrackedWindows {
        *self.lock_windows()
    }

    /// Track a new end-of-phase window, returning the one it replaces
    pub fn track_end_of_phase_window(&self, id: WindowId) -> Option<WindowId> {
        self.lock_windows().end_of_phase.replace(id)
    }

    pub fn track_status_window(&self, id: WindowId) -> Option<WindowId> {
        self.lock_windows().status.replace(id)
    }

    /// Forget a window the platform reported closed
    pub fn on_window_removed(&self, id: WindowId) {
        if self.lock_windows().forget(id) {
            debug!("Tracked window {} closed", id);
        }
    }

    /// Open or close the status window
    pub async fn toggle_status_window(&self) -> Result<bool, crate::error::PlatformError> {
        windows::toggle_status_window(self).await
    }

    // ── Notifications ────────────────────────────────────────────────

    fn lock_warning(&self) -> MutexGuard<'_, Option<(Phase, NotificationId)>> {
        self.warning.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remember the near-expiry notification for `phase`, returning the one
    /// it replaces
    pub fn track_warning(&self, phase: Phase, id: NotificationId) -> Option<NotificationId> {
        self.lock_warning().replace((phase, id)).map(|(_, previous)| previous)
    }

    /// Hand out the outstanding warning for `phase`, if any
    pub fn take_warning(&self, phase: Phase) -> Option<NotificationId> {
        let mut warning = self.lock_warning();
        if warning.as_ref().is_some_and(|(warned, _)| *warned == phase) {
            warning.take().map(|(_, id)| id)
        } else {
            None
        }
    }

    /// Stop tracking a warning that was answered or cleared
    pub fn forget_warning(&self, id: &NotificationId) {
        let mut warning = self.lock_warning();
        if warning.as_ref().is_some_and(|(_, tracked)| tracked == id) {
            *warning = None;
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Cancel the clock and close tracked windows best-effort
    pub async fn shutdown(&self) {
        {
            let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
            timer.clock = None;
            timer.machine.pause();
        }
        info!("Clock cancelled");
        self.publish(false);

        let warning = self.lock_warning().take();
        if let Some((_, id)) = warning {
            if let Err(e) = self.platform.clear_notification(&id).await {
                debug!("Failed to clear warning {} on shutdown: {}", id, e);
            }
        }

        let tracked = std::mem::take(&mut *self.lock_windows());
        for id in [tracked.status, tracked.end_of_phase].into_iter().flatten() {
            if let Err(e) = self.platform.remove_window(id).await {
                debug!("Failed to close window {} on shutdown: {}", id, e);
            }
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(LastAction {
                action: action.to_string(),
                at: Utc::now(),
            });
        }
    }

    pub fn last_action(&self) -> Option<LastAction> {
        self.last_action.lock().ok().and_then(|action| action.clone())
    }

    /// Calculate server uptime as a formatted string
    pub fn uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::headless::HeadlessPlatform;

    fn state(focus: u64, rest: u64) -> Arc<AppState> {
        AppState::new(
            Settings::from_seconds(focus, rest),
            Arc::new(HeadlessPlatform::default()),
            RuntimeOptions::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn get_state_before_start_reports_idle_focus() {
        let state = state(1500, 300);
        let snapshot = state.dispatch(Command::GetState);
        assert_eq!(snapshot.remaining_seconds, 1500);
        assert_eq!(snapshot.phase, Phase::Focus);
        assert!(!snapshot.running);
        assert!(state.last_action().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn clock_registration_follows_running_flag() {
        let state = state(60, 30);
        assert_eq!(state.active_clocks(), 0);

        state.start(None).unwrap();
        assert_eq!(state.active_clocks(), 1);
        state.start(None).unwrap();
        assert_eq!(state.active_clocks(), 1);
        state.pause().unwrap();
        assert_eq!(state.active_clocks(), 0);
        state.start(None).unwrap();
        state.reset().unwrap();
        assert_eq!(state.active_clocks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_from_replaced_clock_are_dropped() {
        let state = state(60, 30);
        state.start(None).unwrap();
        state.start(None).unwrap();

        // The first registration had id 1
        assert_eq!(state.tick(1), TickOutcome::Stale);
        assert_eq!(state.snapshot().unwrap().remaining_seconds, 60);
        assert_eq!(state.tick(2), TickOutcome::Counting { remaining_seconds: 59 });
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_settings_leave_state_alone() {
        let state = state(1500, 300);
        let before = state.settings().unwrap();
        let snapshot = state.dispatch(Command::UpdateSettings(SettingsUpdate::new(Some(60), None)));
        assert_eq!(state.settings().unwrap(), before);
        assert_eq!(snapshot.remaining_seconds, 1500);
        assert_eq!(state.last_action().unwrap().action, "UPDATE_SETTINGS");
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_flips_running() {
        let state = state(60, 30);
        assert!(state.dispatch(Command::ToggleTimer).running);
        assert!(!state.dispatch(Command::ToggleTimer).running);
        assert_eq!(state.active_clocks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_clock() {
        let state = state(60, 30);
        state.start(None).unwrap();
        state.shutdown().await;
        assert_eq!(state.active_clocks(), 0);
    }
}
