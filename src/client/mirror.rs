//! Client-side copy of the timer state

use crate::{
    services::PushEvent,
    state::{Phase, Snapshot},
};

/// What a surface should do after applying a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorUpdate {
    /// The displayed state changed
    Changed,
    /// Nothing to redraw
    Unchanged,
    /// A phase ended and its sound should be played
    PlaySound(Phase),
}

/// The snapshot a UI surface currently displays.
///
/// Pushes and command responses always replace it. Polled snapshots only
/// replace it when they report a running timer or differ from the held one,
/// so a slow poll answer cannot freeze a countdown that pushes keep moving.
#[derive(Debug, Clone, Default)]
pub struct StateMirror {
    current: Option<Snapshot>,
}

impl StateMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn apply_push(&mut self, event: &PushEvent) -> MirrorUpdate {
        match event {
            PushEvent::TimeUpdate(snapshot) => self.replace(*snapshot),
            PushEvent::PlaySound { sound_type } => MirrorUpdate::PlaySound(*sound_type),
        }
    }

    pub fn apply_response(&mut self, snapshot: Snapshot) -> MirrorUpdate {
        self.replace(snapshot)
    }

    pub fn apply_poll(&mut self, snapshot: Snapshot) -> MirrorUpdate {
        let accept = match &self.current {
            Some(current) => snapshot.running || snapshot.differs_from(current),
            None => true,
        };
        if accept {
            self.replace(snapshot)
        } else {
            MirrorUpdate::Unchanged
        }
    }

    fn replace(&mut self, snapshot: Snapshot) -> MirrorUpdate {
        let previous = self.current.replace(snapshot);
        if previous == Some(snapshot) {
            MirrorUpdate::Unchanged
        } else {
            MirrorUpdate::Changed
        }
    }
}
