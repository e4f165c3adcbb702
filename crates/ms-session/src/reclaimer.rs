//! Engine teardown and rebuild lifecycle

use crate::snapshot::SessionSnapshot;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// An engine is attached and the session state is authoritative
    Live,
    /// The engine was discarded; the snapshot is the only copy of the state
    Suspended,
    /// A new engine is loading the captured style
    Reloading,
}

/// Tracks the lifecycle and holds the snapshot while suspended
#[derive(Debug)]
pub struct SessionStateReclaimer {
    state: Lifecycle,
    snapshot: Option<SessionSnapshot>,
}

impl Default for SessionStateReclaimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateReclaimer {
    pub fn new() -> Self {
        Self {
            state: Lifecycle::Live,
            snapshot: None,
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Memory pressure only tears down a live session that is off-screen
    pub fn should_suspend(&self, visible: bool) -> bool {
        self.state == Lifecycle::Live && !visible
    }

    pub fn suspend(&mut self, snapshot: SessionSnapshot) {
        self.snapshot = Some(snapshot);
        self.state = Lifecycle::Suspended;
    }

    /// Hand out the snapshot for a rebuild, if suspended
    pub fn begin_reload(&mut self) -> Option<SessionSnapshot> {
        if self.state != Lifecycle::Suspended {
            return None;
        }
        self.state = Lifecycle::Reloading;
        self.snapshot.take()
    }

    pub fn finish(&mut self) {
        self.state = Lifecycle::Live;
    }

    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationState;
    use crate::snapshot::SessionReplay;
    use ms_core::{CameraPose, StyleId};

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot::new(SessionReplay {
            camera: CameraPose::default(),
            style: Some(StyleId::Zinc),
            markers: Vec::new(),
            annotations: Vec::new(),
            route: None,
            location: LocationState {
                enabled: false,
                last_location: None,
            },
        })
    }

    #[test]
    fn test_suspend_only_when_hidden() {
        let reclaimer = SessionStateReclaimer::new();
        assert!(!reclaimer.should_suspend(true));
        assert!(reclaimer.should_suspend(false));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut reclaimer = SessionStateReclaimer::new();
        assert!(reclaimer.begin_reload().is_none());

        reclaimer.suspend(snapshot());
        assert_eq!(reclaimer.state(), Lifecycle::Suspended);
        assert!(!reclaimer.should_suspend(false));
        assert_eq!(reclaimer.snapshot().and_then(|s| s.style()), Some(StyleId::Zinc));

        let taken = reclaimer.begin_reload().unwrap();
        assert_eq!(taken.style(), Some(StyleId::Zinc));
        assert_eq!(reclaimer.state(), Lifecycle::Reloading);
        assert!(reclaimer.begin_reload().is_none());

        reclaimer.finish();
        assert_eq!(reclaimer.state(), Lifecycle::Live);
    }
}
