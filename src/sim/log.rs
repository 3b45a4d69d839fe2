use std::{cell::RefCell, rc::Rc};

/// Observable side effect of a simulated collaborator.
#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    /// A media element was opened.
    Opened(String),
    /// A seek completed.
    Seeked {
        /// Element source.
        source: String,
        /// Landed position.
        t: f64,
    },
    /// Playback started.
    Played(String),
    /// Playback paused.
    Paused(String),
    /// An audio context was created.
    ContextCreated,
    /// An audio context was closed.
    ContextClosed,
    /// A branch gain was set.
    Gain {
        /// Tap of the branch.
        tap: String,
        /// New gain.
        gain: f32,
    },
    /// A recorder was created.
    RecorderCreated,
    /// A recorder started.
    RecorderStarted,
    /// A recorder finalized its artifact.
    RecorderStopped {
        /// Artifact size.
        bytes: usize,
    },
    /// A recorder was aborted.
    RecorderAborted,
    /// An artifact was delivered for this job id.
    Delivered(String),
}

/// Shared, ordered record of [`SimEvent`]s.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<SimEvent>>>,
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event.
    pub fn push(&self, event: SimEvent) {
        self.events.borrow_mut().push(event);
    }

    /// Snapshot of every event so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.events.borrow().clone()
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    /// Index of the first event matching `pred`.
    pub fn position(&self, pred: impl Fn(&SimEvent) -> bool) -> Option<usize> {
        self.events.borrow().iter().position(pred)
    }

    /// Forget everything recorded.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
