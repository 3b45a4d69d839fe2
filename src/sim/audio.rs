use std::{cell::Cell, rc::Rc};

use crate::{
    foundation::error::{ComposeError, ComposeResult},
    media::traits::{AudioBackend, AudioContext, AudioStream, AudioTap, BranchId},
    sim::log::{EventLog, SimEvent},
};

/// Audio backend that counts open contexts, so tests can assert nothing leaked.
#[derive(Clone, Debug, Default)]
pub struct CountingAudioBackend {
    open: Rc<Cell<usize>>,
    created: Rc<Cell<usize>>,
    fail_create: bool,
    fail_tap: Option<String>,
    log: EventLog,
}

impl CountingAudioBackend {
    /// A backend that never fails.
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Every `create_context` call fails.
    pub fn failing(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Connecting this tap fails.
    pub fn failing_tap(mut self, tap: impl Into<String>) -> Self {
        self.fail_tap = Some(tap.into());
        self
    }

    /// Contexts created and not yet closed.
    pub fn open_contexts(&self) -> usize {
        self.open.get()
    }

    /// Contexts created so far.
    pub fn contexts_created(&self) -> usize {
        self.created.get()
    }
}

impl AudioBackend for CountingAudioBackend {
    fn create_context(&self) -> ComposeResult<Box<dyn AudioContext>> {
        if self.fail_create {
            return Err(ComposeError::setup("audio context limit reached"));
        }
        self.open.set(self.open.get() + 1);
        self.created.set(self.created.get() + 1);
        self.log.push(SimEvent::ContextCreated);
        Ok(Box::new(CountingContext {
            id: self.created.get(),
            open: Rc::clone(&self.open),
            closed: false,
            branches: Vec::new(),
            fail_tap: self.fail_tap.clone(),
            log: self.log.clone(),
        }))
    }
}

#[derive(Debug)]
struct CountingContext {
    id: usize,
    open: Rc<Cell<usize>>,
    closed: bool,
    branches: Vec<AudioTap>,
    fail_tap: Option<String>,
    log: EventLog,
}

impl AudioContext for CountingContext {
    fn connect(&mut self, tap: &AudioTap) -> ComposeResult<BranchId> {
        if self.closed {
            return Err(ComposeError::recording("audio context is closed"));
        }
        if self.fail_tap.as_deref() == Some(tap.0.as_str()) {
            return Err(ComposeError::recording(format!("cannot connect '{}'", tap.0)));
        }
        self.branches.push(tap.clone());
        Ok(BranchId(self.branches.len() - 1))
    }

    fn set_gain(&mut self, branch: BranchId, gain: f32) -> ComposeResult<()> {
        let tap = self
            .branches
            .get(branch.0)
            .ok_or_else(|| ComposeError::recording(format!("unknown branch {}", branch.0)))?;
        self.log.push(SimEvent::Gain {
            tap: tap.0.clone(),
            gain,
        });
        Ok(())
    }

    fn destination(&self) -> AudioStream {
        AudioStream {
            label: format!("mix-{}", self.id),
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.open.set(self.open.get().saturating_sub(1));
            self.log.push(SimEvent::ContextClosed);
        }
    }
}
