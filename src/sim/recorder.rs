use std::{cell::Cell, rc::Rc, time::Duration};

use crate::{
    foundation::error::{ComposeError, ComposeResult},
    media::traits::{CaptureStream, Recorder, RecorderFactory},
    model::job::Artifact,
    sim::log::{EventLog, SimEvent},
};

/// Mime type of the artifacts a [`MemoryRecorder`] produces.
pub const NDJSON_MIME: &str = "application/x-ndjson";

/// Creates [`MemoryRecorder`]s; can be told to fail at a given point.
#[derive(Clone, Debug, Default)]
pub struct MemoryRecorderFactory {
    live: Rc<Cell<usize>>,
    fail_start: bool,
    fail_after_chunks: Option<u64>,
    finalize_latency: Duration,
    log: EventLog,
}

impl MemoryRecorderFactory {
    /// Recorders that succeed and finalize after 20 ms.
    pub fn new(log: EventLog) -> Self {
        Self {
            finalize_latency: Duration::from_millis(20),
            log,
            ..Self::default()
        }
    }

    /// `start` fails on every recorder.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// `write_chunk` fails once this many chunks were accepted.
    pub fn failing_after(mut self, chunks: u64) -> Self {
        self.fail_after_chunks = Some(chunks);
        self
    }

    /// Recorders created and neither stopped nor aborted.
    pub fn live(&self) -> usize {
        self.live.get()
    }
}

impl RecorderFactory for MemoryRecorderFactory {
    fn create(&self, stream: CaptureStream) -> ComposeResult<Box<dyn Recorder>> {
        self.live.set(self.live.get() + 1);
        self.log.push(SimEvent::RecorderCreated);
        Ok(Box::new(MemoryRecorder {
            stream,
            state: RecState::Created,
            chunks: Vec::new(),
            fail_start: self.fail_start,
            fail_after_chunks: self.fail_after_chunks,
            finalize_latency: self.finalize_latency,
            live: Rc::clone(&self.live),
            log: self.log.clone(),
        }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RecState {
    Created,
    Active,
    Released,
}

/// Keeps every chunk in memory; `stop` concatenates them into the artifact.
#[derive(Debug)]
pub struct MemoryRecorder {
    stream: CaptureStream,
    state: RecState,
    chunks: Vec<Vec<u8>>,
    fail_start: bool,
    fail_after_chunks: Option<u64>,
    finalize_latency: Duration,
    live: Rc<Cell<usize>>,
    log: EventLog,
}

impl MemoryRecorder {
    fn release(&mut self) {
        if self.state != RecState::Released {
            self.state = RecState::Released;
            self.live.set(self.live.get().saturating_sub(1));
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Recorder for MemoryRecorder {
    fn start(&mut self) -> ComposeResult<()> {
        if self.fail_start {
            return Err(ComposeError::setup("recorder refused to start"));
        }
        if self.state != RecState::Created {
            return Err(ComposeError::recording("recorder already started"));
        }
        self.state = RecState::Active;
        self.log.push(SimEvent::RecorderStarted);
        Ok(())
    }

    fn write_chunk(&mut self, chunk: Vec<u8>) -> ComposeResult<()> {
        if self.state != RecState::Active {
            return Err(ComposeError::recording("recorder is not active"));
        }
        if let Some(limit) = self.fail_after_chunks
            && self.chunks.len() as u64 >= limit
        {
            return Err(ComposeError::recording("encoder ran out of memory"));
        }
        self.chunks.push(chunk);
        Ok(())
    }

    async fn stop(&mut self) -> ComposeResult<Artifact> {
        if self.state != RecState::Active {
            return Err(ComposeError::recording("recorder is not active"));
        }
        tokio::time::sleep(self.finalize_latency).await;
        let frames = self.chunks.len() as u64;
        let bytes: Vec<u8> = self.chunks.drain(..).flatten().collect();
        self.release();
        self.log.push(SimEvent::RecorderStopped { bytes: bytes.len() });
        Ok(Artifact {
            mime: NDJSON_MIME.to_string(),
            bytes,
            frames,
            duration_secs: frames as f64 / f64::from(self.stream.fps.max(1)),
        })
    }

    fn abort(&mut self) {
        self.chunks.clear();
        if self.state != RecState::Released {
            self.release();
            self.log.push(SimEvent::RecorderAborted);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sim/recorder.rs"]
mod tests;
