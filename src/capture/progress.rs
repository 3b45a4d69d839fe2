use crate::{
    capture::session::CaptureState,
    model::job::{JobId, JobStatus},
};

/// Side-channel notifications for UIs and logs. Never affects session outcomes.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The batch handed a job to the capture controller.
    JobStarted {
        /// Job being started.
        job_id: JobId,
        /// Position in the batch queue.
        index: usize,
        /// Queue length.
        total: usize,
    },
    /// The capture session entered a new state.
    State {
        /// Job the session belongs to.
        job_id: JobId,
        /// State just entered.
        state: CaptureState,
    },
    /// One recorded frame.
    Tick {
        /// Job being recorded.
        job_id: JobId,
        /// Seconds recorded so far, clamped to `[0, total_secs]`.
        current_secs: f64,
        /// Duration of the recorded range.
        total_secs: f64,
    },
    /// A job left the controller, successfully or not.
    JobFinished {
        /// Job that finished.
        job_id: JobId,
        /// Status after the run.
        status: JobStatus,
        /// Failure reason when `status` is `error`.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ProgressEvent {
    /// Job the event is about.
    pub fn job_id(&self) -> &JobId {
        match self {
            ProgressEvent::JobStarted { job_id, .. }
            | ProgressEvent::State { job_id, .. }
            | ProgressEvent::Tick { job_id, .. }
            | ProgressEvent::JobFinished { job_id, .. } => job_id,
        }
    }
}

/// Receiver of [`ProgressEvent`]s.
pub trait ProgressSink {
    /// Must not block; called from inside the recording loop.
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Logs events through `tracing`; ticks go to `trace`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::Tick {
                job_id,
                current_secs,
                total_secs,
            } => {
                tracing::trace!(%job_id, current_secs, total_secs, "recording");
            }
            ProgressEvent::State { job_id, state } => {
                tracing::debug!(%job_id, state = state.as_str(), "capture state");
            }
            ProgressEvent::JobStarted {
                job_id,
                index,
                total,
            } => {
                tracing::info!(%job_id, index, total, "job started");
            }
            ProgressEvent::JobFinished {
                job_id,
                status,
                reason,
            } => {
                tracing::info!(
                    %job_id,
                    status = status.as_str(),
                    reason = reason.as_deref(),
                    "job finished"
                );
            }
        }
    }
}

/// Forwards events to a channel; a closed receiver is ignored.
impl ProgressSink for tokio::sync::mpsc::UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.send(event);
    }
}
