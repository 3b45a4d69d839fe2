use crate::{
    capture::{
        cancel::CancelToken,
        progress::{ProgressEvent, ProgressSink},
        session::CaptureController,
    },
    media::traits::ArtifactSink,
    model::job::{CompositionJob, JobStatus},
};

/// Tally of one batch run. A batch itself never fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchSummary {
    /// Jobs handed to the capture controller.
    pub visited: usize,
    /// Jobs that reached `done` in this run.
    pub done: usize,
    /// Jobs that ended in `error`, cancelled ones included.
    pub failed: usize,
    /// Jobs already `done` before the run.
    pub skipped: usize,
    /// The run stopped early on cancellation.
    pub cancelled: bool,
}

/// Runs jobs one at a time, in list order, delivering each artifact as soon as it exists.
pub struct BatchOrchestrator<'a> {
    controller: &'a CaptureController<'a>,
    sink: &'a dyn ArtifactSink,
}

impl<'a> BatchOrchestrator<'a> {
    /// Run jobs through `controller` and hand finished artifacts to `sink`.
    pub fn new(controller: &'a CaptureController<'a>, sink: &'a dyn ArtifactSink) -> Self {
        Self { controller, sink }
    }

    /// Process every job that is not already `done`.
    ///
    /// A failing job is marked `error` and the batch moves on. Cancellation fails the active
    /// job as cancelled and leaves the rest of the queue as it was.
    #[tracing::instrument(skip_all, fields(jobs = jobs.len()))]
    pub async fn run_all(
        &self,
        jobs: &mut [CompositionJob],
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
    ) -> BatchSummary {
        let total = jobs.len();
        let mut summary = BatchSummary::default();

        for (index, job) in jobs.iter_mut().enumerate() {
            if job.status == JobStatus::Done {
                tracing::debug!(job_id = %job.id, "already done, skipping");
                summary.skipped += 1;
                continue;
            }
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            summary.visited += 1;
            progress.emit(ProgressEvent::JobStarted {
                job_id: job.id.clone(),
                index,
                total,
            });

            match self.controller.run(job, cancel, progress).await {
                Ok(_) => {
                    summary.done += 1;
                    if let Some(artifact) = &job.artifact
                        && let Err(e) = self.sink.deliver(job, artifact).await
                    {
                        tracing::warn!(job_id = %job.id, error = %e, "artifact delivery failed");
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    if e.is_cancelled() {
                        summary.cancelled = true;
                    }
                }
            }

            progress.emit(ProgressEvent::JobFinished {
                job_id: job.id.clone(),
                status: job.status,
                reason: job.failure.as_ref().map(|f| f.reason.clone()),
            });
            if summary.cancelled {
                break;
            }
        }

        tracing::info!(
            visited = summary.visited,
            done = summary.done,
            failed = summary.failed,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "batch finished"
        );
        summary
    }
}
