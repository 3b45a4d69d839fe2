use std::fmt;

use tokio::{
    sync::Semaphore,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    audio::graph::{MixGraph, MixInput},
    capture::{
        cancel::CancelToken,
        progress::{ProgressEvent, ProgressSink},
    },
    config::pipeline::PipelineConfig,
    foundation::{
        core::TimeRange,
        error::{ComposeError, ComposeResult},
    },
    layout::resolver::{MediaDimensions, ResolvedLayout, resolve_layout},
    media::traits::{
        AudioBackend, CaptureStream, MediaElement, MediaProvider, Recorder, RecorderFactory,
    },
    model::{
        job::{Artifact, CompositionJob, JobFailure, JobId, JobStatus},
        layers::AudioLayer,
    },
    render::{
        frame::{FrameContext, render_frame},
        surface::{CaptureSurface, SurfaceFactory},
    },
};

/// Capture session states, in the order a successful session visits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// Nothing acquired yet.
    Idle,
    /// Waiting for the source to land on the in-point.
    Seeking,
    /// Recorder running, frames being painted.
    Recording,
    /// Playback paused, waiting for the recorder to finish.
    Finalizing,
    /// Artifact stored on the job.
    Done,
    /// Failure recorded on the job.
    Error,
}

impl CaptureState {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Seeking => "seeking",
            CaptureState::Recording => "recording",
            CaptureState::Finalizing => "finalizing",
            CaptureState::Done => "done",
            CaptureState::Error => "error",
        }
    }

    /// `done` or `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Done | CaptureState::Error)
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the recording loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Playback reached the out-point.
    RangeEnd,
    /// The media ended before the out-point.
    NaturalEnd,
    /// Playback paused without being asked to.
    Paused,
}

/// Outcome of one successful capture session. The artifact itself is stored on the job.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SessionReport {
    /// Job that was recorded.
    pub job_id: JobId,
    /// Range actually recorded, after clipping to the media duration.
    pub range: TimeRange,
    /// Condition that ended the recording loop.
    pub stop_reason: StopReason,
    /// Frames written to the recorder.
    pub frames: u64,
    /// Loop iterations, including the one that observed the stop.
    pub ticks: u64,
    /// Source playback time of every recorded frame.
    pub frame_times: Vec<f64>,
    /// Every state the session entered, in order.
    pub states: Vec<CaptureState>,
    /// Size of the finalized artifact.
    pub artifact_bytes: usize,
}

/// Aborts the recorder unless it was stopped cleanly.
struct RecorderGuard {
    inner: Option<Box<dyn Recorder>>,
}

impl RecorderGuard {
    fn get(&mut self) -> ComposeResult<&mut Box<dyn Recorder>> {
        self.inner
            .as_mut()
            .ok_or_else(|| ComposeError::recording("recorder already released"))
    }

    async fn finish(&mut self) -> ComposeResult<Artifact> {
        let artifact = self.get()?.stop().await?;
        self.inner = None;
        Ok(artifact)
    }
}

impl Drop for RecorderGuard {
    fn drop(&mut self) {
        if let Some(mut rec) = self.inner.take() {
            rec.abort();
            tracing::debug!("recorder aborted");
        }
    }
}

/// Pauses playback of every element it holds when dropped.
struct Playback {
    video: Box<dyn MediaElement>,
    music: Vec<Box<dyn MediaElement>>,
}

impl Playback {
    fn pause_all(&mut self) {
        if !self.video.is_paused() {
            self.video.pause();
        }
        for m in &mut self.music {
            if !m.is_paused() {
                m.pause();
            }
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.pause_all();
    }
}

struct Recorded {
    artifact: Artifact,
    stop_reason: StopReason,
    frames: u64,
    ticks: u64,
    frame_times: Vec<f64>,
    range: TimeRange,
}

/// Drives one job from seek to finalized artifact.
///
/// Owns the lifecycle of everything a session acquires: the decode sources, the audio mix
/// graph and the recorder. Whatever way a session ends, those are released before
/// [`run`](Self::run) returns. Only one session runs per controller at a time.
pub struct CaptureController<'a> {
    media: &'a dyn MediaProvider,
    audio: &'a dyn AudioBackend,
    recorders: &'a dyn RecorderFactory,
    surfaces: &'a dyn SurfaceFactory,
    config: PipelineConfig,
    gate: Semaphore,
}

impl<'a> CaptureController<'a> {
    /// Build a controller over the given collaborators.
    pub fn new(
        media: &'a dyn MediaProvider,
        audio: &'a dyn AudioBackend,
        recorders: &'a dyn RecorderFactory,
        surfaces: &'a dyn SurfaceFactory,
        config: PipelineConfig,
    ) -> Self {
        Self {
            media,
            audio,
            recorders,
            surfaces,
            config,
            gate: Semaphore::new(1),
        }
    }

    /// Configuration every session of this controller runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Record `job` and move it to `done` or `error`.
    ///
    /// Every failure is also recorded on the job as a [`JobFailure`]. A second session started
    /// while one is active fails with [`ComposeError::Setup`] and leaves its job untouched.
    #[tracing::instrument(skip_all, fields(job_id = %job.id))]
    pub async fn run(
        &self,
        job: &mut CompositionJob,
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
    ) -> ComposeResult<SessionReport> {
        let _permit = self
            .gate
            .try_acquire()
            .map_err(|_| ComposeError::setup("another capture session is already active"))?;
        if let Err(err) = job.begin_processing() {
            // A job left in `processing` by an interrupted run is failed so it can be retried.
            if job.status == JobStatus::Processing {
                tracing::warn!(error = %err, "job was already processing, marking it failed");
                job.fail(JobFailure::from(&err))?;
            }
            return Err(err);
        }

        let mut states = vec![CaptureState::Idle];
        let result = self.session(job, cancel, progress, &mut states).await;
        match result {
            Ok(rec) => {
                states.push(CaptureState::Done);
                progress.emit(ProgressEvent::State {
                    job_id: job.id.clone(),
                    state: CaptureState::Done,
                });
                let report = SessionReport {
                    job_id: job.id.clone(),
                    range: rec.range,
                    stop_reason: rec.stop_reason,
                    frames: rec.frames,
                    ticks: rec.ticks,
                    frame_times: rec.frame_times,
                    states,
                    artifact_bytes: rec.artifact.bytes.len(),
                };
                tracing::info!(
                    frames = report.frames,
                    stop = ?report.stop_reason,
                    bytes = report.artifact_bytes,
                    "capture finished"
                );
                job.complete(rec.artifact)?;
                Ok(report)
            }
            Err(err) => {
                progress.emit(ProgressEvent::State {
                    job_id: job.id.clone(),
                    state: CaptureState::Error,
                });
                if err.is_cancelled() {
                    tracing::warn!(error = %err, "capture cancelled");
                } else {
                    tracing::error!(error = %err, "capture failed");
                }
                job.fail(JobFailure::from(&err))?;
                Err(err)
            }
        }
    }

    async fn session(
        &self,
        job: &CompositionJob,
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
        states: &mut Vec<CaptureState>,
    ) -> ComposeResult<Recorded> {
        let enter = |states: &mut Vec<CaptureState>, state: CaptureState| {
            states.push(state);
            progress.emit(ProgressEvent::State {
                job_id: job.id.clone(),
                state,
            });
        };
        if cancel.is_cancelled() {
            return Err(ComposeError::cancelled("cancelled before start"));
        }

        let video = self
            .media
            .open_video(&job.source)
            .await
            .map_err(|e| ComposeError::setup(format!("open source '{}': {e}", job.source)))?;
        let range = job.time_range.validate()?.clip_to(video.duration())?;
        if range.end < job.time_range.end {
            tracing::debug!(
                requested = job.time_range.end,
                clipped = range.end,
                "range end clipped to media duration"
            );
        }

        let mut dims = MediaDimensions {
            video: video.natural_size(),
            ..MediaDimensions::default()
        };
        for layer in &job.layout.layers {
            for (source, required) in layer.image_assets() {
                match self.media.image_size(source).await {
                    Ok(size) => {
                        dims.images.insert(source.clone(), size);
                    }
                    Err(e) if required => {
                        return Err(ComposeError::setup(format!(
                            "required image '{source}': {e}"
                        )));
                    }
                    Err(e) => {
                        tracing::warn!(%source, error = %e, "optional image unavailable");
                    }
                }
            }
        }

        let mut surface = self.surfaces.create(job.output)?;
        let layout = resolve_layout(&job.layout, &dims, job.output, &self.config, &*surface)?;

        let (mut playback, inputs) = self.open_audio(job, video).await;
        let mut graph = MixGraph::build(self.audio, &inputs)
            .map_err(|e| ComposeError::setup(format!("audio graph: {e}")))?;

        enter(states, CaptureState::Seeking);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ComposeError::cancelled("cancelled while seeking")),
            r = playback.video.seek(range.start) => {
                r.map_err(|e| ComposeError::setup(format!("seek to {:.3}s: {e}", range.start)))?
            }
        }
        for m in &mut playback.music {
            if let Err(e) = m.seek(0.0).await {
                tracing::warn!(source = %m.source(), error = %e, "music seek failed");
            }
        }

        let recorder = self
            .recorders
            .create(CaptureStream {
                size: job.output,
                fps: self.config.fps,
                audio: Some(graph.output().clone()),
            })
            .map_err(|e| ComposeError::setup(format!("create recorder: {e}")))?;
        let mut recorder = RecorderGuard {
            inner: Some(recorder),
        };
        recorder
            .get()?
            .start()
            .map_err(|e| ComposeError::setup(format!("start recorder: {e}")))?;

        enter(states, CaptureState::Recording);
        playback
            .video
            .play()
            .await
            .map_err(|e| ComposeError::recording(format!("start playback: {e}")))?;
        for m in &mut playback.music {
            if let Err(e) = m.play().await {
                tracing::warn!(source = %m.source(), error = %e, "music playback failed");
            }
        }

        let looped = self
            .record_loop(
                job,
                range,
                &layout,
                &mut *surface,
                &mut playback,
                &mut recorder,
                cancel,
                progress,
            )
            .await?;

        playback.pause_all();
        enter(states, CaptureState::Finalizing);
        let artifact = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ComposeError::cancelled("cancelled while finalizing"));
            }
            a = recorder.finish() => {
                a.map_err(|e| ComposeError::recording(format!("finalize recorder: {e}")))?
            }
        };
        graph.teardown();

        Ok(Recorded {
            artifact,
            stop_reason: looped.stop_reason,
            frames: looped.frames,
            ticks: looped.ticks,
            frame_times: looped.frame_times,
            range,
        })
    }

    /// Collect the audio inputs. A music track that fails to open is dropped with a warning;
    /// one that fails to connect is dropped by [`MixGraph::build`].
    async fn open_audio(
        &self,
        job: &CompositionJob,
        video: Box<dyn MediaElement>,
    ) -> (Playback, Vec<MixInput>) {
        let mut inputs = Vec::new();
        let mut music = Vec::new();
        for layer in &job.audio_layers {
            match layer {
                AudioLayer::SourceAudio { muted } => match video.audio_tap() {
                    Some(tap) => inputs.push(MixInput {
                        tap,
                        muted: *muted,
                        required: true,
                    }),
                    None => tracing::debug!(source = %job.source, "source has no audio track"),
                },
                AudioLayer::Music { source, muted } => {
                    match self.media.open_audio(source).await {
                        Ok(el) => {
                            if let Some(tap) = el.audio_tap() {
                                inputs.push(MixInput {
                                    tap,
                                    muted: *muted,
                                    required: false,
                                });
                            }
                            music.push(el);
                        }
                        Err(e) => {
                            tracing::warn!(
                                %source,
                                error = %e,
                                "music unavailable, continuing without it"
                            );
                        }
                    }
                }
            }
        }
        (Playback { video, music }, inputs)
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_loop(
        &self,
        job: &CompositionJob,
        range: TimeRange,
        layout: &ResolvedLayout,
        surface: &mut dyn CaptureSurface,
        playback: &mut Playback,
        recorder: &mut RecorderGuard,
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
    ) -> ComposeResult<LoopOutcome> {
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let started = Instant::now();
        let budget = self.config.watchdog.budget_for(range.duration());
        // A deadline past the clock's range means no deadline.
        let deadline = budget.and_then(|b| started.checked_add(b));
        let watchdog = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(watchdog);

        let mut out = LoopOutcome {
            stop_reason: StopReason::RangeEnd,
            frames: 0,
            ticks: 0,
            frame_times: Vec::new(),
        };
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ComposeError::cancelled("cancelled while recording"));
                }
                _ = &mut watchdog => {
                    return Err(ComposeError::recording(format!(
                        "watchdog: session exceeded {:.1}s without reaching {:.3}s (playhead {:.3}s)",
                        budget.map(|b| b.as_secs_f64()).unwrap_or_default(),
                        range.end,
                        playback.video.current_time(),
                    )));
                }
                _ = ticker.tick() => {}
            }
            out.ticks += 1;

            let video = &playback.video;
            let t = video.current_time();
            let stop = if t >= range.end {
                Some(StopReason::RangeEnd)
            } else if video.is_ended() {
                Some(StopReason::NaturalEnd)
            } else if video.is_paused() {
                Some(StopReason::Paused)
            } else {
                None
            };
            if let Some(reason) = stop {
                tracing::debug!(t, ?reason, ticks = out.ticks, "recording stopped");
                out.stop_reason = reason;
                return Ok(out);
            }

            surface.begin_frame();
            render_frame(
                surface,
                layout,
                &job.source,
                &FrameContext {
                    video_time: t,
                    range,
                    wall_time: started.elapsed().as_secs_f64(),
                    video_ready: video.frame_ready(),
                },
            );
            let chunk = surface
                .capture()
                .map_err(|e| ComposeError::recording(format!("capture frame: {e}")))?;
            recorder
                .get()?
                .write_chunk(chunk)
                .map_err(|e| ComposeError::recording(format!("write chunk: {e}")))?;
            out.frames += 1;
            out.frame_times.push(t);

            progress.emit(ProgressEvent::Tick {
                job_id: job.id.clone(),
                current_secs: (t - range.start).clamp(0.0, range.duration()),
                total_secs: range.duration(),
            });
        }
    }
}

struct LoopOutcome {
    stop_reason: StopReason,
    frames: u64,
    ticks: u64,
    frame_times: Vec<f64>,
}

#[cfg(test)]
#[path = "../../tests/unit/capture/session.rs"]
mod tests;
