use std::fmt;

use crate::{
    foundation::{
        core::{Dimensions, TimeRange},
        error::{ComposeError, ComposeResult},
    },
    model::layers::{AudioLayer, LayoutConfig, MediaRef},
};

/// Identifier unique within a batch.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Wrap an id string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Not run yet.
    #[default]
    Idle,
    /// A capture session owns the job.
    Processing,
    /// Artifact produced.
    Done,
    /// Last run failed; see [`CompositionJob::failure`].
    Error,
}

impl JobStatus {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// `done` or `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse failure category shown to users.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Failed before recording started.
    Setup,
    /// Failed while recording or finalizing.
    Recording,
    /// Aborted on request.
    Cancelled,
}

/// Why a job ended in [`JobStatus::Error`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobFailure {
    /// Category.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub reason: String,
}

impl JobFailure {
    /// The job was cancelled rather than broken.
    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

impl From<&ComposeError> for JobFailure {
    fn from(err: &ComposeError) -> Self {
        let kind = match err {
            ComposeError::Cancelled(_) => FailureKind::Cancelled,
            ComposeError::Recording(_) => FailureKind::Recording,
            ComposeError::Validation(_)
            | ComposeError::Setup(_)
            | ComposeError::Asset(_)
            | ComposeError::Serde(_)
            | ComposeError::Other(_) => FailureKind::Setup,
        };
        Self {
            kind,
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Encoded output of one finished capture session.
#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    /// Container type of `bytes`.
    pub mime: String,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// Frames written.
    pub frames: u64,
    /// Frames divided by the capture rate.
    pub duration_secs: f64,
}

impl Artifact {
    /// File extension matching `mime`, used by file-based delivery.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "video/webm" => "webm",
            "video/mp4" => "mp4",
            "application/x-ndjson" => "ndjson",
            _ => "bin",
        }
    }
}

/// One exportable unit: a source video, a time range, a layout and an audio mix.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CompositionJob {
    /// Unique within the batch.
    pub id: JobId,
    /// Source video.
    pub source: MediaRef,
    /// Requested in and out points in source time.
    pub time_range: TimeRange,
    /// Visual layers over the video.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Audio sources to mix.
    #[serde(default)]
    pub audio_layers: Vec<AudioLayer>,
    /// Canvas size of the artifact.
    pub output: Dimensions,
    /// Lifecycle status.
    #[serde(default)]
    pub status: JobStatus,
    /// Set while `status` is `error`.
    #[serde(default)]
    pub failure: Option<JobFailure>,
    /// Set once `status` is `done`, until taken.
    #[serde(skip)]
    pub artifact: Option<Artifact>,
}

impl CompositionJob {
    /// An idle job with an empty layout and no audio.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        time_range: TimeRange,
        output: Dimensions,
    ) -> Self {
        Self {
            id: JobId::new(id),
            source: MediaRef::new(source),
            time_range,
            layout: LayoutConfig::default(),
            audio_layers: Vec::new(),
            output,
            status: JobStatus::Idle,
            failure: None,
            artifact: None,
        }
    }

    /// Replace the layout.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the audio layers.
    pub fn with_audio(mut self, audio_layers: Vec<AudioLayer>) -> Self {
        self.audio_layers = audio_layers;
        self
    }

    /// `idle -> processing`, or `error -> processing` as an explicit retry.
    pub fn begin_processing(&mut self) -> ComposeResult<()> {
        match self.status {
            JobStatus::Idle | JobStatus::Error => {
                self.status = JobStatus::Processing;
                self.failure = None;
                Ok(())
            }
            other => Err(ComposeError::validation(format!(
                "job '{}' cannot start processing from status '{other}'",
                self.id
            ))),
        }
    }

    /// `processing -> done`, storing the artifact.
    pub fn complete(&mut self, artifact: Artifact) -> ComposeResult<()> {
        self.expect_processing("complete")?;
        self.status = JobStatus::Done;
        self.artifact = Some(artifact);
        Ok(())
    }

    /// `processing -> error`, recording why.
    pub fn fail(&mut self, failure: JobFailure) -> ComposeResult<()> {
        self.expect_processing("fail")?;
        self.status = JobStatus::Error;
        self.failure = Some(failure);
        Ok(())
    }

    /// Hand the artifact to the caller, who becomes responsible for releasing it.
    pub fn take_artifact(&mut self) -> Option<Artifact> {
        self.artifact.take()
    }

    fn expect_processing(&self, op: &str) -> ComposeResult<()> {
        if self.status != JobStatus::Processing {
            return Err(ComposeError::validation(format!(
                "job '{}' cannot {op} from status '{}'",
                self.id, self.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/job.rs"]
mod tests;
