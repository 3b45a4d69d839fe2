//! Seams to the platform: decoders, audio processing, the recorder, and artifact delivery.
//!
//! Everything here is single-threaded and cooperative, so the async methods are `?Send`.

use crate::{
    foundation::{core::Dimensions, error::ComposeResult},
    model::{
        job::{Artifact, CompositionJob},
        layers::MediaRef,
    },
};

/// Handle to the live audio output of one playing element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AudioTap(pub String);

/// A playing (or playable) decode source.
#[async_trait::async_trait(?Send)]
pub trait MediaElement {
    /// What this element was opened from.
    fn source(&self) -> &MediaRef;

    /// Natural duration in seconds.
    fn duration(&self) -> f64;

    /// Natural size. `None` for audio-only elements.
    fn natural_size(&self) -> Option<Dimensions>;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Paused, whether on request or on its own.
    fn is_paused(&self) -> bool;

    /// Playback reached the natural end.
    fn is_ended(&self) -> bool;

    /// True once a decoded frame is available at the current position.
    fn frame_ready(&self) -> bool;

    /// Live audio output of this element, if it has an audio track.
    fn audio_tap(&self) -> Option<AudioTap>;

    /// Move the playhead and resolve once the seek has completed.
    async fn seek(&mut self, t: f64) -> ComposeResult<()>;

    /// Start or resume playback.
    async fn play(&mut self) -> ComposeResult<()>;

    /// Stop advancing the playhead. Idempotent.
    fn pause(&mut self);
}

/// Opens decode sources and probes images.
#[async_trait::async_trait(?Send)]
pub trait MediaProvider {
    /// Open a video and resolve once its metadata is loaded.
    async fn open_video(&self, source: &MediaRef) -> ComposeResult<Box<dyn MediaElement>>;

    /// Open an audio-only element.
    async fn open_audio(&self, source: &MediaRef) -> ComposeResult<Box<dyn MediaElement>>;

    /// Natural size of an image asset.
    async fn image_size(&self, source: &MediaRef) -> ComposeResult<Dimensions>;
}

/// Identifies one input branch of an audio context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BranchId(pub usize);

/// Mixed output of an audio context, ready to be muxed by a recorder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioStream {
    /// Backend-specific name of the destination.
    pub label: String,
}

/// One audio-processing context. Closing it releases decode resources.
pub trait AudioContext {
    /// Connect a tap into the shared destination at unit gain.
    fn connect(&mut self, tap: &AudioTap) -> ComposeResult<BranchId>;

    /// Gain of one branch; `0.0` mutes it without touching playback.
    fn set_gain(&mut self, branch: BranchId, gain: f32) -> ComposeResult<()>;

    /// The mixed output every branch feeds.
    fn destination(&self) -> AudioStream;

    /// Release the context. Idempotent.
    fn close(&mut self);
}

/// Creates audio contexts, one per session.
pub trait AudioBackend {
    /// Open a fresh context.
    fn create_context(&self) -> ComposeResult<Box<dyn AudioContext>>;
}

/// The combined stream a recorder encodes.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureStream {
    /// Canvas size of the video track.
    pub size: Dimensions,
    /// Frame rate the canvas is painted at.
    pub fps: u32,
    /// Mixed audio track, if any.
    pub audio: Option<AudioStream>,
}

/// Incremental encoder: chunks go in while active, `stop` assembles the artifact.
#[async_trait::async_trait(?Send)]
pub trait Recorder {
    /// Begin accepting chunks.
    fn start(&mut self) -> ComposeResult<()>;

    /// Append one encoded chunk.
    fn write_chunk(&mut self, chunk: Vec<u8>) -> ComposeResult<()>;

    /// Stop and wait for the finalize callback.
    async fn stop(&mut self) -> ComposeResult<Artifact>;

    /// Stop immediately and discard everything recorded.
    fn abort(&mut self);
}

/// Creates one recorder per session.
pub trait RecorderFactory {
    /// A recorder for `stream`, not yet started.
    fn create(&self, stream: CaptureStream) -> ComposeResult<Box<dyn Recorder>>;
}

/// Consumer of finished artifacts (download, upload, disk).
#[async_trait::async_trait(?Send)]
pub trait ArtifactSink {
    /// Hand over the artifact of a finished job. Failure does not change the job.
    async fn deliver(&self, job: &CompositionJob, artifact: &Artifact) -> ComposeResult<()>;
}
