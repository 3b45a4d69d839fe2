//! Reelcast composites a source video with image overlays, captions, watermarks and text
//! panels onto a fixed-size canvas, mixes its audio, and records the result frame by frame.
//!
//! The pipeline, leaf to root:
//!
//! - [`resolve_layout`] turns a [`LayoutConfig`] into pixel boxes and pre-wrapped text
//! - [`render_frame`] paints one tick onto a [`Surface`] in a fixed z-order
//! - [`MixGraph`] sums the live audio sources into one stream
//! - [`CaptureController`] drives seek, record, stop and finalize for one job
//! - [`BatchOrchestrator`] runs a queue of jobs strictly one at a time
//!
//! Decoders, audio contexts, recorders and delivery are traits (see [`MediaProvider`]);
//! the [`sim`] collaborators implement them in memory.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod audio;
pub(crate) mod batch;
pub(crate) mod capture;
pub(crate) mod config;
pub(crate) mod layout;
pub(crate) mod media;
pub(crate) mod model;
pub(crate) mod render;

pub mod sim;

pub use crate::foundation::core::{Corner, Dimensions, LayoutBox, Rect, Rgba8, Size, TimeRange};
pub use crate::foundation::error::{ComposeError, ComposeResult};

pub use crate::audio::graph::{MixGraph, MixInput};
pub use crate::batch::orchestrator::{BatchOrchestrator, BatchSummary};
pub use crate::batch::split::split_range;
pub use crate::capture::cancel::CancelToken;
pub use crate::capture::progress::{NoProgress, ProgressEvent, ProgressSink, TracingProgress};
pub use crate::capture::session::{CaptureController, CaptureState, SessionReport, StopReason};
pub use crate::config::pipeline::{PipelineConfig, WatchdogConfig};
pub use crate::layout::fit::{contain_fit, cover_fit, fit_into};
pub use crate::layout::font::ParleyMeasure;
pub use crate::layout::resolver::{
    CaptionCue, MediaDimensions, ResolvedCaptions, ResolvedLayer, ResolvedLayout,
    ResolvedTextBlock, ResolvedTextPanel, ResolvedWatermark, TextLine, WatermarkBody,
    place_corner, resolve_layout,
};
pub use crate::layout::text::{
    FitParams, FittedBlock, FittedText, MonospaceMeasure, TextBlockSpec, TextMeasure,
    fit_text_blocks, wrap_text,
};
pub use crate::media::delivery::DirectoryDelivery;
pub use crate::media::probe::FsImageProbe;
pub use crate::media::traits::{
    ArtifactSink, AudioBackend, AudioContext, AudioStream, AudioTap, BranchId, CaptureStream,
    MediaElement, MediaProvider, Recorder, RecorderFactory,
};
pub use crate::model::job::{Artifact, CompositionJob, FailureKind, JobFailure, JobId, JobStatus};
pub use crate::model::layers::{
    AudioLayer, CaptionClock, CaptionEntry, CaptionStyle, CaptionTrack, FitMode, ImageOverlay,
    LayoutConfig, MediaRef, PercentBox, Pulse, TextAlign, TextBlock, TextPanel, VisualLayer,
    Watermark, WatermarkContent, active_caption,
};
pub use crate::model::manifest::{BatchManifest, JobEntry, MediaProbe, SplitSpec};
pub use crate::render::display_list::{DisplayList, DisplayListFactory, DrawOp, ImageSource};
pub use crate::render::frame::{FrameContext, Tier, paint_order, render_frame};
pub use crate::render::surface::{CaptureSurface, ImageRef, Shadow, Surface, SurfaceFactory};
