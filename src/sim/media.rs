use std::{
    collections::{BTreeMap, HashMap, HashSet},
    time::Duration,
};

use tokio::time::Instant;

use crate::{
    foundation::{
        core::Dimensions,
        error::{ComposeError, ComposeResult},
    },
    media::{
        probe::FsImageProbe,
        traits::{AudioTap, MediaElement, MediaProvider},
    },
    model::{layers::MediaRef, manifest::MediaProbe},
    sim::log::{EventLog, SimEvent},
};

/// Playback behavior of one synthetic source.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSpec {
    /// Natural duration in seconds.
    pub duration: f64,
    /// `None` for audio-only sources.
    pub size: Option<Dimensions>,
    /// Whether an audio tap is offered.
    pub has_audio: bool,
    /// The clock freezes here while the element keeps reporting "playing".
    pub stall_at: Option<f64>,
    /// The element pauses on its own here.
    pub pause_at: Option<f64>,
}

impl ElementSpec {
    /// A video with an audio track.
    pub fn video(duration: f64, size: Dimensions) -> Self {
        Self {
            duration,
            size: Some(size),
            has_audio: true,
            stall_at: None,
            pause_at: None,
        }
    }

    /// An audio-only source.
    pub fn audio(duration: f64) -> Self {
        Self {
            duration,
            size: None,
            has_audio: true,
            stall_at: None,
            pause_at: None,
        }
    }
}

/// Media element whose playhead follows `tokio::time::Instant`.
///
/// Under a paused test runtime the clock only moves when every task is idle, which makes
/// session timing fully deterministic.
#[derive(Debug)]
pub struct SyntheticElement {
    source: MediaRef,
    spec: ElementSpec,
    position: f64,
    playing_since: Option<Instant>,
    seek_latency: Duration,
    seeked: bool,
    log: EventLog,
}

impl SyntheticElement {
    /// A paused element at position zero.
    pub fn new(
        source: MediaRef,
        spec: ElementSpec,
        seek_latency: Duration,
        log: EventLog,
    ) -> Self {
        Self {
            source,
            spec,
            position: 0.0,
            playing_since: None,
            seek_latency,
            seeked: false,
            log,
        }
    }

    /// Where the playhead stops advancing: the end, or a stall/pause mark ahead of it.
    fn limit(&self) -> f64 {
        [self.spec.stall_at, self.spec.pause_at]
            .into_iter()
            .flatten()
            .filter(|&mark| mark >= self.position)
            .fold(self.spec.duration, f64::min)
    }

    fn paused_itself(&self) -> bool {
        self.spec
            .pause_at
            .is_some_and(|mark| mark >= self.position && self.current_time() >= mark)
    }
}

#[async_trait::async_trait(?Send)]
impl MediaElement for SyntheticElement {
    fn source(&self) -> &MediaRef {
        &self.source
    }

    fn duration(&self) -> f64 {
        self.spec.duration
    }

    fn natural_size(&self) -> Option<Dimensions> {
        self.spec.size
    }

    fn current_time(&self) -> f64 {
        match self.playing_since {
            Some(since) => (self.position + since.elapsed().as_secs_f64()).min(self.limit()),
            None => self.position,
        }
    }

    fn is_paused(&self) -> bool {
        self.playing_since.is_none() || self.paused_itself() || self.is_ended()
    }

    fn is_ended(&self) -> bool {
        self.current_time() >= self.spec.duration
    }

    fn frame_ready(&self) -> bool {
        self.spec.size.is_some() && self.seeked
    }

    fn audio_tap(&self) -> Option<AudioTap> {
        self.spec
            .has_audio
            .then(|| AudioTap(self.source.as_str().to_string()))
    }

    async fn seek(&mut self, t: f64) -> ComposeResult<()> {
        tokio::time::sleep(self.seek_latency).await;
        self.position = t.clamp(0.0, self.spec.duration);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        self.seeked = true;
        self.log.push(SimEvent::Seeked {
            source: self.source.to_string(),
            t: self.position,
        });
        Ok(())
    }

    async fn play(&mut self) -> ComposeResult<()> {
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
            self.log.push(SimEvent::Played(self.source.to_string()));
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing_since.is_some() {
            self.position = self.current_time();
            self.playing_since = None;
            self.log.push(SimEvent::Paused(self.source.to_string()));
        }
    }
}

/// Media provider over a table of synthetic sources.
#[derive(Clone, Debug, Default)]
pub struct SyntheticMedia {
    elements: HashMap<MediaRef, ElementSpec>,
    images: HashMap<MediaRef, Dimensions>,
    broken: HashSet<MediaRef>,
    image_probe: Option<FsImageProbe>,
    seek_latency: Duration,
    log: EventLog,
}

impl SyntheticMedia {
    /// An empty provider with a 50 ms seek latency.
    pub fn new(log: EventLog) -> Self {
        Self {
            seek_latency: Duration::from_millis(50),
            log,
            ..Self::default()
        }
    }

    /// Build from a manifest probe table.
    pub fn from_probes(probes: &BTreeMap<MediaRef, MediaProbe>, log: EventLog) -> Self {
        let mut media = Self::new(log);
        for (source, probe) in probes {
            match probe {
                MediaProbe::Video {
                    duration,
                    width,
                    height,
                    has_audio,
                } => {
                    if let Ok(size) = Dimensions::new(*width, *height) {
                        let mut spec = ElementSpec::video(*duration, size);
                        spec.has_audio = *has_audio;
                        media.elements.insert(source.clone(), spec);
                    }
                }
                MediaProbe::Image { width, height } => {
                    if let Ok(size) = Dimensions::new(*width, *height) {
                        media.images.insert(source.clone(), size);
                    }
                }
                MediaProbe::Audio { duration } => {
                    media
                        .elements
                        .insert(source.clone(), ElementSpec::audio(*duration));
                }
            }
        }
        media
    }

    /// Register a playable source.
    pub fn with_element(mut self, source: impl Into<MediaRef>, spec: ElementSpec) -> Self {
        self.elements.insert(source.into(), spec);
        self
    }

    /// Register an image size.
    pub fn with_image(mut self, source: impl Into<MediaRef>, size: Dimensions) -> Self {
        self.images.insert(source.into(), size);
        self
    }

    /// Opening this source fails.
    pub fn with_broken(mut self, source: impl Into<MediaRef>) -> Self {
        self.broken.insert(source.into());
        self
    }

    /// Images missing from the table are probed from disk.
    pub fn with_image_probe(mut self, probe: FsImageProbe) -> Self {
        self.image_probe = Some(probe);
        self
    }

    /// Time every seek takes on the tokio clock.
    pub fn with_seek_latency(mut self, latency: Duration) -> Self {
        self.seek_latency = latency;
        self
    }

    /// Log shared with the elements.
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    fn open(&self, source: &MediaRef, want_video: bool) -> ComposeResult<Box<dyn MediaElement>> {
        if self.broken.contains(source) {
            return Err(ComposeError::setup(format!("cannot decode '{source}'")));
        }
        let spec = self
            .elements
            .get(source)
            .ok_or_else(|| ComposeError::setup(format!("unknown media '{source}'")))?;
        if want_video && spec.size.is_none() {
            return Err(ComposeError::setup(format!("'{source}' has no video track")));
        }
        self.log.push(SimEvent::Opened(source.to_string()));
        Ok(Box::new(SyntheticElement::new(
            source.clone(),
            spec.clone(),
            self.seek_latency,
            self.log.clone(),
        )))
    }
}

#[async_trait::async_trait(?Send)]
impl MediaProvider for SyntheticMedia {
    async fn open_video(&self, source: &MediaRef) -> ComposeResult<Box<dyn MediaElement>> {
        self.open(source, true)
    }

    async fn open_audio(&self, source: &MediaRef) -> ComposeResult<Box<dyn MediaElement>> {
        self.open(source, false)
            .map_err(|e| ComposeError::asset(e.to_string()))
    }

    async fn image_size(&self, source: &MediaRef) -> ComposeResult<Dimensions> {
        if self.broken.contains(source) {
            return Err(ComposeError::asset(format!("cannot decode '{source}'")));
        }
        if let Some(size) = self.images.get(source) {
            return Ok(*size);
        }
        match &self.image_probe {
            Some(probe) => probe.image_size(source),
            None => Err(ComposeError::asset(format!("unknown image '{source}'"))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sim/media.rs"]
mod tests;
