use std::{
    collections::{BTreeMap, HashSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use crate::{
    batch::split::split_range,
    foundation::{
        core::{Dimensions, TimeRange},
        error::{ComposeError, ComposeResult},
    },
    model::{
        job::CompositionJob,
        layers::{AudioLayer, LayoutConfig, MediaRef},
    },
};

/// Probed metadata for one referenced media file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaProbe {
    /// A source video.
    Video {
        /// Seconds.
        duration: f64,
        /// Natural width.
        width: u32,
        /// Natural height.
        height: u32,
        /// Has an audio track; assumed when absent.
        #[serde(default = "yes")]
        has_audio: bool,
    },
    /// A still image.
    Image {
        /// Natural width.
        width: u32,
        /// Natural height.
        height: u32,
    },
    /// An audio-only file.
    Audio {
        /// Seconds.
        duration: f64,
    },
}

fn yes() -> bool {
    true
}

/// Cut a job's range into consecutive segments.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SplitSpec {
    /// Target segment length.
    pub segment_secs: f64,
    /// A shorter final segment is merged into the previous one.
    #[serde(default)]
    pub min_tail_secs: f64,
}

/// One job as written in the manifest, before splitting.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobEntry {
    /// Job id; split parts get `-1`, `-2`, ... appended.
    pub id: String,
    /// Source video.
    pub source: MediaRef,
    /// Range in source time.
    pub range: TimeRange,
    /// Replaces the manifest-wide layout for this job.
    #[serde(default)]
    pub layout: Option<LayoutConfig>,
    /// Mix the source track at zero gain.
    #[serde(default)]
    pub mute_source: bool,
    /// Expand into one job per segment.
    #[serde(default)]
    pub split: Option<SplitSpec>,
}

/// JSON batch description: one output resolution, a shared layout and music bed, and the
/// queue of jobs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchManifest {
    /// Canvas size of every job.
    pub output: Dimensions,
    /// Layout shared by jobs that do not bring their own.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Music bed mixed into every job.
    #[serde(default)]
    pub music: Option<MediaRef>,
    /// Known metadata of the referenced files.
    #[serde(default)]
    pub media: BTreeMap<MediaRef, MediaProbe>,
    /// Jobs in queue order.
    pub jobs: Vec<JobEntry>,
}

impl BatchManifest {
    /// Parse a manifest from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ComposeResult<Self> {
        let m: Self = serde_json::from_reader(r)
            .map_err(|e| ComposeError::validation(format!("parse batch manifest JSON: {e}")))?;
        m.validate()?;
        Ok(m)
    }

    /// Parse a manifest from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ComposeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ComposeError::validation(format!("open batch manifest '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check the output size, the layouts and every range; job ids must be unique.
    pub fn validate(&self) -> ComposeResult<()> {
        Dimensions::new(self.output.width, self.output.height)?;
        self.layout.validate()?;
        for entry in &self.jobs {
            entry.range.validate().map_err(|e| {
                ComposeError::validation(format!("job '{}': {e}", entry.id))
            })?;
            if let Some(layout) = &entry.layout {
                layout.validate().map_err(|e| {
                    ComposeError::validation(format!("job '{}': {e}", entry.id))
                })?;
            }
        }
        // Split expansion can also collide ids, so check the expanded list.
        let jobs = self.expand_jobs()?;
        let mut seen = HashSet::new();
        for job in &jobs {
            if !seen.insert(job.id.clone()) {
                return Err(ComposeError::validation(format!(
                    "duplicate job id '{}'",
                    job.id
                )));
            }
        }
        Ok(())
    }

    /// Build the job queue in manifest order, expanding split entries in place.
    pub fn into_jobs(&self) -> ComposeResult<Vec<CompositionJob>> {
        self.validate()?;
        self.expand_jobs()
    }

    /// Natural size of a probed video or image.
    pub fn dimensions_of(&self, media: &MediaRef) -> Option<Dimensions> {
        match self.media.get(media)? {
            MediaProbe::Video { width, height, .. } | MediaProbe::Image { width, height } => {
                Dimensions::new(*width, *height).ok()
            }
            MediaProbe::Audio { .. } => None,
        }
    }

    fn expand_jobs(&self) -> ComposeResult<Vec<CompositionJob>> {
        let mut out = Vec::with_capacity(self.jobs.len());
        for entry in &self.jobs {
            let layout = entry.layout.clone().unwrap_or_else(|| self.layout.clone());
            let mut audio = vec![AudioLayer::SourceAudio {
                muted: entry.mute_source,
            }];
            if let Some(music) = &self.music {
                audio.push(AudioLayer::Music {
                    source: music.clone(),
                    muted: false,
                });
            }

            let ranges = match entry.split {
                Some(spec) => split_range(entry.range, spec.segment_secs, spec.min_tail_secs)?
                    .into_iter()
                    .enumerate()
                    .map(|(i, r)| (format!("{}-{}", entry.id, i + 1), r))
                    .collect::<Vec<_>>(),
                None => vec![(entry.id.clone(), entry.range)],
            };
            for (id, range) in ranges {
                out.push(
                    CompositionJob::new(id, entry.source.as_str(), range, self.output)
                        .with_layout(layout.clone())
                        .with_audio(audio.clone()),
                );
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/manifest.rs"]
mod tests;
