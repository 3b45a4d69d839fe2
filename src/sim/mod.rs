//! In-memory collaborators: synthetic media on the tokio clock, a counting audio backend, a
//! recorder that keeps its chunks, and a delivery sink that keeps its artifacts.

pub(crate) mod audio;
pub(crate) mod delivery;
pub(crate) mod log;
pub(crate) mod media;
pub(crate) mod recorder;

pub use audio::CountingAudioBackend;
pub use delivery::MemoryDelivery;
pub use log::{EventLog, SimEvent};
pub use media::{ElementSpec, SyntheticElement, SyntheticMedia};
pub use recorder::{MemoryRecorder, MemoryRecorderFactory, NDJSON_MIME};
