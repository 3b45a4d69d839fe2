use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    foundation::error::ComposeResult,
    media::traits::ArtifactSink,
    model::job::{Artifact, CompositionJob},
};

/// Writes each artifact to `<dir>/<job id>.<ext>` as soon as it is delivered.
#[derive(Clone, Debug)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    /// Deliver into `dir`, created on first delivery.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the artifact of `job` lands.
    pub fn path_for(&self, job: &CompositionJob, artifact: &Artifact) -> PathBuf {
        self.dir.join(format!("{}.{}", job.id, artifact.extension()))
    }
}

#[async_trait::async_trait(?Send)]
impl ArtifactSink for DirectoryDelivery {
    async fn deliver(&self, job: &CompositionJob, artifact: &Artifact) -> ComposeResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create output dir '{}'", self.dir.display()))?;
        let path = self.path_for(job, artifact);
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .with_context(|| format!("write artifact '{}'", path.display()))?;
        tracing::info!(
            job_id = %job.id,
            path = %path.display(),
            bytes = artifact.bytes.len(),
            "artifact delivered"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/delivery.rs"]
mod tests;
