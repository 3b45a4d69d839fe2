use std::path::{Path, PathBuf};

use crate::{
    foundation::{
        core::Dimensions,
        error::{ComposeError, ComposeResult},
    },
    model::layers::MediaRef,
};

/// Reads natural image sizes from local files, resolving refs against a root directory.
#[derive(Clone, Debug)]
pub struct FsImageProbe {
    root: PathBuf,
}

impl FsImageProbe {
    /// Resolve media refs relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory refs are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path of `source`.
    pub fn path_of(&self, source: &MediaRef) -> PathBuf {
        self.root.join(source.as_str())
    }

    /// Read the image header only; pixels are not decoded.
    pub fn image_size(&self, source: &MediaRef) -> ComposeResult<Dimensions> {
        let path = self.path_of(source);
        let (width, height) = image::image_dimensions(&path).map_err(|e| {
            ComposeError::asset(format!("probe image '{}': {e}", path.display()))
        })?;
        Dimensions::new(width, height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
