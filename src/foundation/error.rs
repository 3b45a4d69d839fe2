/// Convenience result type used across the pipeline.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Error taxonomy for layout, rendering, capture and batch APIs.
///
/// Every variant is contained at the job boundary: the capture controller converts it into a
/// [`JobFailure`](crate::JobFailure) and the batch keeps going.
#[derive(thiserror::Error, Debug)]
pub enum ComposeError {
    /// Invalid user-provided configuration or state transition.
    #[error("validation error: {0}")]
    Validation(String),

    /// Required media failed to load, or the session could not be set up.
    #[error("setup failure: {0}")]
    Setup(String),

    /// Recorder or audio graph failed while a session was active.
    #[error("recording failure: {0}")]
    Recording(String),

    /// An optional asset (music, decorative overlay) failed to load or decode.
    #[error("asset failure: {0}")]
    Asset(String),

    /// The session was aborted on request.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ComposeError {
    /// Build a [`ComposeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ComposeError::Setup`] value.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// Build a [`ComposeError::Recording`] value.
    pub fn recording(msg: impl Into<String>) -> Self {
        Self::Recording(msg.into())
    }

    /// Build a [`ComposeError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`ComposeError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Build a [`ComposeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for [`ComposeError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl From<serde_json::Error> for ComposeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
