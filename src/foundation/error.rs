/// Convenience result type used across mipview.
pub type MipviewResult<T> = Result<T, MipviewError>;

/// Top-level error taxonomy used by renderer APIs.
///
/// Cancellation is not an error: a superseded pass reports `false` from
/// [`Projector::map`](crate::Projector::map) instead.
#[derive(thiserror::Error, Debug)]
pub enum MipviewError {
    /// Invalid caller-provided values (empty scale lists, bad dimensions, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A data source failed to provide voxels or transforms.
    #[error("source error: {0}")]
    Source(String),

    /// A render pass failed (worker band fault, thread pool failure).
    #[error("render error: {0}")]
    Render(String),

    /// Renderer configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MipviewError {
    /// Build a [`MipviewError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MipviewError::Source`] value.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Build a [`MipviewError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MipviewError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
