/// Convenience result type used across cardframe.
pub type CardResult<T> = Result<T, CardError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Most variants are recovered inside the session (decode, extraction, persistence,
/// encode); they only escape through the lower-level APIs that produce them.
#[derive(thiserror::Error, Debug)]
pub enum CardError {
    /// Invalid user-provided sizes, scales or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Uploaded bytes could not be decoded into an image.
    #[error("decode error: {0}")]
    Decode(String),

    /// The palette capability failed or produced nothing usable.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Persisted state could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A rendered surface could not be encoded into an export artifact.
    #[error("encode error: {0}")]
    Encode(String),

    /// Backend invariant violations while executing a render plan.
    #[error("render error: {0}")]
    Render(String),

    /// A request was refused locally by a business rule.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardError {
    /// Build a [`CardError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CardError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`CardError::Extraction`] value.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Build a [`CardError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`CardError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CardError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CardError::Rejected`] value.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
