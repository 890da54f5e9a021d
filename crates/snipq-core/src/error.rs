use std::io;
use thiserror::Error;

/// Typed outcome of a failed expand or preview call.
///
/// Every variant is recoverable; callers present it to the user and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("Malformed parameter '{input}': {reason}")]
    MalformedParameter { input: String, reason: String },

    #[error("No snippet matches trigger '{0}'")]
    TriggerNotFound(String),

    #[error("Trigger '{0}' is not surrounded by word boundaries")]
    BoundaryViolation(String),

    #[error("Expansion is disabled in application '{0}'")]
    AppExcluded(String),

    #[error("Snippet '{snippet}' requires values for: {}", .names.join(", "))]
    MissingRequiredPlaceholder { snippet: String, names: Vec<String> },

    #[error("Template error at offset {offset}: {reason}")]
    RenderFailure { offset: usize, reason: String },
}

impl ExpandError {
    /// Stable kind name used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ExpandError::MalformedParameter { .. } => "MalformedParameter",
            ExpandError::TriggerNotFound(_) => "TriggerNotFound",
            ExpandError::BoundaryViolation(_) => "BoundaryViolation",
            ExpandError::AppExcluded(_) => "AppExcluded",
            ExpandError::MissingRequiredPlaceholder { .. } => "MissingRequiredPlaceholder",
            ExpandError::RenderFailure { .. } => "RenderFailure",
        }
    }

    pub(crate) fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        ExpandError::MalformedParameter {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SnipqError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Vault not found at: {0}")]
    VaultNotFound(String),

    #[error("Invalid vault: {0}")]
    InvalidVault(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SnipqError>;
