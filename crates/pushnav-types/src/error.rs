//! Error types for pushnav.

/// Errors produced while reconciling navigation state.
///
/// Only [`NavError::Normalization`] aborts a gesture. The remaining
/// navigation variants are reported through the engine's diagnostic
/// channel and never escape an entry point.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// The href could not be turned into an absolute same-origin URL.
    #[error("cannot normalize URL: {0}")]
    Normalization(String),

    /// A fetch for this URL is already outstanding.
    #[error("navigation already pending: {0}")]
    AlreadyPending(String),

    /// A response arrived with no matching request record.
    #[error("no pending navigation for {0}")]
    NoSuchPending(String),

    /// An action identifier has no registered handler.
    #[error("unresolved action: {0}")]
    UnresolvedAction(String),

    /// The response transform rejected a raw response.
    #[error("response transform failed: {0}")]
    Transform(String),

    /// The HTTP collaborator reported a failed fetch.
    #[error("transport error: {0}")]
    Transport(String),

    /// The history stack refused a push or replace.
    #[error("history error: {0}")]
    History(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NavError {
    /// Whether the error aborts the triggering gesture.
    ///
    /// Aborted gestures are left to the browser's default behaviour.
    pub fn aborts_gesture(&self) -> bool {
        matches!(self, NavError::Normalization(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, NavError>;
