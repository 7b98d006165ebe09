//! Typed errors for the library boundaries.
//!
//! Persistence failures carry the code/message pair signaled by the backing store,
//! which is what [`LoadFailure::classify`] inspects to tell connectivity problems
//! apart from everything else.

use thiserror::Error;

/// Signaled code for a store that cannot be reached or opened.
pub const CODE_UNAVAILABLE: &str = "unavailable";
/// Signaled code for any other store failure.
pub const CODE_INTERNAL: &str = "internal";

/// A failure reported by a persistence adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct PersistenceError {
    pub code: String,
    pub message: String,
}

impl PersistenceError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CODE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CODE_INTERNAL, message)
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        let unreachable = matches!(
            err.sqlite_error_code(),
            Some(
                ErrorCode::CannotOpen
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::NotADatabase
                    | ErrorCode::ReadOnly
            )
        );
        if unreachable {
            Self::unavailable(err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("malformed document: {err}"))
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string())
    }
}

/// Session-level classification of a hydration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    /// The store is unreachable or misconfigured.
    Connectivity,
    /// Anything else.
    Generic,
}

impl LoadFailure {
    /// Classify by the signaled code, falling back to the message text.
    pub fn classify(err: &PersistenceError) -> Self {
        if err.code == CODE_UNAVAILABLE || err.message.contains("offline") {
            Self::Connectivity
        } else {
            Self::Generic
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Connectivity => {
                "Could not connect to the thought store. Check your network connection and \
                 that the storage backend is configured and reachable."
            }
            Self::Generic => "Could not load your data. Please try again.",
        }
    }
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.user_message())
    }
}

/// A failure from the enrichment gateway or the transcription channel.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("input is empty")]
    EmptyInput,

    #[error("request to model failed: {0}")]
    Request(String),

    #[error("model API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model returned unusable output: {0}")]
    Unusable(String),

    #[error("transcription error: {0}")]
    Transcription(String),
}

/// Logical actions guarded against overlapping calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CaptureThought,
    Synthesize,
    DailySummary,
    Import,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CaptureThought => "capture_thought",
            Self::Synthesize => "synthesize",
            Self::DailySummary => "daily_summary",
            Self::Import => "import",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0} is already in flight")]
    Busy(Action),

    #[error("session is not ready (state: {0})")]
    NotReady(&'static str),

    #[error("invalid transition from {from} on {event}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },

    #[error("demo mode has no sign-out")]
    SignOutUnsupported,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),
}
