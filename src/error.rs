//! Error types for the tracker pipeline, the registry and the REST layer.

use thiserror::Error;

/// A room URL failed one of the validation rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Url is required.")]
    MissingUrl,

    #[error("Url must be a valid absolute URI.")]
    NotAbsolute,

    #[error("Url must use https scheme.")]
    WrongScheme,

    #[error("Only {domain} URLs are accepted.")]
    WrongHost { domain: String },

    #[error("Url must target a room (e.g. https://{domain}/room/XXXX).")]
    WrongPath { domain: String },

    #[error("Room identifier contains invalid characters.")]
    InvalidRoomCode,
}

/// Failures that abort a snapshot request
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Stored URL no longer passes validation
    #[error("Invalid tracker URL: {0}")]
    InvalidTrackerUrl(#[source] ValidationError),

    #[error("Unable to reach Archipelago tracker.")]
    TrackerUnreachable(#[source] FetchError),

    #[error("Tracker request timed out.")]
    TrackerTimeout,
}

/// Outcome of a single failed outbound GET
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<FetchError> for TrackerError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout => TrackerError::TrackerTimeout,
            other => TrackerError::TrackerUnreachable(other),
        }
    }
}

/// Room registry failures
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt registry row: {0}")]
    CorruptRow(String),
}
