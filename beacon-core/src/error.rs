#[derive(Debug, thiserror::Error)]
pub enum BeaconError {
    /// Malformed report or out-of-range coordinates. Client error, no retry,
    /// guaranteed to have produced no side effects.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Durable store unavailable or a write was rejected. The triggering
    /// operation is aborted and the cache left untouched.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Membership lookup failed or the user is not a member of the group.
    #[error("Membership error: {0}")]
    Membership(String),

    /// Unknown or invalid live session / token.
    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BeaconError>;
