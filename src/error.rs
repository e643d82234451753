/// Result alias carrying the crate error type.
pub type Result<T> = std::result::Result<T, OrbitError>;

/// Common error type for the core crate. Load-time failures are fatal for
/// the affected load operation; per-frame gameplay conditions (death,
/// overload, miss) are state transitions and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum OrbitError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
    #[error("level \"{0}\": {1}")]
    Level(String, String),
    #[error("path \"{0}\": {1}")]
    PathSpec(String, String),
    #[error("config: {0}")]
    Config(String),
}
