use thiserror::Error;

/// Errors produced by the clustering engine and session lifecycle.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Should never occur. Indicates the session state drifted out of shape
    /// (assignment count mismatch, centroid count drift). Always surfaced,
    /// never silently corrected.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to load configuration: {0}")]
    Config(String),

    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}
