use thiserror::Error;

/// Errors from the upstream generation backend.
///
/// None of these reach the wire: the service absorbs them into degraded
/// results with a substituted image.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Network-level failure talking to the backend
    #[error("Request to generation backend failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Generation backend returned status {status}: {body}")]
    UpstreamStatus {
        /// HTTP status from the backend
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The backend answered 200 but reported a prediction error
    #[error("Generation backend reported an error: {0}")]
    UpstreamReported(String),

    /// The prediction output was neither a URL nor a sequence of URLs
    #[error("Unexpected response format from generation backend")]
    UnexpectedOutput,

    /// The prediction completed without any output
    #[error("Generation backend returned no output")]
    MissingOutput,
}
