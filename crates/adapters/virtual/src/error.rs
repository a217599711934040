//! Virtual adapter error types.

use alerthub_domain::error::HubError;

/// Errors raised by the in-memory adapters.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// A subscriber fell behind and missed updates.
    #[error("subscriber lagged behind by {0} updates")]
    Lagged(u64),

    /// The rule feed was interrupted on purpose.
    #[error("rule feed interrupted: {0}")]
    FeedInterrupted(String),

    /// The push sender was configured to reject this token.
    #[error("device token {0} rejected")]
    TokenRejected(String),

    /// A seed file could not be read.
    #[error("cannot read seed file {path}")]
    SeedRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A seed file is not valid JSON of the expected shape.
    #[error("invalid seed data")]
    SeedFormat(#[from] serde_json::Error),
}

impl From<VirtualError> for HubError {
    fn from(err: VirtualError) -> Self {
        match err {
            VirtualError::TokenRejected(_) => HubError::Delivery(Box::new(err)),
            other => HubError::Storage(Box::new(other)),
        }
    }
}
