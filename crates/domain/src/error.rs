//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! at port boundaries, either via `#[from]` or an explicit `From` impl.

/// Base error returned by every port and service in the workspace.
///
/// Messages carry their cause so a single `%err` field logs it.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A rule document or value failed domain validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A storage backend (rule store, realtime store, user directory) failed.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The push transport rejected or failed to deliver a notification.
    #[error("delivery error: {0}")]
    Delivery(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Reasons a rule document is rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The document is not a JSON object or a field has the wrong shape.
    #[error("malformed rule document: {0}")]
    Malformed(String),

    /// A required field is missing or empty.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The action kind is not `notification`.
    #[error("unsupported action type `{0}`")]
    UnsupportedAction(String),

    /// The condition source is not the realtime store.
    #[error("unsupported condition source `{0}`")]
    UnsupportedSource(String),

    /// The comparison operator is not one of `==`, `!=`, `>`, `<`, `>=`, `<=`.
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
}
