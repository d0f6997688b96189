//! Error types shared by the pipeline and its collaborators.

use thiserror::Error;

/// Failure of an external service call (moderation, captioning, model, channel).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty response")]
    Empty,
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Attachment bytes could not be retrieved.
#[derive(Debug, Error)]
#[error("failed to fetch attachment: {0}")]
pub struct FetchError(pub String);

/// The log holds nothing beyond its persona turn.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("conversation log has no turns beyond the persona")]
pub struct EmptyLogError;

/// An error that aborts the current event. The session stays usable.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("moderation failed: {0}")]
    Moderation(#[source] CollaboratorError),
    #[error("reply generation failed: {0}")]
    Reply(#[source] CollaboratorError),
    #[error("failed to send reply: {0}")]
    Send(#[source] CollaboratorError),
}
