use domain::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("node {node} failed: {source}")]
    NodeFailed { node: String, #[source] source: anyhow::Error },

    #[error("checkpoint store error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    /// An invariant the driver relies on was violated, e.g. an interrupt
    /// node with no graph edge, or a resume with no pending node recorded.
    #[error("invariant violation: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}
