use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
