use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("startup failed: {0}")]
    Startup(String),

    #[error(transparent)]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error(transparent)]
    Engine(#[from] engine::EngineError),
}
