use domain::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("broker call failed: {0}")]
    Broker(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Broker(_) => ErrorKind::Network,
            PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }
}
