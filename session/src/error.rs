use domain::session::SessionId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session {0} is already registered")]
    AlreadyRegistered(SessionId),

    #[error("session {0} not found")]
    NotFound(SessionId),
}
