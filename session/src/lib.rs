pub mod error;
pub mod registry;

pub use error::SessionError;
pub use registry::{SessionRegistry, DEFAULT_CLEANUP_INTERVAL, DEFAULT_SESSION_TTL, QUEUE_FULL_REASON};
