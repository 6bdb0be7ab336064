pub mod error;
pub mod model;
pub mod sqlite_store;
pub mod store;

pub use error::CheckpointError;
pub use model::{Checkpoint, CheckpointMetadata};
pub use sqlite_store::SqliteCheckpointStore;
pub use store::CheckpointStore;
