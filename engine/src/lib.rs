pub mod driver;
pub mod error;
pub mod graph;
pub mod parallel;

pub use driver::{Driver, StepOutcome};
pub use error::EngineError;
pub use graph::{ConditionalEdge, GraphSpec, GraphSpecBuilder, Node, END_NODE};
pub use parallel::{parallel_exec, ParallelTask};
