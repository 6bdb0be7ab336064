pub mod approval_update;
pub mod broker_client;
pub mod error;
pub mod graph_spec;
pub mod llm;
pub mod nodes;
pub mod order;

pub use approval_update::build_resume_update;
pub use broker_client::{BrokerClient, OrderRequest};
pub use error::PipelineError;
pub use graph_spec::{build_graph, AnalystPrompts, APPROVAL_NODE};
pub use llm::{Llm, LlmMessage, LlmRole};
pub use nodes::{AnalystNode, ApprovalNode, DataCollectionNode, DecisionNode, ExecuteNode, ReAnalyzeNode};
pub use order::{price_to_tick_units, validate_order, validate_price_tick};
