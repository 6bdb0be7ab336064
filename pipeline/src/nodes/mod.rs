pub mod analyst;
pub mod approval;
pub mod data_collection;
pub mod decision;
pub mod execute;
pub mod re_analyze;

pub use analyst::AnalystNode;
pub use approval::ApprovalNode;
pub use data_collection::DataCollectionNode;
pub use decision::DecisionNode;
pub use execute::ExecuteNode;
pub use re_analyze::ReAnalyzeNode;
