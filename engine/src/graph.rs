use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use domain::{PartialTradingState, TradingState};

/// Terminal node name every `edges`/conditional map may route to.
pub const END_NODE: &str = "end";

/// A node is a function `(state) -> partial_state`, per spec. Nodes never
/// mutate `state` directly; the driver merges their output using
/// `TradingState::merge`.
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, state: &TradingState) -> anyhow::Result<PartialTradingState>;
}

/// The single conditional edge a pipeline may declare (the `approval`
/// branch). `decide` reads the merged state and names the next node.
#[derive(Clone)]
pub struct ConditionalEdge {
    pub from: String,
    pub decide: Arc<dyn Fn(&TradingState) -> String + Send + Sync>,
}

/// A compiled pipeline, represented as data rather than a general graph
/// library: a fixed node set, static edges, and at most one conditional
/// edge. Built once per market kind at startup.
pub struct GraphSpec {
    pub start: String,
    pub nodes: HashMap<String, Arc<dyn Node>>,
    pub edges: HashMap<String, String>,
    pub conditional: Option<ConditionalEdge>,
    pub interrupt_before: HashSet<String>,
}

impl GraphSpec {
    /// The node to enter after `from`, given the just-merged `state`. The
    /// conditional edge (if declared for `from`) takes precedence over any
    /// static edge.
    pub fn next(&self, from: &str, state: &TradingState) -> Option<String> {
        if let Some(cond) = &self.conditional {
            if cond.from == from {
                return Some((cond.decide)(state));
            }
        }
        self.edges.get(from).cloned()
    }
}

#[derive(Default)]
pub struct GraphSpecBuilder {
    start: Option<String>,
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, String>,
    conditional: Option<ConditionalEdge>,
    interrupt_before: HashSet<String>,
}

impl GraphSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    pub fn node(mut self, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(node.name().to_string(), node);
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.insert(from.into(), to.into());
        self
    }

    pub fn conditional(
        mut self,
        from: impl Into<String>,
        decide: impl Fn(&TradingState) -> String + Send + Sync + 'static,
    ) -> Self {
        self.conditional = Some(ConditionalEdge { from: from.into(), decide: Arc::new(decide) });
        self
    }

    pub fn interrupt_before(mut self, name: impl Into<String>) -> Self {
        self.interrupt_before.insert(name.into());
        self
    }

    pub fn build(self) -> anyhow::Result<GraphSpec> {
        let start = self.start.ok_or_else(|| anyhow::anyhow!("graph has no start node"))?;
        Ok(GraphSpec {
            start,
            nodes: self.nodes,
            edges: self.edges,
            conditional: self.conditional,
            interrupt_before: self.interrupt_before,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ApprovalStatus;

    struct Noop(&'static str);

    #[async_trait]
    impl Node for Noop {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, _state: &TradingState) -> anyhow::Result<PartialTradingState> {
            Ok(PartialTradingState::default())
        }
    }

    fn sample_graph() -> GraphSpec {
        GraphSpecBuilder::new()
            .start("a")
            .node(Arc::new(Noop("a")))
            .node(Arc::new(Noop("approval")))
            .edge("a", "approval")
            .conditional("approval", |state| match state.approval_status {
                ApprovalStatus::Approved | ApprovalStatus::Modified => "execute".to_string(),
                ApprovalStatus::Rejected => "re_analyze".to_string(),
                ApprovalStatus::Pending => END_NODE.to_string(),
            })
            .interrupt_before("approval")
            .build()
            .unwrap()
    }

    #[test]
    fn static_edge_is_used_outside_the_conditional_node() {
        let graph = sample_graph();
        let state = TradingState::new();
        assert_eq!(graph.next("a", &state), Some("approval".to_string()));
    }

    #[test]
    fn conditional_edge_overrides_static_routing_by_decision() {
        let graph = sample_graph();
        let mut state = TradingState::new();
        state.approval_status = ApprovalStatus::Approved;
        assert_eq!(graph.next("approval", &state), Some("execute".to_string()));

        state.approval_status = ApprovalStatus::Rejected;
        assert_eq!(graph.next("approval", &state), Some("re_analyze".to_string()));
    }

    #[test]
    fn unknown_node_has_no_outgoing_edge() {
        let graph = sample_graph();
        let state = TradingState::new();
        assert_eq!(graph.next("nonexistent", &state), None);
    }
}
