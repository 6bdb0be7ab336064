use std::sync::Arc;
use std::time::Duration;

use checkpoint::{Checkpoint, CheckpointMetadata, CheckpointStore};
use domain::{PartialTradingState, SessionId, SessionStatus, ThreadId, TradingState};
use session::SessionRegistry;
use tokio::sync::OwnedSemaphorePermit;

use crate::error::EngineError;
use crate::graph::{GraphSpec, END_NODE};

/// What a single `run`/`resume` call produced. Mirrors the driver loop's
/// two return points: the interrupt barrier and the `end` node.
#[derive(Debug)]
pub enum StepOutcome {
    AwaitingApproval { session_id: SessionId, thread_id: ThreadId, paused_before: String },
    Completed { session_id: SessionId, thread_id: ThreadId, final_state: TradingState },
}

/// Runs one compiled pipeline for one session. Stateless between calls:
/// all durable state lives in the checkpoint store and the session
/// registry, so a fresh `Driver` built against the same stores resumes
/// exactly where a prior process left off.
///
/// Lock-order discipline (never taken in reverse): registry, then
/// checkpoint store. The driver never holds both at once.
pub struct Driver {
    graph: Arc<GraphSpec>,
    checkpoints: Arc<dyn CheckpointStore>,
    sessions: Arc<SessionRegistry>,
}

impl Driver {
    pub fn new(graph: Arc<GraphSpec>, checkpoints: Arc<dyn CheckpointStore>, sessions: Arc<SessionRegistry>) -> Self {
        Self { graph, checkpoints, sessions }
    }

    /// Starts a fresh session at the graph's entry node.
    pub async fn run(
        &self,
        session_id: SessionId,
        thread_id: ThreadId,
        permit: OwnedSemaphorePermit,
    ) -> Result<StepOutcome, EngineError> {
        self.drive(session_id, thread_id, self.graph.start.clone(), TradingState::new(), None, 0, permit).await
    }

    /// Resumes a session parked at an interrupt. `update` is the caller's
    /// approval decision (and any field overrides), merged into the
    /// checkpointed state before execution continues at the node that was
    /// interrupted before.
    pub async fn resume(
        &self,
        session_id: SessionId,
        thread_id: ThreadId,
        update: PartialTradingState,
        permit: OwnedSemaphorePermit,
    ) -> Result<StepOutcome, EngineError> {
        let checkpoint = self
            .checkpoints
            .get_latest(session_id, thread_id)
            .await?
            .ok_or_else(|| EngineError::Internal("no checkpoint to resume from".to_string()))?;

        let next_node = checkpoint
            .pending_sends
            .get("next_node")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::Internal("interrupt reached with no pending node".to_string()))?
            .to_string();

        let mut state = checkpoint.channel_values;
        state.merge(update);
        state.awaiting_approval = false;

        self.drive(session_id, thread_id, next_node, state, Some(checkpoint.id), checkpoint.metadata.step, permit)
            .await
    }

    async fn drive(
        &self,
        session_id: SessionId,
        thread_id: ThreadId,
        mut current: String,
        mut state: TradingState,
        mut parent_id: Option<uuid::Uuid>,
        mut step: i64,
        permit: OwnedSemaphorePermit,
    ) -> Result<StepOutcome, EngineError> {
        loop {
            if current == END_NODE {
                self.sessions.update_status(session_id, SessionStatus::Completed, None).await.ok();
                self.sessions.release_slot(permit);
                return Ok(StepOutcome::Completed { session_id, thread_id, final_state: state });
            }

            let node = self
                .graph
                .nodes
                .get(&current)
                .cloned()
                .ok_or_else(|| EngineError::UnknownNode(current.clone()))?;

            let partial = match node.run(&state).await {
                Ok(partial) => partial,
                Err(source) => {
                    let message = source.to_string();
                    self.sessions.update_status(session_id, SessionStatus::Error, Some(message)).await.ok();
                    self.sessions.release_slot(permit);
                    return Err(EngineError::NodeFailed { node: current, source });
                }
            };
            state.merge(partial);

            let next = self
                .graph
                .next(&current, &state)
                .ok_or_else(|| EngineError::Internal(format!("no outgoing edge from {current}")))?;

            step += 1;

            if self.graph.interrupt_before.contains(&next) {
                state.awaiting_approval = true;
                state.stage = domain::Stage::Approval;
                let mut checkpoint = Checkpoint::new(
                    state,
                    CheckpointMetadata { source: "engine".to_string(), step, writes: serde_json::Value::Null },
                    parent_id,
                );
                checkpoint.pending_sends = serde_json::json!({ "next_node": next });
                self.checkpoints.put(session_id, thread_id, &checkpoint).await?;

                self.sessions.update_status(session_id, SessionStatus::AwaitingApproval, None).await.ok();
                self.sessions.release_slot(permit);
                return Ok(StepOutcome::AwaitingApproval { session_id, thread_id, paused_before: next });
            }

            let checkpoint = Checkpoint::new(
                state.clone(),
                CheckpointMetadata { source: "engine".to_string(), step, writes: serde_json::Value::Null },
                parent_id,
            );
            parent_id = Some(checkpoint.id);
            self.checkpoints.put(session_id, thread_id, &checkpoint).await?;

            current = next;
        }
    }
}
