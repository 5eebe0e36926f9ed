//! The run loop: walk the graph node by node until the terminal signal.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use stanceflow_core::config::EngineConfig;
use stanceflow_core::event::{EventBus, RunEvent};
use stanceflow_core::traits::{AgentInvoker, LookupTool};
use stanceflow_core::types::{RunId, RunStatus};
use stanceflow_core::StanceflowError;

use crate::graph::{Graph, Next, NodeId};
use crate::nodes::NodeRunner;
use crate::parser;
use crate::state::WorkflowState;

/// Hard ceiling on executed nodes, independent of routing. The debate turn
/// cap already bounds the loop; this guards against a future graph edit that
/// accidentally removes that bound.
fn step_limit(max_turns: usize) -> usize {
    16 + 4 * max_turns
}

/// One analysis request.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: String,
    /// Pre-seeded target; empty means the graph must extract one.
    pub target: String,
    pub max_turns: usize,
}

impl RunRequest {
    pub fn new(input: impl Into<String>, max_turns: usize) -> Self {
        Self {
            input: input.into(),
            target: String::new(),
            max_turns,
        }
    }

    /// Build a request with the configured default turn cap.
    pub fn from_config(input: impl Into<String>, config: &EngineConfig) -> Self {
        Self::new(input, config.max_turns)
    }
}

/// What a run ended with. Failed runs keep the partial state for inspection.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub status: RunStatus,
    pub state: WorkflowState,
    pub error: Option<String>,
    pub nodes_executed: usize,
}

impl RunOutcome {
    pub fn final_response(&self) -> Option<&str> {
        match self.status {
            RunStatus::Completed => Some(&self.state.final_response),
            RunStatus::Failed => None,
        }
    }
}

/// Executes runs against a fixed graph and a fixed pair of collaborators.
///
/// The executor is stateless across runs: each run owns its `WorkflowState`
/// and the collaborators are shared behind `Arc`.
pub struct Executor {
    graph: Graph,
    runner: NodeRunner,
    events: EventBus,
}

impl Executor {
    pub fn new(graph: Graph, invoker: Arc<dyn AgentInvoker>, lookup: Arc<dyn LookupTool>) -> Self {
        Self {
            graph,
            runner: NodeRunner::new(invoker, lookup),
            events: EventBus::default(),
        }
    }

    /// Subscribe to run events. Safe to call at any time; events published
    /// while no subscriber exists are dropped.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    pub async fn run(&self, request: RunRequest) -> RunOutcome {
        self.run_cancellable(request, CancellationToken::new()).await
    }

    /// Run with cooperative cancellation, checked between nodes. A node in
    /// flight finishes; its update is discarded on a cancelled run.
    pub async fn run_cancellable(
        &self,
        request: RunRequest,
        cancel: CancellationToken,
    ) -> RunOutcome {
        let run_id = RunId::new();
        let mut state = WorkflowState::new(request.input, request.target, request.max_turns);
        let mut nodes_executed = 0usize;
        let limit = step_limit(request.max_turns);

        info!(run_id = %run_id, max_turns = request.max_turns, "Run started");
        self.events.publish(RunEvent::RunStarted {
            run_id: run_id.clone(),
        });

        let mut current = self.graph.entry();
        loop {
            if cancel.is_cancelled() {
                return self.fail(run_id, state, nodes_executed, StanceflowError::Cancelled);
            }
            if nodes_executed >= limit {
                let err = StanceflowError::Graph(format!(
                    "step limit of {} reached at node {}",
                    limit, current
                ));
                return self.fail(run_id, state, nodes_executed, err);
            }

            let node = match self.graph.node(current) {
                Some(n) => *n,
                None => {
                    let err = StanceflowError::UnknownNode(current.to_string());
                    return self.fail(run_id, state, nodes_executed, err);
                }
            };

            self.events.publish(RunEvent::NodeStarted {
                run_id: run_id.clone(),
                node: current.to_string(),
            });

            let started = Instant::now();
            let output = match self.runner.run(current, &state).await {
                Ok(out) => out,
                Err(e) => return self.fail(run_id, state, nodes_executed, e),
            };
            nodes_executed += 1;

            let replaced_target = output
                .update
                .target
                .as_deref()
                .filter(|t| current == NodeId::Debate && *t != state.target)
                .map(str::to_string);
            state.apply(output.update);

            self.events.publish(RunEvent::NodeCompleted {
                run_id: run_id.clone(),
                node: current.to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
            if current == NodeId::Debate {
                self.events.publish(RunEvent::DebateTurn {
                    run_id: run_id.clone(),
                    turn: state.debate_history.len(),
                    agreed: parser::parse_debate_turn(&output.raw)
                        .ok()
                        .map(|t| t.agree),
                });
            }
            if let Some(target) = replaced_target {
                info!(run_id = %run_id, target = %target, "Target replaced mid-run");
                self.events.publish(RunEvent::TargetReplaced {
                    run_id: run_id.clone(),
                    target,
                });
            }

            let next = match node.router {
                Some(router) => router.route(&state, &output.raw),
                None => match self.graph.unconditional_next(current) {
                    Ok(next) => next,
                    Err(e) => return self.fail(run_id, state, nodes_executed, e),
                },
            };

            match next {
                Next::Node(id) => current = id,
                Next::End => break,
            }
        }

        info!(run_id = %run_id, nodes_executed, "Run completed");
        self.events.publish(RunEvent::RunCompleted {
            run_id: run_id.clone(),
            nodes_executed,
        });
        RunOutcome {
            run_id,
            status: RunStatus::Completed,
            state,
            error: None,
            nodes_executed,
        }
    }

    fn fail(
        &self,
        run_id: RunId,
        state: WorkflowState,
        nodes_executed: usize,
        err: StanceflowError,
    ) -> RunOutcome {
        if matches!(err, StanceflowError::Cancelled) {
            warn!(run_id = %run_id, "Run cancelled");
        } else {
            error!(run_id = %run_id, error = %err, "Run failed");
        }
        self.events.publish(RunEvent::RunFailed {
            run_id: run_id.clone(),
            error: err.to_string(),
        });
        RunOutcome {
            run_id,
            status: RunStatus::Failed,
            state,
            error: Some(err.to_string()),
            nodes_executed,
        }
    }
}
