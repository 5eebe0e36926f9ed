//! Per-node transforms.
//!
//! Each node reads the state, calls a collaborator if it has one, and
//! returns a partial update plus its raw output. Collaborator failures
//! propagate; parse failures never do, they degrade to sentinel values so
//! the run can still settle.

use std::sync::Arc;

use tracing::{debug, warn};

use stanceflow_core::traits::{AgentInvoker, Bindings, LookupTool};
use stanceflow_core::types::{RoleId, Stance};
use stanceflow_core::{Result, StanceflowError};

use crate::graph::NodeId;
use crate::parser;
use crate::state::{StateUpdate, WorkflowState, NO_TARGET_INFO, TARGET_ERROR};

/// What a node produced: the state delta, plus the raw collaborator output
/// the router inspects.
#[derive(Debug, Default)]
pub struct NodeOutput {
    pub update: StateUpdate,
    pub raw: String,
}

/// Runs individual nodes against the shared collaborators.
pub struct NodeRunner {
    invoker: Arc<dyn AgentInvoker>,
    lookup: Arc<dyn LookupTool>,
}

impl NodeRunner {
    pub fn new(invoker: Arc<dyn AgentInvoker>, lookup: Arc<dyn LookupTool>) -> Self {
        Self { invoker, lookup }
    }

    pub async fn run(&self, id: NodeId, state: &WorkflowState) -> Result<NodeOutput> {
        match id {
            NodeId::LinguisticAnalysis => self.linguistic_analysis(state).await,
            NodeId::TargetTypeDecision => self.target_type_decision(state).await,
            NodeId::ImplicitTarget => self.identify_target(RoleId::ImplicitTarget, state).await,
            NodeId::ExplicitTarget => self.identify_target(RoleId::ExplicitTarget, state).await,
            NodeId::LookupRefresh => Ok(self.lookup_refresh(state).await),
            NodeId::Debate => self.debate(state).await,
            NodeId::StanceDetection => self.stance_detection(state).await,
            NodeId::FinalResponse => self.final_response(state).await,
        }
    }

    async fn invoke(&self, role: RoleId, bindings: Bindings) -> Result<String> {
        let raw = self.invoker.invoke(role, bindings).await?;
        if raw.trim().is_empty() {
            return Err(StanceflowError::EmptyModelResponse);
        }
        Ok(raw)
    }

    async fn linguistic_analysis(&self, state: &WorkflowState) -> Result<NodeOutput> {
        let mut bindings = Bindings::new();
        bindings.insert("input".into(), state.input.clone());
        let raw = self.invoke(RoleId::LinguisticAnalysis, bindings).await?;
        Ok(NodeOutput {
            update: StateUpdate {
                linguistic_analysis: Some(raw.trim().to_string()),
                // Entry node: any debate turns from a prior state are stale.
                reset_debate_history: true,
                ..StateUpdate::default()
            },
            raw,
        })
    }

    async fn target_type_decision(&self, state: &WorkflowState) -> Result<NodeOutput> {
        let mut bindings = Bindings::new();
        bindings.insert("input".into(), state.input.clone());
        let raw = self.invoke(RoleId::TargetTypeDecider, bindings).await?;
        // Classification only steers routing; the state is untouched.
        Ok(NodeOutput {
            update: StateUpdate::default(),
            raw,
        })
    }

    async fn identify_target(&self, role: RoleId, state: &WorkflowState) -> Result<NodeOutput> {
        let mut bindings = Bindings::new();
        bindings.insert("input".into(), state.input.clone());
        let raw = self.invoke(role, bindings).await?;

        let target = match parser::parse_target(&raw) {
            Ok(t) => t,
            Err(e) => {
                warn!(role = %role, error = %e, "Target extraction output unparsable");
                TARGET_ERROR.to_string()
            }
        };

        Ok(NodeOutput {
            update: StateUpdate {
                target: Some(target),
                ..StateUpdate::default()
            },
            raw,
        })
    }

    async fn lookup_refresh(&self, state: &WorkflowState) -> NodeOutput {
        let target_info = if state.has_usable_target() {
            self.lookup.search(state.target.clone()).await
        } else {
            debug!(target = %state.target, "No usable target, skipping lookup");
            NO_TARGET_INFO.to_string()
        };

        NodeOutput {
            raw: target_info.clone(),
            update: StateUpdate {
                target_info: Some(target_info),
                ..StateUpdate::default()
            },
        }
    }

    async fn debate(&self, state: &WorkflowState) -> Result<NodeOutput> {
        let mut bindings = Bindings::new();
        bindings.insert("input".into(), state.input.clone());
        bindings.insert("target".into(), state.target.clone());
        bindings.insert("target_info".into(), state.target_info.clone());
        bindings.insert(
            "debate_history".into(),
            if state.debate_history.is_empty() {
                "(none)".to_string()
            } else {
                state.debate_history.join("\n")
            },
        );
        let raw = self.invoke(RoleId::Debate, bindings).await?;

        let mut update = StateUpdate {
            debate_turn: Some(raw.clone()),
            ..StateUpdate::default()
        };

        // A disagreeing turn that names a replacement installs it now, so a
        // lookup-refresh route sees the new target.
        if let Ok(turn) = parser::parse_debate_turn(&raw) {
            if !turn.agree {
                if let Some(new_target) = turn.new_target {
                    debug!(target = %new_target, "Debate proposed a replacement target");
                    update.target = Some(new_target);
                }
            }
        }

        Ok(NodeOutput { update, raw })
    }

    async fn stance_detection(&self, state: &WorkflowState) -> Result<NodeOutput> {
        if !state.has_usable_target() {
            debug!(target = %state.target, "No usable target, stance is undeterminable");
            return Ok(NodeOutput {
                update: StateUpdate {
                    stance: Some(Stance::UnableToDetermine),
                    ..StateUpdate::default()
                },
                raw: String::new(),
            });
        }

        let mut bindings = Bindings::new();
        bindings.insert("input".into(), state.input.clone());
        bindings.insert("target".into(), state.target.clone());
        bindings.insert("target_info".into(), state.target_info.clone());
        let raw = self.invoke(RoleId::StanceDetection, bindings).await?;

        let stance = match parser::parse_stance(&raw) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Stance output unparsable");
                Stance::Error
            }
        };

        Ok(NodeOutput {
            update: StateUpdate {
                stance: Some(stance),
                ..StateUpdate::default()
            },
            raw,
        })
    }

    async fn final_response(&self, state: &WorkflowState) -> Result<NodeOutput> {
        let stance = state.stance.unwrap_or(Stance::Error);

        let mut bindings = Bindings::new();
        bindings.insert(
            "linguistic_analysis".into(),
            state.linguistic_analysis.clone(),
        );
        bindings.insert("target".into(), state.target.clone());
        bindings.insert("stance".into(), stance.as_str().to_string());
        let raw = self.invoke(RoleId::FinalResponse, bindings).await?;

        // Re-emit canonically when the model cooperated; otherwise build the
        // markup from state so the run always ends with a well-formed answer.
        let final_response = match parser::parse_final_response(&raw) {
            Ok(verdict) => format!(
                "<target>{}</target>\n<stance>{}</stance>",
                verdict.target, verdict.stance
            ),
            Err(e) => {
                warn!(error = %e, "Final response markup missing, synthesizing from state");
                format!(
                    "<target>{}</target>\n<stance>{}</stance>",
                    state.target,
                    stance.as_str()
                )
            }
        };

        Ok(NodeOutput {
            update: StateUpdate {
                final_response: Some(final_response),
                ..StateUpdate::default()
            },
            raw,
        })
    }
}
