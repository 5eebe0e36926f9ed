use serde::{Deserialize, Serialize};
use tracing::debug;

use super::edge::Next;
use super::node::NodeId;
use crate::parser;
use crate::state::WorkflowState;

/// The conditional routing decisions the workflow graph knows about.
///
/// Routers are pure: they inspect the state and the routing node's raw
/// output and pick a destination. They never mutate state and never fail;
/// unparsable output maps to a concrete route like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterKind {
    /// After target-type classification: implicit vs explicit extraction.
    TargetType,
    /// After a debate turn: refresh lookup, keep debating, or settle.
    DebateContinuation,
}

impl RouterKind {
    /// Pick the successor for the routing node's output.
    pub fn route(&self, state: &WorkflowState, last_output: &str) -> Next {
        match self {
            Self::TargetType => {
                // Substring match, not equality: classifier output is prose.
                if last_output.to_lowercase().contains("implicit") {
                    Next::Node(NodeId::ImplicitTarget)
                } else {
                    Next::Node(NodeId::ExplicitTarget)
                }
            }
            Self::DebateContinuation => {
                // The turn cap is checked before anything else. A model that
                // proposes a replacement target on every turn must still
                // terminate, so the cap outranks the marker.
                if state.debate_history.len() >= state.max_turns {
                    debug!(
                        turns = state.debate_history.len(),
                        max_turns = state.max_turns,
                        "Debate turn cap reached, settling stance"
                    );
                    return Next::Node(NodeId::StanceDetection);
                }

                if parser::contains_new_target(last_output) {
                    return Next::Node(NodeId::LookupRefresh);
                }

                match parser::parse_debate_turn(last_output) {
                    Ok(turn) if turn.agree => Next::Node(NodeId::StanceDetection),
                    // Disagreement without a replacement, or output we
                    // cannot parse at all: give the debate another turn.
                    _ => Next::Node(NodeId::Debate),
                }
            }
        }
    }

    /// Every destination this router can select. Used by graph validation
    /// to check the declared edges cover the router's range.
    pub fn possible_targets(&self) -> Vec<Next> {
        match self {
            Self::TargetType => vec![
                Next::Node(NodeId::ImplicitTarget),
                Next::Node(NodeId::ExplicitTarget),
            ],
            Self::DebateContinuation => vec![
                Next::Node(NodeId::StanceDetection),
                Next::Node(NodeId::LookupRefresh),
                Next::Node(NodeId::Debate),
            ],
        }
    }
}
