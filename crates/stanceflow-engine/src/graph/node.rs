use serde::{Deserialize, Serialize};

use super::router::RouterKind;

/// Identifier of a unit of work in the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    LinguisticAnalysis,
    TargetTypeDecision,
    ImplicitTarget,
    ExplicitTarget,
    LookupRefresh,
    Debate,
    StanceDetection,
    FinalResponse,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinguisticAnalysis => "linguistic_analysis",
            Self::TargetTypeDecision => "target_type_decision",
            Self::ImplicitTarget => "implicit_target",
            Self::ExplicitTarget => "explicit_target",
            Self::LookupRefresh => "lookup_refresh",
            Self::Debate => "debate",
            Self::StanceDetection => "stance_detection",
            Self::FinalResponse => "final_response",
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the workflow graph.
///
/// The node table is plain data: the transform logic lives in the node
/// runner, keyed by id, and the routing logic lives in `RouterKind`. A node
/// carrying a router decides its successor; all other nodes follow their
/// single unconditional edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// The routing decision this node owns, if any.
    #[serde(default)]
    pub router: Option<RouterKind>,
}

impl Node {
    pub fn plain(id: NodeId) -> Self {
        Self { id, router: None }
    }

    pub fn routing(id: NodeId, router: RouterKind) -> Self {
        Self {
            id,
            router: Some(router),
        }
    }
}
