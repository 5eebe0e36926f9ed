use serde::{Deserialize, Serialize};

use super::node::NodeId;
use super::router::RouterKind;

/// Where an edge leads: another node, or run termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Next {
    Node(NodeId),
    End,
}

/// When an edge is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCondition {
    /// The only edge out of a non-routing node.
    Always,
    /// Taken when the named router selects this edge's destination.
    Routed(RouterKind),
}

/// A directed edge in the workflow graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: Next,
    pub condition: EdgeCondition,
}

impl Edge {
    pub fn always(from: NodeId, to: Next) -> Self {
        Self {
            from,
            to,
            condition: EdgeCondition::Always,
        }
    }

    pub fn routed(from: NodeId, to: Next, router: RouterKind) -> Self {
        Self {
            from,
            to,
            condition: EdgeCondition::Routed(router),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_builders() {
        let e = Edge::always(NodeId::LinguisticAnalysis, Next::Node(NodeId::ExplicitTarget));
        assert_eq!(e.condition, EdgeCondition::Always);

        let r = Edge::routed(
            NodeId::Debate,
            Next::Node(NodeId::StanceDetection),
            RouterKind::DebateContinuation,
        );
        assert!(matches!(r.condition, EdgeCondition::Routed(_)));
    }
}
