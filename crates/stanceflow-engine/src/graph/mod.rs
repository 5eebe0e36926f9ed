//! The workflow graph: nodes, edges, and conditional routers.
//!
//! A graph is static data validated at construction. The executor walks
//! it one node at a time: run the node, then follow either the node's
//! single unconditional edge or its router's decision.

pub mod edge;
pub mod node;
pub mod router;

pub use edge::{Edge, EdgeCondition, Next};
pub use node::{Node, NodeId};
pub use router::RouterKind;

use stanceflow_core::{Result, StanceflowError};

/// A validated workflow graph.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    entry: NodeId,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>, entry: NodeId) -> Result<Self> {
        let graph = Self { nodes, edges, entry };
        graph.validate()?;
        Ok(graph)
    }

    /// The full analysis pipeline with the debate loop.
    ///
    /// Entry -> analysis -> target-type routing -> target extraction ->
    /// lookup -> debate loop (re-lookup on replacement targets) -> stance ->
    /// final response.
    pub fn debate() -> Self {
        let nodes = vec![
            Node::plain(NodeId::LinguisticAnalysis),
            Node::routing(NodeId::TargetTypeDecision, RouterKind::TargetType),
            Node::plain(NodeId::ImplicitTarget),
            Node::plain(NodeId::ExplicitTarget),
            Node::plain(NodeId::LookupRefresh),
            Node::routing(NodeId::Debate, RouterKind::DebateContinuation),
            Node::plain(NodeId::StanceDetection),
            Node::plain(NodeId::FinalResponse),
        ];
        let edges = vec![
            Edge::always(
                NodeId::LinguisticAnalysis,
                Next::Node(NodeId::TargetTypeDecision),
            ),
            Edge::routed(
                NodeId::TargetTypeDecision,
                Next::Node(NodeId::ImplicitTarget),
                RouterKind::TargetType,
            ),
            Edge::routed(
                NodeId::TargetTypeDecision,
                Next::Node(NodeId::ExplicitTarget),
                RouterKind::TargetType,
            ),
            Edge::always(NodeId::ImplicitTarget, Next::Node(NodeId::LookupRefresh)),
            Edge::always(NodeId::ExplicitTarget, Next::Node(NodeId::LookupRefresh)),
            Edge::always(NodeId::LookupRefresh, Next::Node(NodeId::Debate)),
            Edge::routed(
                NodeId::Debate,
                Next::Node(NodeId::LookupRefresh),
                RouterKind::DebateContinuation,
            ),
            Edge::routed(
                NodeId::Debate,
                Next::Node(NodeId::Debate),
                RouterKind::DebateContinuation,
            ),
            Edge::routed(
                NodeId::Debate,
                Next::Node(NodeId::StanceDetection),
                RouterKind::DebateContinuation,
            ),
            Edge::always(NodeId::StanceDetection, Next::Node(NodeId::FinalResponse)),
            Edge::always(NodeId::FinalResponse, Next::End),
        ];
        let graph = Self {
            nodes,
            edges,
            entry: NodeId::LinguisticAnalysis,
        };
        debug_assert!(graph.validate().is_ok());
        graph
    }

    /// The straight-line variant: no debate, one pass to a verdict.
    pub fn direct() -> Self {
        let nodes = vec![
            Node::plain(NodeId::LinguisticAnalysis),
            Node::plain(NodeId::ExplicitTarget),
            Node::plain(NodeId::LookupRefresh),
            Node::plain(NodeId::StanceDetection),
            Node::plain(NodeId::FinalResponse),
        ];
        let edges = vec![
            Edge::always(NodeId::LinguisticAnalysis, Next::Node(NodeId::ExplicitTarget)),
            Edge::always(NodeId::ExplicitTarget, Next::Node(NodeId::LookupRefresh)),
            Edge::always(NodeId::LookupRefresh, Next::Node(NodeId::StanceDetection)),
            Edge::always(NodeId::StanceDetection, Next::Node(NodeId::FinalResponse)),
            Edge::always(NodeId::FinalResponse, Next::End),
        ];
        let graph = Self {
            nodes,
            edges,
            entry: NodeId::LinguisticAnalysis,
        };
        debug_assert!(graph.validate().is_ok());
        graph
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The destination of a non-routing node's single `Always` edge.
    pub fn unconditional_next(&self, from: NodeId) -> Result<Next> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.condition == EdgeCondition::Always)
            .map(|e| e.to)
            .ok_or_else(|| {
                StanceflowError::Graph(format!("node {} has no unconditional edge", from))
            })
    }

    fn contains(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(StanceflowError::Graph("graph has no nodes".into()));
        }
        if !self.contains(self.entry) {
            return Err(StanceflowError::Graph(format!(
                "entry node {} is not in the graph",
                self.entry
            )));
        }

        for edge in &self.edges {
            if !self.contains(edge.from) {
                return Err(StanceflowError::Graph(format!(
                    "edge source {} is not in the graph",
                    edge.from
                )));
            }
            if let Next::Node(to) = edge.to {
                if !self.contains(to) {
                    return Err(StanceflowError::Graph(format!(
                        "edge destination {} is not in the graph",
                        to
                    )));
                }
            }
        }

        for node in &self.nodes {
            match node.router {
                None => {
                    let always: Vec<_> = self
                        .edges
                        .iter()
                        .filter(|e| e.from == node.id && e.condition == EdgeCondition::Always)
                        .collect();
                    if always.len() != 1 {
                        return Err(StanceflowError::Graph(format!(
                            "node {} must have exactly one unconditional edge, found {}",
                            node.id,
                            always.len()
                        )));
                    }
                }
                Some(router) => {
                    // Every destination the router can pick must be declared.
                    for target in router.possible_targets() {
                        let declared = self.edges.iter().any(|e| {
                            e.from == node.id
                                && e.to == target
                                && e.condition == EdgeCondition::Routed(router)
                        });
                        if !declared {
                            return Err(StanceflowError::Graph(format!(
                                "router on {} can select an undeclared destination",
                                node.id
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_graphs_validate() {
        let debate = Graph::debate();
        assert_eq!(debate.entry(), NodeId::LinguisticAnalysis);
        assert!(debate.node(NodeId::Debate).unwrap().router.is_some());

        let direct = Graph::direct();
        assert_eq!(
            direct.unconditional_next(NodeId::FinalResponse).unwrap(),
            Next::End
        );
    }

    #[test]
    fn test_unknown_entry_rejected() {
        let nodes = vec![Node::plain(NodeId::Debate)];
        let edges = vec![Edge::always(NodeId::Debate, Next::End)];
        let err = Graph::new(nodes, edges, NodeId::LinguisticAnalysis).unwrap_err();
        assert!(matches!(err, StanceflowError::Graph(_)));
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let nodes = vec![Node::plain(NodeId::LinguisticAnalysis)];
        let edges = vec![Edge::always(
            NodeId::LinguisticAnalysis,
            Next::Node(NodeId::Debate),
        )];
        assert!(Graph::new(nodes, edges, NodeId::LinguisticAnalysis).is_err());
    }

    #[test]
    fn test_plain_node_needs_exactly_one_edge() {
        let nodes = vec![Node::plain(NodeId::LinguisticAnalysis)];
        assert!(Graph::new(nodes, vec![], NodeId::LinguisticAnalysis).is_err());

        let nodes = vec![Node::plain(NodeId::LinguisticAnalysis)];
        let edges = vec![
            Edge::always(NodeId::LinguisticAnalysis, Next::End),
            Edge::always(NodeId::LinguisticAnalysis, Next::End),
        ];
        assert!(Graph::new(nodes, edges, NodeId::LinguisticAnalysis).is_err());
    }

    #[test]
    fn test_router_range_must_be_declared() {
        // Debate router can pick three destinations; declare only one.
        let nodes = vec![
            Node::routing(NodeId::Debate, RouterKind::DebateContinuation),
            Node::plain(NodeId::StanceDetection),
        ];
        let edges = vec![
            Edge::routed(
                NodeId::Debate,
                Next::Node(NodeId::StanceDetection),
                RouterKind::DebateContinuation,
            ),
            Edge::always(NodeId::StanceDetection, Next::End),
        ];
        assert!(Graph::new(nodes, edges, NodeId::Debate).is_err());
    }
}
