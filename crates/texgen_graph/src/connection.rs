// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.
//!
//! A connection is stored redundantly in both endpoint nodes' connection
//! lists, so either side can enumerate its neighbors without scanning the
//! whole graph. Two records are the same connection when all four fields
//! match.

use crate::node::NodeId;

/// A connection from a producer's output slot to a consumer's input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Consumer node
    pub input_node: NodeId,
    /// Consumer slot name
    pub input_slot: &'static str,
    /// Producer node
    pub output_node: NodeId,
    /// Producer slot name
    pub output_slot: &'static str,
}

impl Connection {
    /// Create a new connection
    pub fn new(
        input_node: NodeId,
        input_slot: &'static str,
        output_node: NodeId,
        output_slot: &'static str,
    ) -> Self {
        Self {
            input_node,
            input_slot,
            output_node,
            output_slot,
        }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.input_node == node_id || self.output_node == node_id
    }

    /// Whether this connection feeds `slot` of `node_id`
    pub fn feeds(&self, node_id: NodeId, slot: &str) -> bool {
        self.input_node == node_id && self.input_slot == slot
    }

    /// The endpoint that is not `node_id`
    pub fn other_endpoint(&self, node_id: NodeId) -> NodeId {
        if self.output_node == node_id {
            self.input_node
        } else {
            self.output_node
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = NodeId::from_raw(0, 0);
        let b = NodeId::from_raw(1, 0);
        let c1 = Connection::new(b, "Input", a, "Output");
        let c2 = Connection::new(b, "Input", a, "Output");
        assert_eq!(c1, c2);
        assert_ne!(c1, Connection::new(b, "Input", a, "Other"));
        assert_ne!(c1, Connection::new(b, "Input", NodeId::from_raw(0, 1), "Output"));
    }

    #[test]
    fn test_endpoints() {
        let a = NodeId::from_raw(0, 0);
        let b = NodeId::from_raw(1, 0);
        let connection = Connection::new(b, "Input", a, "Output");
        assert!(connection.involves_node(a));
        assert!(connection.feeds(b, "Input"));
        assert!(!connection.feeds(a, "Input"));
        assert_eq!(connection.other_endpoint(a), b);
        assert_eq!(connection.other_endpoint(b), a);
    }
}
