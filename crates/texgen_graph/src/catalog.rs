// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of node factories, keyed by the name shown to users.

use crate::node::{Node, NodeKind};
use indexmap::IndexMap;

/// Zero-argument factory producing a default-initialized node
pub type NodeFactory = fn() -> Node;

/// Name → factory registry. Iteration follows registration order.
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    factories: IndexMap<String, NodeFactory>,
}

impl NodeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in kind
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.register("Scalar", || Node::new(NodeKind::Scalar));
        catalog.register("Vector2", || Node::new(NodeKind::Vector2));
        catalog.register("Vector4", || Node::new(NodeKind::Vector4));
        catalog.register("Loop", || Node::new(NodeKind::Loop));
        catalog.register("Rectangle", || Node::new(NodeKind::Rectangle));
        catalog.register("SineDist", || Node::new(NodeKind::SineDistortion));
        catalog.register("EnvironmentMap", || Node::new(NodeKind::EnvironmentMap));
        catalog.register("Output", || Node::new(NodeKind::Output));
        catalog
    }

    /// Register (or replace) a factory
    pub fn register(&mut self, name: impl Into<String>, factory: NodeFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            tracing::debug!("Replaced node factory '{name}'");
        }
    }

    /// Look up a factory
    pub fn get(&self, name: &str) -> Option<NodeFactory> {
        self.factories.get(name).copied()
    }

    /// Build a node by name
    pub fn create(&self, name: &str) -> Option<Node> {
        self.get(name).map(|factory| factory())
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
