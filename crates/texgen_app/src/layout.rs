// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saving and restoring graph layouts as RON.
//!
//! Nodes are stored by catalog name and referenced by their position in the
//! node list, so a layout does not depend on arena ids.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use texgen_graph::{Backend, GeneratorConfig, NodeId, SlotValue, TextureGraph};

/// Current layout format version
pub const LAYOUT_FORMAT_VERSION: u32 = 1;

/// Literal held by a value node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    /// Scalar
    Scalar(f32),
    /// 2D vector
    Vector2([f32; 2]),
    /// 4D vector
    Vector4([f32; 4]),
}

impl LiteralValue {
    fn from_slot_value(value: SlotValue) -> Option<Self> {
        match value {
            SlotValue::Scalar(v) => Some(Self::Scalar(v)),
            SlotValue::Vector2(v) => Some(Self::Vector2(v)),
            SlotValue::Vector4(v) => Some(Self::Vector4(v)),
            SlotValue::Texture(_) => None,
        }
    }

    fn to_slot_value(self) -> SlotValue {
        match self {
            Self::Scalar(v) => SlotValue::Scalar(v),
            Self::Vector2(v) => SlotValue::Vector2(v),
            Self::Vector4(v) => SlotValue::Vector4(v),
        }
    }
}

/// One saved node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    /// Catalog name
    pub kind: String,
    /// Display title
    pub title: String,
    /// Canvas position
    pub position: [f32; 2],
    /// Literal, for value nodes
    #[serde(default)]
    pub value: Option<LiteralValue>,
}

/// One saved connection, by node index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionLayout {
    /// Consumer node index
    pub consumer: usize,
    /// Consumer input slot
    pub input: String,
    /// Producer node index
    pub producer: usize,
    /// Producer output slot
    pub output: String,
}

/// A saved graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLayout {
    /// Format version
    pub version: u32,
    /// Nodes
    pub nodes: Vec<NodeLayout>,
    /// Connections
    #[serde(default)]
    pub connections: Vec<ConnectionLayout>,
    /// Index of the entry point node
    #[serde(default)]
    pub entry_point: Option<usize>,
}

impl GraphLayout {
    /// Snapshot the structure of a graph
    pub fn capture(graph: &TextureGraph) -> Self {
        let mut indices = HashMap::new();
        let mut nodes = Vec::new();
        for (id, node) in graph.nodes() {
            indices.insert(id, nodes.len());
            nodes.push(NodeLayout {
                kind: node.kind().title().to_string(),
                title: node.title.clone(),
                position: node.position,
                value: node.value().and_then(LiteralValue::from_slot_value),
            });
        }

        let connections = graph
            .connections()
            .filter_map(|c| {
                Some(ConnectionLayout {
                    consumer: *indices.get(&c.input_node)?,
                    input: c.input_slot.to_string(),
                    producer: *indices.get(&c.output_node)?,
                    output: c.output_slot.to_string(),
                })
            })
            .collect();

        Self {
            version: LAYOUT_FORMAT_VERSION,
            nodes,
            connections,
            entry_point: graph.entry_point().and_then(|id| indices.get(&id).copied()),
        }
    }

    /// Build a graph from this layout.
    ///
    /// Without a saved entry point the last Output node becomes the entry
    /// point, as when nodes are created interactively. On error every node
    /// created so far is released.
    pub fn build(&self, config: GeneratorConfig, backend: &mut dyn Backend) -> Result<TextureGraph> {
        let mut graph = TextureGraph::new(config);
        if let Err(e) = self.populate(&mut graph, backend) {
            graph.shutdown(backend);
            return Err(e);
        }
        tracing::info!(
            "Built graph with {} nodes and {} connections from layout",
            graph.node_count(),
            graph.connection_count()
        );
        Ok(graph)
    }

    fn populate(&self, graph: &mut TextureGraph, backend: &mut dyn Backend) -> Result<()> {
        let mut ids: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for saved in &self.nodes {
            let id = graph.add_node_by_name(backend, &saved.kind)?;
            if let Some(node) = graph.node_mut(id) {
                node.title.clone_from(&saved.title);
                node.position = saved.position;
            }
            if let Some(value) = saved.value {
                graph.set_value(id, value.to_slot_value())?;
            }
            ids.push(id);
        }

        let lookup = |index: usize| {
            ids.get(index)
                .copied()
                .ok_or_else(|| AppError::InvalidLayout(format!("no node at index {index}")))
        };

        for saved in &self.connections {
            let consumer = lookup(saved.consumer)?;
            let producer = lookup(saved.producer)?;
            graph
                .connect(consumer, &saved.input, producer, &saved.output)
                .map_err(|e| AppError::InvalidLayout(e.to_string()))?;
        }

        if let Some(index) = self.entry_point {
            graph.set_entry_point(lookup(index)?)?;
        }
        Ok(())
    }

    /// Load a layout from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let layout: GraphLayout = ron::from_str(&content).map_err(|e| AppError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if layout.version > LAYOUT_FORMAT_VERSION {
            return Err(AppError::InvalidLayout(format!(
                "layout version {} is newer than supported version {}",
                layout.version, LAYOUT_FORMAT_VERSION
            )));
        }
        Ok(layout)
    }

    /// Save the layout to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texgen_graph::{HeadlessBackend, Node, NodeKind};

    fn default_layout(backend: &mut HeadlessBackend) -> GraphLayout {
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), backend);
        let layout = GraphLayout::capture(&graph);
        graph.shutdown(backend);
        layout
    }

    #[test]
    fn test_capture_default_graph() {
        let mut backend = HeadlessBackend::new();
        let layout = default_layout(&mut backend);

        let kinds: Vec<_> = layout.nodes.iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds, ["Vector4", "Scalar", "Rectangle", "Output"]);
        assert_eq!(layout.nodes[0].value, Some(LiteralValue::Vector4([0.75, 0.5, 0.5, 1.0])));
        assert_eq!(layout.nodes[2].value, None);
        assert_eq!(layout.connections.len(), 3);
        assert_eq!(layout.entry_point, Some(3));
    }

    #[test]
    fn test_build_restores_structure() {
        let mut backend = HeadlessBackend::new();
        let layout = default_layout(&mut backend);
        let graph = layout.build(GeneratorConfig::default(), &mut backend).unwrap();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.connection_count(), 3);
        let kinds: Vec<_> = graph
            .evaluation_order()
            .into_iter()
            .filter_map(|id| graph.node(id).map(Node::kind))
            .collect();
        assert_eq!(
            kinds,
            [NodeKind::Vector4, NodeKind::Scalar, NodeKind::Rectangle, NodeKind::Output]
        );
        assert_eq!(GraphLayout::capture(&graph), layout);
    }

    #[test]
    fn test_file_roundtrip() {
        let mut backend = HeadlessBackend::new();
        let layout = default_layout(&mut backend);
        let path = std::env::temp_dir().join(format!("texgen-layout-{}.ron", std::process::id()));

        layout.save(&path).unwrap();
        assert_eq!(GraphLayout::load(&path).unwrap(), layout);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_bad_index_releases_nodes() {
        let mut backend = HeadlessBackend::new();
        let mut layout = default_layout(&mut backend);
        layout.connections[0].producer = 42;

        let err = layout.build(GeneratorConfig::default(), &mut backend).unwrap_err();
        assert!(matches!(err, AppError::InvalidLayout(_)));
        assert_eq!(backend.live_total(), 0);
    }

    #[test]
    fn test_unknown_kind() {
        let mut backend = HeadlessBackend::new();
        let mut layout = default_layout(&mut backend);
        layout.nodes[1].kind = "Mesh".to_string();

        let err = layout.build(GeneratorConfig::default(), &mut backend).unwrap_err();
        assert!(matches!(err, AppError::Graph(_)));
        assert_eq!(backend.live_total(), 0);
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut backend = HeadlessBackend::new();
        let mut layout = default_layout(&mut backend);
        layout.version = LAYOUT_FORMAT_VERSION + 1;
        let path = std::env::temp_dir().join(format!("texgen-layout-new-{}.ron", std::process::id()));

        layout.save(&path).unwrap();
        assert!(matches!(GraphLayout::load(&path), Err(AppError::InvalidLayout(_))));
        std::fs::remove_file(&path).unwrap();
    }
}
