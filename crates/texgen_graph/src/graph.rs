// SPDX-License-Identifier: MIT OR Apache-2.0
//! The texture graph: node arena, connections, entry point and dirty tracking.

use crate::backend::{Backend, RenderTarget};
use crate::catalog::NodeCatalog;
use crate::config::GeneratorConfig;
use crate::connection::Connection;
use crate::node::{Node, NodeId, NodeKind, NodeState};
use crate::slot::{InputValue, SlotValue};
use std::collections::HashSet;

#[derive(Debug, Default)]
struct Entry {
    generation: u32,
    node: Option<Node>,
}

/// A procedural texture graph.
///
/// Nodes live in an arena addressed by [`NodeId`]. Freed slots are reused with
/// a bumped generation, so stale ids (including a stale entry point) resolve
/// to nothing instead of to an unrelated node.
#[derive(Debug)]
pub struct TextureGraph {
    entries: Vec<Entry>,
    free: Vec<u32>,
    catalog: NodeCatalog,
    config: GeneratorConfig,
    entry_point: Option<NodeId>,
    dirty: bool,
    output_updated: bool,
}

impl TextureGraph {
    /// Create an empty graph
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            catalog: NodeCatalog::standard(),
            config,
            entry_point: None,
            dirty: false,
            output_updated: false,
        }
    }

    /// Create the starter graph: a rectangle fed by a Vector4 and a Scalar,
    /// published through an Output node.
    pub fn with_default_layout(config: GeneratorConfig, backend: &mut dyn Backend) -> Self {
        let mut graph = Self::new(config);

        let position = graph.insert_node(
            backend,
            Node::new(NodeKind::Vector4)
                .with_position(-300.0, 350.0)
                .with_value(SlotValue::Vector4([0.75, 0.5, 0.5, 1.0])),
        );
        let chamfer = graph.insert_node(
            backend,
            Node::new(NodeKind::Scalar).with_position(-300.0, 450.0),
        );
        let rectangle = graph.insert_node(
            backend,
            Node::new(NodeKind::Rectangle).with_position(100.0, 400.0),
        );
        let output = graph.insert_node(
            backend,
            Node::new(NodeKind::Output).with_position(500.0, 400.0),
        );

        let links = [
            (rectangle, "Position", position),
            (rectangle, "Chamfer", chamfer),
            (output, "Input", rectangle),
        ];
        for (consumer, slot, producer) in links {
            if let Err(e) = graph.connect(consumer, slot, producer, "Output") {
                tracing::warn!("Default layout connection failed: {e}");
            }
        }

        tracing::info!("Created default texture graph with {} nodes", graph.node_count());
        graph
    }

    /// Generator settings
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Node catalog used by [`add_node_by_name`](Self::add_node_by_name)
    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    /// Initialize and insert a node.
    ///
    /// Resource creation failures are logged and leave the node in the graph
    /// in a non-renderable state. Inserting an Output node makes it the entry
    /// point.
    pub fn insert_node(&mut self, backend: &mut dyn Backend, mut node: Node) -> NodeId {
        if let Err(e) = node.initialize(&self.config, backend) {
            tracing::warn!("Node '{}' is not renderable: {e}", node.title);
        }
        let is_output = node.kind() == NodeKind::Output;

        let id = match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.node = Some(node);
                NodeId::from_raw(index, entry.generation)
            }
            None => {
                let index = self.entries.len() as u32;
                self.entries.push(Entry {
                    generation: 0,
                    node: Some(node),
                });
                NodeId::from_raw(index, 0)
            }
        };

        if is_output {
            self.entry_point = Some(id);
        }
        self.dirty = true;
        tracing::debug!("Inserted node {id}");
        id
    }

    /// Create and insert a default node of `kind`
    pub fn add_node(&mut self, backend: &mut dyn Backend, kind: NodeKind) -> NodeId {
        self.insert_node(backend, Node::new(kind))
    }

    /// Create and insert a node through the catalog
    pub fn add_node_by_name(
        &mut self,
        backend: &mut dyn Backend,
        name: &str,
    ) -> Result<NodeId, GraphError> {
        let node = self
            .catalog
            .create(name)
            .ok_or_else(|| GraphError::UnknownKind(name.to_string()))?;
        Ok(self.insert_node(backend, node))
    }

    /// Delete a node.
    ///
    /// Every connection touching the node is first removed from the other
    /// endpoint, then from the node itself, then the node's resources are
    /// released and its slot is freed.
    pub fn delete_node(&mut self, backend: &mut dyn Backend, id: NodeId) -> Result<(), GraphError> {
        let connections = self
            .node_mut(id)
            .ok_or(GraphError::NodeNotFound(id))?
            .clear_connections();

        for connection in &connections {
            let other = connection.other_endpoint(id);
            if let Some(node) = self.node_mut(other) {
                node.delete_connection(connection);
            }
        }

        let entry = &mut self.entries[id.index() as usize];
        let mut released = RenderTarget::default();
        if let Some(mut node) = entry.node.take() {
            if node.kind() != NodeKind::Output {
                released = node.render_target();
            }
            node.destroy(backend);
            tracing::debug!("Deleted node {id} ('{}')", node.title);
        }
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index());

        if self.entry_point == Some(id) {
            self.entry_point = None;
        }
        if released.is_valid() {
            self.forget_published(released);
        }
        self.dirty = true;
        Ok(())
    }

    /// Clear every Output still publishing a target that was just destroyed
    fn forget_published(&mut self, released: RenderTarget) {
        let entry_point = self.entry_point();
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let Some(node) = entry.node.as_mut() else {
                continue;
            };
            if let NodeState::Output(output) = node.state_mut() {
                if output.published.handle == released.handle {
                    output.published = RenderTarget::default();
                    let id = NodeId::from_raw(index as u32, entry.generation);
                    tracing::debug!("Output {id} lost its published texture");
                    if entry_point == Some(id) {
                        self.output_updated = true;
                    }
                }
            }
        }
    }

    /// Delete every selected node; returns how many were deleted
    pub fn delete_selected(&mut self, backend: &mut dyn Backend) -> usize {
        let selected: Vec<_> = self
            .nodes()
            .filter(|(_, node)| node.selected)
            .map(|(id, _)| id)
            .collect();
        for id in &selected {
            if let Err(e) = self.delete_node(backend, *id) {
                tracing::warn!("{e}");
            }
        }
        selected.len()
    }

    /// Connect `producer.output_slot` to `consumer.input_slot`.
    ///
    /// The record is appended to both endpoints. Value categories are not
    /// checked; binding an already-bound input adds a second record and lookups
    /// keep returning the first one.
    pub fn connect(
        &mut self,
        consumer: NodeId,
        input_slot: &str,
        producer: NodeId,
        output_slot: &str,
    ) -> Result<Connection, ConnectionError> {
        if consumer == producer {
            return Err(ConnectionError::SelfLoop);
        }

        let consumer_node = self
            .node(consumer)
            .ok_or(ConnectionError::NodeNotFound(consumer))?;
        let producer_node = self
            .node(producer)
            .ok_or(ConnectionError::NodeNotFound(producer))?;

        let input = consumer_node
            .input(input_slot)
            .ok_or_else(|| ConnectionError::SlotNotFound(input_slot.to_string()))?;
        let output = producer_node
            .output(output_slot)
            .ok_or_else(|| ConnectionError::SlotNotFound(output_slot.to_string()))?;

        let connection = Connection::new(consumer, input.name, producer, output.name);
        if let Some(node) = self.node_mut(consumer) {
            node.push_connection(connection);
        }
        if let Some(node) = self.node_mut(producer) {
            node.push_connection(connection);
        }

        self.dirty = true;
        tracing::debug!(
            "Connected {producer}.{} -> {consumer}.{}",
            output.name,
            input.name
        );
        Ok(connection)
    }

    /// Remove a connection from both endpoints; returns whether it existed
    pub fn disconnect(&mut self, connection: &Connection) -> bool {
        let mut removed = false;
        for id in [connection.input_node, connection.output_node] {
            if let Some(node) = self.node_mut(id) {
                removed |= node.delete_connection(connection);
            }
        }
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Get a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.entries
            .get(id.index() as usize)
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.node.as_ref())
    }

    /// Get a node mutably.
    ///
    /// Changing a literal through this bypasses dirty tracking; use
    /// [`set_value`](Self::set_value) for that.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.entries
            .get_mut(id.index() as usize)
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.node.as_mut())
    }

    /// All live nodes with their ids
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            entry
                .node
                .as_ref()
                .map(|node| (NodeId::from_raw(index as u32, entry.generation), node))
        })
    }

    /// All live node ids
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().map(|(id, _)| id)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.entries.iter().filter(|e| e.node.is_some()).count()
    }

    /// Every connection once, taken from the producer side
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.nodes().flat_map(|(id, node)| {
            node.connections()
                .iter()
                .filter(move |c| c.output_node == id)
        })
    }

    /// Number of distinct connection records
    pub fn connection_count(&self) -> usize {
        self.connections().count()
    }

    /// The node bound to `node.slot`, with the connection that binds it.
    ///
    /// Only records whose consumer side is `node` count. A record pointing at
    /// a dead producer is treated like an unbound input.
    pub fn producer_for_input(&self, node: NodeId, slot: &str) -> Option<(&Connection, &Node)> {
        let connection = self
            .node(node)?
            .connections()
            .iter()
            .find(|c| c.feeds(node, slot))?;
        let producer = self.node(connection.output_node)?;
        Some((connection, producer))
    }

    /// Current value flowing into `node.slot`
    pub fn input_value(&self, node: NodeId, slot: &str) -> Option<SlotValue> {
        let (connection, producer) = self.producer_for_input(node, slot)?;
        producer.output_value(connection.output_slot)
    }

    /// Value of an input as `T`, or `default` when unbound or of another category
    pub fn resolve_input<T: InputValue>(&self, node: NodeId, slot: &str, default: T) -> T {
        let Some(value) = self.input_value(node, slot) else {
            return default;
        };
        T::from_slot_value(value).unwrap_or_else(|| {
            tracing::debug!(
                "Input {node}.{slot} expects {} but receives {}, using the default",
                T::CATEGORY.label(),
                value.category().label()
            );
            default
        })
    }

    /// Change a value node's literal; marks the graph dirty when it changed
    pub fn set_value(&mut self, id: NodeId, value: SlotValue) -> Result<bool, GraphError> {
        let changed = self
            .node_mut(id)
            .ok_or(GraphError::NodeNotFound(id))?
            .set_value(value);
        if changed {
            self.dirty = true;
        }
        Ok(changed)
    }

    /// The entry point, if it is still alive
    pub fn entry_point(&self) -> Option<NodeId> {
        self.entry_point.filter(|id| self.node(*id).is_some())
    }

    /// Make an Output node the entry point
    pub fn set_entry_point(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.node(id).ok_or(GraphError::NodeNotFound(id))?;
        if node.kind() != NodeKind::Output {
            return Err(GraphError::NotAnOutput(id));
        }
        self.entry_point = Some(id);
        self.dirty = true;
        Ok(())
    }

    /// Whether the graph changed since the last pass
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Texture published by the entry point (empty without one)
    pub fn published_output(&self) -> RenderTarget {
        self.entry_point()
            .and_then(|id| self.node(id))
            .map(Node::render_target)
            .unwrap_or_default()
    }

    /// Read and clear the output-updated flag
    pub fn consume_output_updated(&mut self) -> bool {
        std::mem::take(&mut self.output_updated)
    }

    pub(crate) fn finish_pass(&mut self, published: bool) {
        self.dirty = false;
        self.output_updated |= published;
    }

    /// Producers bound to the declared inputs of `id`, in declaration order
    fn producers(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        node.inputs()
            .iter()
            .filter_map(|slot| self.producer_for_input(id, slot.name))
            .map(|(connection, _)| connection.output_node)
            .collect()
    }

    /// Walk the graph from the entry point, producers before consumers.
    ///
    /// Each reachable node is passed to `callback` exactly once, after every
    /// node feeding its inputs. Only producer edges are followed, so nodes that
    /// merely consume from the reachable set are not visited. An edge back to a
    /// node still on the current path is ignored. Returns `false` when there is
    /// no entry point.
    pub fn visit(&self, mut callback: impl FnMut(NodeId, &Node)) -> bool {
        let Some(root) = self.entry_point() else {
            return false;
        };

        let mut stack = vec![(root, false)];
        let mut on_path = HashSet::new();
        let mut finalized = HashSet::new();

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                on_path.remove(&id);
                finalized.insert(id);
                if let Some(node) = self.node(id) {
                    callback(id, node);
                }
                continue;
            }
            if finalized.contains(&id) || on_path.contains(&id) {
                continue;
            }

            on_path.insert(id);
            stack.push((id, true));
            for producer in self.producers(id).into_iter().rev() {
                if on_path.contains(&producer) {
                    tracing::debug!("Ignoring cyclic edge {producer} -> {id}");
                } else if !finalized.contains(&producer) {
                    stack.push((producer, false));
                }
            }
        }
        true
    }

    /// The order [`visit`](Self::visit) finalizes nodes in
    pub fn evaluation_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.visit(|id, _| order.push(id));
        order
    }

    /// Release every node's GPU resources and empty the graph.
    ///
    /// Arena slots are kept with bumped generations, so ids handed out before
    /// shutdown never resolve to nodes inserted afterwards.
    pub fn shutdown(&mut self, backend: &mut dyn Backend) {
        let count = self.node_count();
        self.free.clear();
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if let Some(mut node) = entry.node.take() {
                node.destroy(backend);
            }
            entry.generation = entry.generation.wrapping_add(1);
            self.free.push(index as u32);
        }
        self.entry_point = None;
        self.dirty = false;
        self.output_updated = false;
        tracing::info!("Texture graph shut down ({count} nodes released)");
    }
}

impl Default for TextureGraph {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Slot not declared on the node
    #[error("Slot not found: {0}")]
    SlotNotFound(String),

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,
}

/// Error from a graph operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// No entry point is set
    #[error("Graph has no entry point")]
    MissingEntryPoint,

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Entry point must be an Output node
    #[error("Node {0} is not an Output node")]
    NotAnOutput(NodeId),

    /// Catalog has no factory with this name
    #[error("Unknown node kind: {0}")]
    UnknownKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessBackend, ResourceKind};

    fn occurrences(graph: &TextureGraph, connection: &Connection) -> usize {
        graph
            .nodes()
            .map(|(_, node)| node.connections().iter().filter(|c| *c == connection).count())
            .sum()
    }

    fn references(graph: &TextureGraph, id: NodeId) -> usize {
        graph
            .nodes()
            .map(|(_, node)| node.connections().iter().filter(|c| c.involves_node(id)).count())
            .sum()
    }

    #[test]
    fn test_connection_symmetry() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let value = graph.add_node(&mut backend, NodeKind::Vector2);
        let tile = graph.add_node(&mut backend, NodeKind::Loop);

        let connection = graph.connect(tile, "Repeat", value, "Output").unwrap();
        assert_eq!(occurrences(&graph, &connection), 2);
        assert_eq!(graph.connection_count(), 1);

        assert!(graph.disconnect(&connection));
        assert_eq!(occurrences(&graph, &connection), 0);
        assert!(!graph.disconnect(&connection));
    }

    #[test]
    fn test_connect_validation() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let rect = graph.add_node(&mut backend, NodeKind::Rectangle);
        let scalar = graph.add_node(&mut backend, NodeKind::Scalar);

        assert_eq!(
            graph.connect(rect, "Position", rect, "Output"),
            Err(ConnectionError::SelfLoop)
        );
        assert_eq!(
            graph.connect(rect, "Nope", scalar, "Output"),
            Err(ConnectionError::SlotNotFound("Nope".to_string()))
        );
        assert_eq!(
            graph.connect(scalar, "Output", rect, "Output"),
            Err(ConnectionError::SlotNotFound("Output".to_string()))
        );
        let stale = NodeId::from_raw(rect.index(), rect.generation() + 1);
        assert_eq!(
            graph.connect(stale, "Chamfer", scalar, "Output"),
            Err(ConnectionError::NodeNotFound(stale))
        );

        // Categories are not enforced.
        assert!(graph.connect(rect, "Position", scalar, "Output").is_ok());
        assert_eq!(graph.resolve_input(rect, "Position", [9.0f32; 4]), [9.0; 4]);
    }

    #[test]
    fn test_single_entry_point() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        assert_eq!(graph.entry_point(), None);

        let first = graph.add_node(&mut backend, NodeKind::Output);
        graph.add_node(&mut backend, NodeKind::Rectangle);
        let second = graph.add_node_by_name(&mut backend, "Output").unwrap();
        assert_eq!(graph.entry_point(), Some(second));

        graph.set_entry_point(first).unwrap();
        assert_eq!(graph.entry_point(), Some(first));

        let scalar = graph.add_node(&mut backend, NodeKind::Scalar);
        assert_eq!(graph.set_entry_point(scalar), Err(GraphError::NotAnOutput(scalar)));

        let entry = graph.entry_point().unwrap();
        assert_eq!(graph.node(entry).map(Node::kind), Some(NodeKind::Output));
    }

    #[test]
    fn test_unknown_kind_name() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        assert_eq!(
            graph.add_node_by_name(&mut backend, "Mesh"),
            Err(GraphError::UnknownKind("Mesh".to_string()))
        );
        assert!(!graph.is_dirty());
    }

    #[test]
    fn test_default_layout_order() {
        let mut backend = HeadlessBackend::new();
        let graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        assert!(graph.is_dirty());
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
    }

    #[test]
    fn test_resolve_input_defaults() {
        let mut backend = HeadlessBackend::new();
        let graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        let rect = graph
            .nodes()
            .find(|(_, n)| n.kind() == NodeKind::Rectangle)
            .map(|(id, _)| id)
            .unwrap();

        assert_eq!(graph.resolve_input(rect, "Position", [0.0f32; 4]), [0.75, 0.5, 0.5, 1.0]);
        assert_eq!(graph.resolve_input(rect, "Chamfer", 3.0f32), 0.0);
        assert_eq!(graph.resolve_input(rect, "Falloff", 0.25f32), 0.25);
    }

    #[test]
    fn test_producer_lookup_ignores_own_output_records() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let a = graph.add_node(&mut backend, NodeKind::Loop);
        let b = graph.add_node(&mut backend, NodeKind::Loop);
        graph.connect(b, "Input", a, "Output").unwrap();

        // `a` holds the same record, but it is the producer there.
        assert!(graph.producer_for_input(a, "Input").is_none());
        assert!(graph.producer_for_input(b, "Input").is_some());
    }

    #[test]
    fn test_deletion_safety() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        let rect = graph
            .nodes()
            .find(|(_, n)| n.kind() == NodeKind::Rectangle)
            .map(|(id, _)| id)
            .unwrap();

        graph.delete_node(&mut backend, rect).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(references(&graph, rect), 0);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.node(rect).is_none());
        assert_eq!(graph.delete_node(&mut backend, rect), Err(GraphError::NodeNotFound(rect)));

        // Rectangle owned three resources; nothing else owns any.
        assert_eq!(backend.live_total(), 0);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let output = graph.add_node(&mut backend, NodeKind::Output);
        graph.delete_node(&mut backend, output).unwrap();
        assert_eq!(graph.entry_point(), None);

        let scalar = graph.add_node(&mut backend, NodeKind::Scalar);
        assert_eq!(scalar.index(), output.index());
        assert_ne!(scalar, output);
        assert!(graph.node(output).is_none());
    }

    #[test]
    fn test_delete_selected() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        let ids: Vec<_> = graph.node_ids().collect();
        for id in &ids[..2] {
            graph.node_mut(*id).unwrap().selected = true;
        }
        assert_eq!(graph.delete_selected(&mut backend), 2);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_disconnect_then_delete() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        let output = graph.entry_point().unwrap();
        let (connection, _) = graph
            .producer_for_input(output, "Input")
            .map(|(c, n)| (*c, n.kind()))
            .unwrap();
        let rect = connection.output_node;

        assert!(graph.disconnect(&connection));
        graph.delete_node(&mut backend, rect).unwrap();

        let output_node = graph.node(output).unwrap();
        assert!(output_node.connections().iter().all(|c| !c.involves_node(rect)));
        assert_eq!(graph.entry_point(), Some(output));
        assert_eq!(graph.evaluation_order(), vec![output]);
    }

    #[test]
    fn test_traversal_follows_producers_only() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let rect = graph.add_node(&mut backend, NodeKind::Rectangle);
        let output = graph.add_node(&mut backend, NodeKind::Output);
        let side = graph.add_node(&mut backend, NodeKind::Loop);
        graph.connect(output, "Input", rect, "Output").unwrap();
        // `side` consumes the rectangle but does not feed the output.
        graph.connect(side, "Input", rect, "Output").unwrap();

        assert_eq!(graph.evaluation_order(), vec![rect, output]);
    }

    #[test]
    fn test_shared_producer_visited_once() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let count = graph.add_node(&mut backend, NodeKind::Vector2);
        let sine = graph.add_node(&mut backend, NodeKind::SineDistortion);
        let output = graph.add_node(&mut backend, NodeKind::Output);
        graph.connect(sine, "Count", count, "Output").unwrap();
        graph.connect(sine, "Amplitude", count, "Output").unwrap();
        graph.connect(output, "Input", sine, "Output").unwrap();

        assert_eq!(graph.evaluation_order(), vec![count, sine, output]);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let a = graph.add_node(&mut backend, NodeKind::Loop);
        let b = graph.add_node(&mut backend, NodeKind::Loop);
        let output = graph.add_node(&mut backend, NodeKind::Output);
        graph.connect(a, "Input", b, "Output").unwrap();
        graph.connect(b, "Input", a, "Output").unwrap();
        graph.connect(output, "Input", a, "Output").unwrap();

        assert_eq!(graph.evaluation_order(), vec![b, a, output]);
    }

    #[test]
    fn test_empty_graph() {
        let mut graph = TextureGraph::default();
        assert!(!graph.visit(|_, _| {}));
        assert!(graph.evaluation_order().is_empty());
        assert!(!graph.published_output().is_valid());
        assert!(!graph.consume_output_updated());
    }

    #[test]
    fn test_set_value_marks_dirty_only_on_change() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let scalar = graph.add_node(&mut backend, NodeKind::Scalar);
        graph.finish_pass(false);

        assert_eq!(graph.set_value(scalar, SlotValue::Scalar(0.0)), Ok(false));
        assert!(!graph.is_dirty());
        assert_eq!(graph.set_value(scalar, SlotValue::Scalar(1.0)), Ok(true));
        assert!(graph.is_dirty());
    }

    #[test]
    fn test_failed_node_stays_in_graph() {
        let mut backend = HeadlessBackend::new();
        backend.fail.render_targets = true;
        let mut graph = TextureGraph::default();
        let rect = graph.add_node(&mut backend, NodeKind::Rectangle);

        let node = graph.node(rect).unwrap();
        assert!(!node.is_renderable());
        assert_eq!(backend.live_count(ResourceKind::Pipeline), 1);

        graph.shutdown(&mut backend);
        assert_eq!(backend.live_total(), 0);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_deleting_producer_clears_published_output() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        graph.on_update(&mut backend, 0.0);
        assert!(graph.consume_output_updated());
        let published = graph.published_output();
        assert!(backend.is_live(published.handle.0));

        let rect = graph
            .nodes()
            .find(|(_, n)| n.kind() == NodeKind::Rectangle)
            .map(|(id, _)| id)
            .unwrap();
        graph.delete_node(&mut backend, rect).unwrap();

        assert!(!backend.is_live(published.handle.0));
        assert!(!graph.published_output().is_valid());
        assert!(graph.consume_output_updated());
    }

    #[test]
    fn test_deleting_one_output_keeps_the_other_published() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        let first = graph.entry_point().unwrap();
        let rect = graph
            .nodes()
            .find(|(_, n)| n.kind() == NodeKind::Rectangle)
            .map(|(id, _)| id)
            .unwrap();
        let second = graph.add_node(&mut backend, NodeKind::Output);
        graph.connect(second, "Input", rect, "Output").unwrap();
        graph.on_update(&mut backend, 0.0);
        let published = graph.published_output();

        graph.delete_node(&mut backend, first).unwrap();
        assert_eq!(graph.node(second).map(Node::render_target), Some(published));
    }

    #[test]
    fn test_ids_stay_stale_after_shutdown() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let before = graph.add_node(&mut backend, NodeKind::Scalar);
        graph.shutdown(&mut backend);

        let after = graph.add_node(&mut backend, NodeKind::Vector2);
        assert_eq!(after.index(), before.index());
        assert_ne!(after, before);
        assert!(graph.node(before).is_none());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_category_mismatch_uses_default() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::default();
        let rect = graph.add_node(&mut backend, NodeKind::Rectangle);
        let scalar = graph.add_node(&mut backend, NodeKind::Scalar);
        graph.set_value(scalar, SlotValue::Scalar(2.0)).unwrap();
        graph.connect(rect, "Position", scalar, "Output").unwrap();

        assert_eq!(graph.input_value(rect, "Position"), Some(SlotValue::Scalar(2.0)));
        assert_eq!(graph.resolve_input(rect, "Position", [0.5f32, 0.5, 1.0, 1.0]), [0.5, 0.5, 1.0, 1.0]);
        graph.shutdown(&mut backend);
    }
}
