// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive graph editor built on egui.
//!
//! Features:
//! - Node rendering with category-coloured slots
//! - Connection rendering (bezier curves) with a delete handle
//! - Pan/zoom navigation
//! - Node selection and dragging
//! - Connection drag-to-create
//! - Context menu listing the node catalog
//! - Render target thumbnails for textures the host registered with egui
//!
//! Every mutation goes through [`TextureGraph`], so dirty tracking stays in
//! one place. [`GraphEditorState::ui`] reports whether the graph changed.

use crate::backend::{Backend, RenderTarget, TextureHandle};
use crate::connection::Connection;
use crate::graph::TextureGraph;
use crate::node::{Node, NodeId, NodeKind, NodeState};
use crate::slot::{SlotCategory, SlotDirection, SlotValue};
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use std::collections::HashMap;

/// Node visual dimensions
const NODE_WIDTH: f32 = 180.0;
const NODE_HEADER_HEIGHT: f32 = 24.0;
const SLOT_HEIGHT: f32 = 22.0;
const SLOT_RADIUS: f32 = 6.0;
const SLOT_PADDING: f32 = 12.0;
const BODY_HEIGHT: f32 = 24.0;
const NODE_ROUNDING: f32 = 6.0;
const NODE_SHADOW_OFFSET: f32 = 3.0;

/// Connection visual parameters
const BEZIER_CURVATURE: f32 = 50.0;
const CONNECTION_THICKNESS: f32 = 2.5;
const HANDLE_RADIUS: f32 = 5.0;

/// Grid parameters
const GRID_SPACING: f32 = 20.0;

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 4.0;

/// Dragging state for creating connections
#[derive(Debug, Clone, Copy)]
pub struct ConnectionDrag {
    /// Producer node
    pub from_node: NodeId,
    /// Producer output slot
    pub from_slot: &'static str,
    /// Current mouse position (screen space)
    pub current_pos: Pos2,
}

/// Graph editor interaction mode
#[derive(Debug, Clone, Copy, Default)]
pub enum InteractionMode {
    /// Default mode - selecting and dragging
    #[default]
    Normal,
    /// Panning the view
    Panning,
    /// Dragging selected nodes
    DraggingNodes,
    /// Creating a connection
    CreatingConnection(ConnectionDrag),
}

/// Graph editor UI state
#[derive(Debug)]
pub struct GraphEditorState {
    /// Current pan offset (graph space)
    pub pan: Vec2,
    /// Current zoom level
    pub zoom: f32,
    /// Current interaction mode
    pub mode: InteractionMode,
    /// Show grid
    pub show_grid: bool,
    /// Last mouse position
    last_mouse_pos: Pos2,
    /// Where the context menu was opened (graph space)
    menu_position: Pos2,
    /// egui textures standing in for render targets
    previews: HashMap<TextureHandle, egui::TextureId>,
}

impl GraphEditorState {
    /// Create a new graph editor state
    pub fn new() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            mode: InteractionMode::Normal,
            show_grid: true,
            last_mouse_pos: Pos2::ZERO,
            menu_position: Pos2::ZERO,
            previews: HashMap::new(),
        }
    }

    /// Show `texture` as the thumbnail of whichever node draws into or publishes `target`
    pub fn register_preview(&mut self, target: RenderTarget, texture: egui::TextureId) {
        if target.is_valid() {
            self.previews.insert(target.handle, texture);
        }
    }

    /// Forget every registered thumbnail
    pub fn clear_previews(&mut self) {
        self.previews.clear();
    }

    /// Thumbnail registered for a node's render target
    fn preview_for(&self, node: &Node) -> Option<egui::TextureId> {
        self.previews.get(&node.render_target().handle).copied()
    }

    /// Convert screen position to graph position
    pub fn screen_to_graph(&self, screen_pos: Pos2, rect: Rect) -> Pos2 {
        let center = rect.center();
        Pos2::new(
            (screen_pos.x - center.x) / self.zoom - self.pan.x,
            (screen_pos.y - center.y) / self.zoom - self.pan.y,
        )
    }

    /// Convert graph position to screen position
    pub fn graph_to_screen(&self, graph_pos: Pos2, rect: Rect) -> Pos2 {
        let center = rect.center();
        Pos2::new(
            (graph_pos.x + self.pan.x) * self.zoom + center.x,
            (graph_pos.y + self.pan.y) * self.zoom + center.y,
        )
    }

    /// Zoom by `factor`, keeping the graph point under `anchor` fixed
    pub fn zoom_at(&mut self, anchor: Pos2, rect: Rect, factor: f32) {
        let before = self.screen_to_graph(anchor, rect);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let after = self.screen_to_graph(anchor, rect);
        self.pan += after - before;
    }

    /// Back to 100% zoom, centered on the origin
    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
    }

    /// Select `id`; without `add`, everything else is deselected
    pub fn select_node(graph: &mut TextureGraph, id: NodeId, add: bool) {
        if !add {
            Self::clear_selection(graph);
        }
        if let Some(node) = graph.node_mut(id) {
            node.selected = true;
        }
    }

    /// Deselect every node
    pub fn clear_selection(graph: &mut TextureGraph) {
        let ids: Vec<_> = graph.node_ids().collect();
        for id in ids {
            if let Some(node) = graph.node_mut(id) {
                node.selected = false;
            }
        }
    }

    /// Render the graph editor. Returns whether the graph changed.
    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        graph: &mut TextureGraph,
        backend: &mut dyn Backend,
    ) -> bool {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.show_grid {
            self.draw_grid(&painter, rect);
        }

        let mut changed = self.handle_input(ui, &response, rect, graph, backend);
        changed |= self.context_menu(&response, graph, backend);

        // Connections go below nodes.
        self.draw_connections(&painter, rect, graph);
        if let InteractionMode::CreatingConnection(drag) = self.mode {
            self.draw_connection_drag(&painter, rect, graph, &drag);
        }
        changed |= self.draw_nodes(ui, &painter, rect, graph);

        self.draw_status_bar(&painter, rect, graph);
        changed
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect) {
        let spacing = GRID_SPACING * self.zoom;
        let major_spacing = spacing * 5.0;
        let minor = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 60, 60, 100));
        let major = Stroke::new(1.0, Color32::from_rgba_unmultiplied(80, 80, 80, 150));

        let origin = self.graph_to_screen(Pos2::ZERO, rect);
        for (step, stroke) in [(spacing, minor), (major_spacing, major)] {
            let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
            while x < rect.right() {
                painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
                x += step;
            }
            let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
            while y < rect.bottom() {
                painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
                y += step;
            }
        }
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: Rect,
        graph: &mut TextureGraph,
        backend: &mut dyn Backend,
    ) -> bool {
        let mut changed = false;
        let mouse_pos = ui
            .input(|i| i.pointer.hover_pos())
            .unwrap_or(self.last_mouse_pos);
        let delta = mouse_pos - self.last_mouse_pos;
        self.last_mouse_pos = mouse_pos;

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                self.zoom_at(mouse_pos, rect, 1.0 + scroll * 0.001);
            }
        }

        self.mode = match self.mode {
            InteractionMode::Normal => {
                let mut next = InteractionMode::Normal;
                if response.clicked() {
                    if let Some(connection) = self.handle_at(mouse_pos, rect, graph) {
                        changed |= graph.disconnect(&connection);
                    } else {
                        let shift = ui.input(|i| i.modifiers.shift);
                        match node_at(graph, self.screen_to_graph(mouse_pos, rect)) {
                            Some(id) => Self::select_node(graph, id, shift),
                            None if !shift => Self::clear_selection(graph),
                            None => {}
                        }
                    }
                }
                if response.secondary_clicked() {
                    self.menu_position = self.screen_to_graph(mouse_pos, rect);
                }
                if response.drag_started_by(egui::PointerButton::Middle) {
                    next = InteractionMode::Panning;
                } else if response.drag_started_by(egui::PointerButton::Primary) {
                    let origin = ui.input(|i| i.pointer.press_origin()).unwrap_or(mouse_pos);
                    let graph_pos = self.screen_to_graph(origin, rect);
                    if let Some((from_node, from_slot)) =
                        slot_at(graph, graph_pos, SlotDirection::Output)
                    {
                        next = InteractionMode::CreatingConnection(ConnectionDrag {
                            from_node,
                            from_slot,
                            current_pos: mouse_pos,
                        });
                    } else if let Some(id) = node_at(graph, graph_pos) {
                        if !graph.node(id).is_some_and(|n| n.selected) {
                            Self::select_node(graph, id, false);
                        }
                        next = InteractionMode::DraggingNodes;
                    }
                }
                next
            }

            InteractionMode::Panning => {
                if response.dragged() {
                    self.pan += delta / self.zoom;
                }
                if response.drag_stopped() {
                    InteractionMode::Normal
                } else {
                    InteractionMode::Panning
                }
            }

            InteractionMode::DraggingNodes => {
                if response.dragged() {
                    let graph_delta = delta / self.zoom;
                    let ids: Vec<_> = graph
                        .nodes()
                        .filter(|(_, n)| n.selected)
                        .map(|(id, _)| id)
                        .collect();
                    for id in ids {
                        if let Some(node) = graph.node_mut(id) {
                            node.position[0] += graph_delta.x;
                            node.position[1] += graph_delta.y;
                        }
                    }
                }
                if response.drag_stopped() {
                    InteractionMode::Normal
                } else {
                    InteractionMode::DraggingNodes
                }
            }

            InteractionMode::CreatingConnection(mut drag) => {
                drag.current_pos = mouse_pos;
                if response.drag_stopped() {
                    let graph_pos = self.screen_to_graph(mouse_pos, rect);
                    if let Some((consumer, slot)) = slot_at(graph, graph_pos, SlotDirection::Input) {
                        match graph.connect(consumer, slot, drag.from_node, drag.from_slot) {
                            Ok(_) => changed = true,
                            Err(e) => tracing::debug!("Connection rejected: {e}"),
                        }
                    }
                    InteractionMode::Normal
                } else {
                    InteractionMode::CreatingConnection(drag)
                }
            }
        };

        // Text fields own the keyboard while focused.
        let delete = ui.input(|i| i.key_pressed(egui::Key::Delete))
            && ui.memory(|m| m.focused().is_none());
        if delete && graph.delete_selected(backend) > 0 {
            changed = true;
        }

        changed
    }

    fn context_menu(
        &mut self,
        response: &egui::Response,
        graph: &mut TextureGraph,
        backend: &mut dyn Backend,
    ) -> bool {
        let names: Vec<String> = graph.catalog().names().map(str::to_string).collect();
        let position = self.menu_position;
        let mut changed = false;
        let mut reset = false;

        response.context_menu(|ui| {
            for name in &names {
                if ui.button(name).clicked() {
                    match graph.add_node_by_name(backend, name) {
                        Ok(id) => {
                            if let Some(node) = graph.node_mut(id) {
                                node.position = [position.x, position.y];
                            }
                            changed = true;
                        }
                        Err(e) => tracing::warn!("{e}"),
                    }
                    ui.close_menu();
                }
            }
            ui.separator();
            if ui.button("Reset Zoom").clicked() {
                reset = true;
                ui.close_menu();
            }
        });

        if reset {
            self.reset_view();
        }
        changed
    }

    /// Connection whose midpoint handle is under `screen_pos`
    fn handle_at(&self, screen_pos: Pos2, rect: Rect, graph: &TextureGraph) -> Option<Connection> {
        graph
            .connections()
            .find(|connection| {
                self.connection_curve(connection, rect, graph)
                    .is_some_and(|[a, b, c, d]| {
                        cubic_point(a, b, c, d, 0.5).distance(screen_pos) < HANDLE_RADIUS * 1.5 * self.zoom
                    })
            })
            .copied()
    }

    fn connection_curve(&self, connection: &Connection, rect: Rect, graph: &TextureGraph) -> Option<[Pos2; 4]> {
        let from = graph.node(connection.output_node)?;
        let to = graph.node(connection.input_node)?;
        let start = slot_position(from, SlotDirection::Output, connection.output_slot)?;
        let end = slot_position(to, SlotDirection::Input, connection.input_slot)?;
        Some(self.curve(self.graph_to_screen(start, rect), self.graph_to_screen(end, rect)))
    }

    fn curve(&self, from: Pos2, to: Pos2) -> [Pos2; 4] {
        let distance = (to.x - from.x).abs();
        let curvature = (BEZIER_CURVATURE * self.zoom).min(distance * 0.5);
        [
            from,
            Pos2::new(from.x + curvature, from.y),
            Pos2::new(to.x - curvature, to.y),
            to,
        ]
    }

    fn draw_connections(&self, painter: &egui::Painter, rect: Rect, graph: &TextureGraph) {
        for connection in graph.connections() {
            let Some([a, b, c, d]) = self.connection_curve(connection, rect, graph) else {
                continue;
            };
            let color = graph
                .node(connection.output_node)
                .and_then(|n| n.output(connection.output_slot))
                .map_or(Color32::GRAY, |slot| category_color(slot.category));

            self.draw_bezier(painter, [a, b, c, d], color);
            let handle = cubic_point(a, b, c, d, 0.5);
            painter.circle_filled(handle, HANDLE_RADIUS * self.zoom, color);
            painter.circle_stroke(handle, HANDLE_RADIUS * self.zoom, Stroke::new(1.0, Color32::from_gray(30)));
        }
    }

    fn draw_bezier(&self, painter: &egui::Painter, [a, b, c, d]: [Pos2; 4], color: Color32) {
        let points = bezier_points(a, b, c, d, 32);
        let stroke = Stroke::new(CONNECTION_THICKNESS * self.zoom, color);
        for pair in points.windows(2) {
            painter.line_segment([pair[0], pair[1]], stroke);
        }
    }

    fn draw_connection_drag(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        graph: &TextureGraph,
        drag: &ConnectionDrag,
    ) {
        let Some(node) = graph.node(drag.from_node) else {
            return;
        };
        let Some(start) = slot_position(node, SlotDirection::Output, drag.from_slot) else {
            return;
        };
        let color = node
            .output(drag.from_slot)
            .map_or(Color32::GRAY, |slot| category_color(slot.category));
        let curve = self.curve(self.graph_to_screen(start, rect), drag.current_pos);
        self.draw_bezier(painter, curve, color);
    }

    fn draw_nodes(
        &mut self,
        ui: &mut egui::Ui,
        painter: &egui::Painter,
        rect: Rect,
        graph: &mut TextureGraph,
    ) -> bool {
        let mut changed = false;
        let entry_point = graph.entry_point();
        let node_ids: Vec<_> = graph.node_ids().collect();

        for id in node_ids {
            let Some(node) = graph.node(id) else {
                continue;
            };
            let node_rect = node_rect(node);
            let screen_rect = Rect::from_min_size(
                self.graph_to_screen(node_rect.min, rect),
                node_rect.size() * self.zoom,
            );
            if !screen_rect.intersects(rect) {
                continue;
            }

            self.draw_frame(painter, node, screen_rect, entry_point == Some(id));
            self.draw_slots(painter, node, screen_rect);

            let body = Rect::from_min_size(
                Pos2::new(
                    screen_rect.left() + 8.0 * self.zoom,
                    screen_rect.bottom() - (BODY_HEIGHT + 4.0) * self.zoom,
                ),
                Vec2::new((NODE_WIDTH - 16.0) * self.zoom, BODY_HEIGHT * self.zoom),
            );
            match node.value() {
                Some(value) => {
                    if let Some(edited) = value_widgets(ui, body, value) {
                        match graph.set_value(id, edited) {
                            Ok(edit) => changed |= edit,
                            Err(e) => tracing::warn!("{e}"),
                        }
                    }
                }
                None => {
                    if let Some(texture) = self.preview_for(node) {
                        let size = body.height();
                        let thumbnail = Rect::from_min_size(
                            Pos2::new(body.right() - size, body.top()),
                            Vec2::splat(size),
                        );
                        painter.image(
                            texture,
                            thumbnail,
                            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                            Color32::WHITE,
                        );
                    }
                    painter.text(
                        body.left_center(),
                        egui::Align2::LEFT_CENTER,
                        resource_label(node),
                        egui::FontId::proportional(10.0 * self.zoom),
                        Color32::from_gray(160),
                    );
                }
            }
        }
        changed
    }

    fn draw_frame(&self, painter: &egui::Painter, node: &Node, screen_rect: Rect, is_entry: bool) {
        let rounding = NODE_ROUNDING * self.zoom;
        painter.rect_filled(
            screen_rect.translate(Vec2::splat(NODE_SHADOW_OFFSET)),
            rounding,
            Color32::from_rgba_unmultiplied(0, 0, 0, 60),
        );

        let bg_color = if node.selected {
            Color32::from_rgb(60, 70, 90)
        } else {
            Color32::from_rgb(45, 45, 48)
        };
        painter.rect_filled(screen_rect, rounding, bg_color);

        let header_rect = Rect::from_min_size(
            screen_rect.min,
            Vec2::new(screen_rect.width(), NODE_HEADER_HEIGHT * self.zoom),
        );
        painter.rect_filled(
            header_rect,
            egui::Rounding {
                nw: rounding,
                ne: rounding,
                sw: 0.0,
                se: 0.0,
            },
            header_color(node.kind(), is_entry),
        );
        painter.text(
            header_rect.center(),
            egui::Align2::CENTER_CENTER,
            &node.title,
            egui::FontId::proportional(12.0 * self.zoom),
            Color32::WHITE,
        );

        if node.selected {
            painter.rect_stroke(
                screen_rect,
                rounding,
                Stroke::new(2.0, Color32::from_rgb(100, 150, 255)),
            );
        }
    }

    fn draw_slots(&self, painter: &egui::Painter, node: &Node, screen_rect: Rect) {
        let radius = SLOT_RADIUS * self.zoom;
        let font = egui::FontId::proportional(10.0 * self.zoom);
        let sides = [
            (node.inputs(), screen_rect.left(), SLOT_PADDING, egui::Align2::LEFT_CENTER),
            (node.outputs(), screen_rect.right(), -SLOT_PADDING, egui::Align2::RIGHT_CENTER),
        ];

        for (slots, x, padding, align) in sides {
            for (i, slot) in slots.iter().enumerate() {
                let pos = Pos2::new(x, screen_rect.top() + slot_offset(i) * self.zoom);
                painter.circle_filled(pos, radius, category_color(slot.category));
                painter.circle_stroke(pos, radius, Stroke::new(1.0, Color32::from_gray(30)));
                painter.text(
                    Pos2::new(pos.x + padding * self.zoom, pos.y),
                    align,
                    slot.name,
                    font.clone(),
                    Color32::from_gray(200),
                );
            }
        }
    }

    fn draw_status_bar(&self, painter: &egui::Painter, rect: Rect, graph: &TextureGraph) {
        let selected = graph.nodes().filter(|(_, n)| n.selected).count();
        painter.text(
            Pos2::new(rect.left() + 5.0, rect.bottom() - 11.0),
            egui::Align2::LEFT_CENTER,
            format!(
                "Nodes: {} | Connections: {} | Zoom: {:.0}% | Selected: {}",
                graph.node_count(),
                graph.connection_count(),
                self.zoom * 100.0,
                selected,
            ),
            egui::FontId::proportional(11.0),
            Color32::from_gray(150),
        );
    }
}

impl Default for GraphEditorState {
    fn default() -> Self {
        Self::new()
    }
}

fn category_color(category: SlotCategory) -> Color32 {
    let [r, g, b] = category.color();
    Color32::from_rgb(r, g, b)
}

fn header_color(kind: NodeKind, is_entry: bool) -> Color32 {
    if is_entry {
        return Color32::from_rgb(150, 90, 60);
    }
    if kind.is_value() {
        Color32::from_rgb(70, 110, 80)
    } else {
        Color32::from_rgb(70, 100, 130)
    }
}

fn resource_label(node: &Node) -> String {
    match node.state() {
        NodeState::Texture(texture) if texture.is_renderable() => {
            let target = texture.render_target();
            format!("{}x{} {:?}", target.width, target.height, target.format)
        }
        NodeState::Texture(_) => "not renderable".to_string(),
        NodeState::Output(output) if output.published.is_valid() => "published".to_string(),
        _ => "no input".to_string(),
    }
}

/// Drag widgets for a literal; returns the edited value if it changed
fn value_widgets(ui: &mut egui::Ui, body: Rect, value: SlotValue) -> Option<SlotValue> {
    let mut components = [0.0f32; 4];
    let count = match value {
        SlotValue::Scalar(v) => {
            components[0] = v;
            1
        }
        SlotValue::Vector2([x, y]) => {
            components[..2].copy_from_slice(&[x, y]);
            2
        }
        SlotValue::Vector4(v) => {
            components = v;
            4
        }
        SlotValue::Texture(_) => return None,
    };

    let mut changed = false;
    ui.put(body, |ui: &mut egui::Ui| {
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 2.0;
            for component in &mut components[..count] {
                changed |= ui
                    .add(egui::DragValue::new(component).speed(0.01).max_decimals(2))
                    .changed();
            }
        })
        .response
    });

    if !changed {
        return None;
    }
    Some(match value {
        SlotValue::Scalar(_) => SlotValue::Scalar(components[0]),
        SlotValue::Vector2(_) => SlotValue::Vector2([components[0], components[1]]),
        _ => SlotValue::Vector4(components),
    })
}

fn slot_offset(index: usize) -> f32 {
    NODE_HEADER_HEIGHT + index as f32 * SLOT_HEIGHT + SLOT_HEIGHT / 2.0
}

/// Bounds of a node in graph space
fn node_rect(node: &Node) -> Rect {
    let rows = node.inputs().len().max(node.outputs().len());
    let height = NODE_HEADER_HEIGHT + rows as f32 * SLOT_HEIGHT + BODY_HEIGHT + 8.0;
    Rect::from_min_size(
        Pos2::new(node.position[0], node.position[1]),
        Vec2::new(NODE_WIDTH, height),
    )
}

/// Position of a named slot in graph space
fn slot_position(node: &Node, direction: SlotDirection, name: &str) -> Option<Pos2> {
    let (slots, x) = match direction {
        SlotDirection::Input => (node.inputs(), node.position[0]),
        SlotDirection::Output => (node.outputs(), node.position[0] + NODE_WIDTH),
    };
    let index = slots.iter().position(|s| s.name == name)?;
    Some(Pos2::new(x, node.position[1] + slot_offset(index)))
}

/// Topmost node under a graph-space point
fn node_at(graph: &TextureGraph, pos: Pos2) -> Option<NodeId> {
    graph
        .nodes()
        .filter(|(_, node)| node_rect(node).contains(pos))
        .map(|(id, _)| id)
        .last()
}

/// Slot under a graph-space point
fn slot_at(graph: &TextureGraph, pos: Pos2, direction: SlotDirection) -> Option<(NodeId, &'static str)> {
    graph.nodes().find_map(|(id, node)| {
        let slots = match direction {
            SlotDirection::Input => node.inputs(),
            SlotDirection::Output => node.outputs(),
        };
        slots.iter().find_map(|slot| {
            let center = slot_position(node, direction, slot.name)?;
            (center.distance(pos) < SLOT_RADIUS * 1.5).then_some((id, slot.name))
        })
    })
}

fn cubic_point(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, t: f32) -> Pos2 {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Pos2::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Generate points along a cubic bezier curve
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    (0..=segments)
        .map(|i| cubic_point(p0, p1, p2, p3, i as f32 / segments as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::headless::HeadlessBackend;

    fn frame(
        ctx: &egui::Context,
        input: egui::RawInput,
        editor: &mut GraphEditorState,
        graph: &mut TextureGraph,
        backend: &mut HeadlessBackend,
    ) -> bool {
        let mut changed = false;
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                changed = editor.ui(ui, graph, backend);
            });
        });
        changed
    }

    #[test]
    fn test_screen_graph_roundtrip() {
        let mut editor = GraphEditorState::new();
        editor.pan = Vec2::new(30.0, -12.0);
        editor.zoom = 1.5;
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));

        let p = Pos2::new(123.0, 45.0);
        let back = editor.screen_to_graph(editor.graph_to_screen(p, rect), rect);
        assert!((back - p).length() < 1e-3);
    }

    #[test]
    fn test_zoom_keeps_anchor_and_clamps() {
        let mut editor = GraphEditorState::new();
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
        let anchor = Pos2::new(600.0, 100.0);
        let before = editor.screen_to_graph(anchor, rect);

        editor.zoom_at(anchor, rect, 2.0);
        assert_eq!(editor.zoom, 2.0);
        assert!((editor.screen_to_graph(anchor, rect) - before).length() < 1e-3);

        editor.zoom_at(anchor, rect, 100.0);
        assert_eq!(editor.zoom, MAX_ZOOM);
        editor.reset_view();
        assert_eq!(editor.zoom, 1.0);
        assert_eq!(editor.pan, Vec2::ZERO);
    }

    #[test]
    fn test_bezier_endpoints() {
        let a = Pos2::new(0.0, 0.0);
        let d = Pos2::new(100.0, 50.0);
        let points = bezier_points(a, Pos2::new(50.0, 0.0), Pos2::new(50.0, 50.0), d, 8);
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], a);
        assert_eq!(points[8], d);
    }

    #[test]
    fn test_hit_testing() {
        let mut backend = HeadlessBackend::new();
        let graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        let rect_id = node_at(&graph, Pos2::new(110.0, 410.0)).unwrap();
        assert_eq!(graph.node(rect_id).map(Node::kind), Some(NodeKind::Rectangle));
        assert!(node_at(&graph, Pos2::new(0.0, 0.0)).is_none());

        let chamfer = Pos2::new(100.0, 400.0 + slot_offset(1));
        assert_eq!(
            slot_at(&graph, chamfer, SlotDirection::Input),
            Some((rect_id, "Chamfer"))
        );
        let output = Pos2::new(100.0 + NODE_WIDTH, 400.0 + slot_offset(0));
        assert_eq!(
            slot_at(&graph, output, SlotDirection::Output),
            Some((rect_id, "Output"))
        );
        assert_eq!(slot_at(&graph, chamfer, SlotDirection::Output), None);
    }

    #[test]
    fn test_selection_lives_on_nodes() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        let ids: Vec<_> = graph.node_ids().collect();

        GraphEditorState::select_node(&mut graph, ids[0], false);
        GraphEditorState::select_node(&mut graph, ids[1], true);
        assert_eq!(graph.nodes().filter(|(_, n)| n.selected).count(), 2);

        GraphEditorState::select_node(&mut graph, ids[2], false);
        let selected: Vec<_> = graph.nodes().filter(|(_, n)| n.selected).map(|(id, _)| id).collect();
        assert_eq!(selected, vec![ids[2]]);
    }

    #[test]
    fn test_idle_frame_changes_nothing() {
        let ctx = egui::Context::default();
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        let mut editor = GraphEditorState::new();

        let changed = frame(&ctx, egui::RawInput::default(), &mut editor, &mut graph, &mut backend);
        assert!(!changed);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.connection_count(), 3);
    }

    #[test]
    fn test_delete_key_removes_selected() {
        let ctx = egui::Context::default();
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        let mut editor = GraphEditorState::new();
        let output = graph.entry_point().unwrap();
        GraphEditorState::select_node(&mut graph, output, false);

        let input = egui::RawInput {
            events: vec![egui::Event::Key {
                key: egui::Key::Delete,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers: egui::Modifiers::NONE,
            }],
            ..Default::default()
        };
        let changed = frame(&ctx, input, &mut editor, &mut graph, &mut backend);
        assert!(changed);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.entry_point(), None);
        assert_eq!(graph.connection_count(), 2);
    }

    #[test]
    fn test_resource_labels() {
        let mut backend = HeadlessBackend::new();
        let mut node = Node::new(NodeKind::Rectangle);
        assert_eq!(resource_label(&node), "not renderable");
        node.initialize(&GeneratorConfig::default(), &mut backend).unwrap();
        assert_eq!(resource_label(&node), "1024x1024 Rgba8UnormSrgb");
        assert_eq!(resource_label(&Node::new(NodeKind::Output)), "no input");
    }

    #[test]
    fn test_previews_follow_render_targets() {
        let mut backend = HeadlessBackend::new();
        let mut graph = TextureGraph::with_default_layout(GeneratorConfig::default(), &mut backend);
        graph.on_update(&mut backend, 0.0);
        let rect = graph
            .nodes()
            .find(|(_, n)| n.kind() == NodeKind::Rectangle)
            .map(|(id, _)| id)
            .unwrap();
        let output = graph.entry_point().unwrap();

        let mut editor = GraphEditorState::new();
        let texture = egui::TextureId::User(7);
        editor.register_preview(graph.node(rect).unwrap().render_target(), texture);
        editor.register_preview(RenderTarget::default(), egui::TextureId::User(8));

        // The Output publishes the rectangle's target, so it shares the thumbnail.
        assert_eq!(editor.preview_for(graph.node(rect).unwrap()), Some(texture));
        assert_eq!(editor.preview_for(graph.node(output).unwrap()), Some(texture));
        assert_eq!(editor.previews.len(), 1);

        let ctx = egui::Context::default();
        assert!(!frame(&ctx, egui::RawInput::default(), &mut editor, &mut graph, &mut backend));

        editor.clear_previews();
        assert_eq!(editor.preview_for(graph.node(rect).unwrap()), None);
    }
}
