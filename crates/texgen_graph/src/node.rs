// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the texture graph.
//!
//! The set of node kinds is closed, so per-kind behavior is a `match` over
//! [`NodeKind`] and per-kind state lives in the [`NodeState`] variant rather
//! than behind a trait object.

use crate::backend::{
    Backend, BackendError, BufferHandle, PipelineHandle, RenderTarget, ShaderSource,
};
use crate::config::GeneratorConfig;
use crate::connection::Connection;
use crate::params::{
    EnvironmentMapParams, LoopParams, ParamBlock, RectangleParams, SineDistParams,
};
use crate::shaders;
use crate::slot::{Slot, SlotCategory, SlotValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation-checked handle to a node in a graph.
///
/// The index addresses an arena entry; the generation is bumped each time the
/// entry is freed, so a handle to a deleted node never aliases a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Build a handle from its parts
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Arena generation
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// The fixed enumeration of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Literal float
    Scalar,
    /// Literal 2D vector
    Vector2,
    /// Literal 4D vector
    Vector4,
    /// Procedural rounded rectangle
    Rectangle,
    /// Tiles its input
    Loop,
    /// Sine-wave offset of its input
    SineDistortion,
    /// Environment re-projection of its input
    EnvironmentMap,
    /// Graph entry point; publishes its input
    Output,
}

const VALUE_OUTPUT_SCALAR: &[Slot] = &[Slot::new("Output", SlotCategory::Scalar)];
const VALUE_OUTPUT_VECTOR2: &[Slot] = &[Slot::new("Output", SlotCategory::Vector2)];
const VALUE_OUTPUT_VECTOR4: &[Slot] = &[Slot::new("Output", SlotCategory::Vector4)];
const TEXTURE_OUTPUT: &[Slot] = &[Slot::new("Output", SlotCategory::Texture)];

const RECTANGLE_INPUTS: &[Slot] = &[
    Slot::new("Position", SlotCategory::Vector4),
    Slot::new("Chamfer", SlotCategory::Scalar),
    Slot::new("Falloff", SlotCategory::Scalar),
];
const LOOP_INPUTS: &[Slot] = &[
    Slot::new("Repeat", SlotCategory::Vector2),
    Slot::new("Input", SlotCategory::Texture),
];
const SINE_DIST_INPUTS: &[Slot] = &[
    Slot::new("Count", SlotCategory::Vector2),
    Slot::new("Amplitude", SlotCategory::Vector2),
    Slot::new("Input", SlotCategory::Texture),
];
const ENVIRONMENT_MAP_INPUTS: &[Slot] = &[
    Slot::new("Rotation", SlotCategory::Vector2),
    Slot::new("Input", SlotCategory::Texture),
];
const OUTPUT_INPUTS: &[Slot] = &[Slot::new("Input", SlotCategory::Texture)];

impl NodeKind {
    /// Every kind, in catalog order
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Scalar,
        NodeKind::Vector2,
        NodeKind::Vector4,
        NodeKind::Loop,
        NodeKind::Rectangle,
        NodeKind::SineDistortion,
        NodeKind::EnvironmentMap,
        NodeKind::Output,
    ];

    /// Display title and catalog name
    pub fn title(&self) -> &'static str {
        match self {
            Self::Scalar => "Scalar",
            Self::Vector2 => "Vector2",
            Self::Vector4 => "Vector4",
            Self::Rectangle => "Rectangle",
            Self::Loop => "Loop",
            Self::SineDistortion => "SineDist",
            Self::EnvironmentMap => "EnvironmentMap",
            Self::Output => "Output",
        }
    }

    /// Declared input slots
    pub fn inputs(&self) -> &'static [Slot] {
        match self {
            Self::Scalar | Self::Vector2 | Self::Vector4 => &[],
            Self::Rectangle => RECTANGLE_INPUTS,
            Self::Loop => LOOP_INPUTS,
            Self::SineDistortion => SINE_DIST_INPUTS,
            Self::EnvironmentMap => ENVIRONMENT_MAP_INPUTS,
            Self::Output => OUTPUT_INPUTS,
        }
    }

    /// Declared output slots
    pub fn outputs(&self) -> &'static [Slot] {
        match self {
            Self::Scalar => VALUE_OUTPUT_SCALAR,
            Self::Vector2 => VALUE_OUTPUT_VECTOR2,
            Self::Vector4 => VALUE_OUTPUT_VECTOR4,
            Self::Rectangle | Self::Loop | Self::SineDistortion | Self::EnvironmentMap => {
                TEXTURE_OUTPUT
            }
            Self::Output => &[],
        }
    }

    /// Pixel stage of the kind's full-screen pass, if it shades at all
    pub fn pixel_shader(&self) -> Option<&'static ShaderSource> {
        match self {
            Self::Rectangle => Some(&shaders::RECTANGLE_FS),
            Self::Loop => Some(&shaders::LOOP_FS),
            Self::SineDistortion => Some(&shaders::SINE_DIST_FS),
            Self::EnvironmentMap => Some(&shaders::ENVIRONMENT_MAP_FS),
            Self::Scalar | Self::Vector2 | Self::Vector4 | Self::Output => None,
        }
    }

    /// Whether nodes of this kind hold a literal value
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Scalar | Self::Vector2 | Self::Vector4)
    }

    fn default_state(&self) -> NodeState {
        match self {
            Self::Scalar => NodeState::Scalar(0.0),
            Self::Vector2 => NodeState::Vector2([0.0; 2]),
            Self::Vector4 => NodeState::Vector4([0.0; 4]),
            Self::Rectangle => {
                NodeState::Texture(TextureNode::new(ParamBlock::Rectangle(RectangleParams::default())))
            }
            Self::Loop => NodeState::Texture(TextureNode::new(ParamBlock::Loop(LoopParams::default()))),
            Self::SineDistortion => {
                NodeState::Texture(TextureNode::new(ParamBlock::SineDist(SineDistParams::default())))
            }
            Self::EnvironmentMap => NodeState::Texture(TextureNode::new(ParamBlock::EnvironmentMap(
                EnvironmentMapParams::default(),
            ))),
            Self::Output => NodeState::Output(OutputNode::default()),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// GPU side of a texture-producing node.
///
/// Owns a render target, a pipeline and a parameter buffer. Any of them may be
/// missing after a failed initialization; such a node stays in the graph but
/// is not renderable.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureNode {
    /// Parameters written before each draw
    pub params: ParamBlock,
    render_target: RenderTarget,
    pipeline: PipelineHandle,
    parameter_buffer: BufferHandle,
}

impl TextureNode {
    fn new(params: ParamBlock) -> Self {
        Self {
            params,
            render_target: RenderTarget::default(),
            pipeline: PipelineHandle::INVALID,
            parameter_buffer: BufferHandle::INVALID,
        }
    }

    /// The owned render target (empty until initialized)
    pub fn render_target(&self) -> RenderTarget {
        self.render_target
    }

    /// Pipeline handle
    pub fn pipeline(&self) -> PipelineHandle {
        self.pipeline
    }

    /// Parameter buffer handle
    pub fn parameter_buffer(&self) -> BufferHandle {
        self.parameter_buffer
    }

    /// Whether every resource needed for a draw exists
    pub fn is_renderable(&self) -> bool {
        self.render_target.is_valid() && self.pipeline.is_valid() && self.parameter_buffer.is_valid()
    }

    fn initialize(
        &mut self,
        pixel: &ShaderSource,
        config: &GeneratorConfig,
        backend: &mut dyn Backend,
    ) -> Result<(), BackendError> {
        // Create everything we can, report the first failure.
        let mut first_error = None;

        match backend.create_shader_pipeline(&shaders::FULLSCREEN_VS, pixel) {
            Ok(pipeline) => self.pipeline = pipeline,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match backend.create_render_target(
            config.texture_size[0],
            config.texture_size[1],
            config.texture_format,
        ) {
            Ok(target) => self.render_target = target,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match backend.create_parameter_buffer(self.params.size()) {
            Ok(buffer) => {
                backend.update_parameter_buffer(buffer, self.params.as_bytes());
                self.parameter_buffer = buffer;
            }
            Err(e) => first_error = first_error.or(Some(e)),
        }

        first_error.map_or(Ok(()), Err)
    }

    fn destroy(&mut self, backend: &mut dyn Backend) {
        if self.pipeline.is_valid() {
            backend.destroy_pipeline(self.pipeline);
        }
        if self.parameter_buffer.is_valid() {
            backend.destroy_parameter_buffer(self.parameter_buffer);
        }
        if self.render_target.is_valid() {
            backend.destroy_render_target(self.render_target);
        }
        self.pipeline = PipelineHandle::INVALID;
        self.parameter_buffer = BufferHandle::INVALID;
        self.render_target = RenderTarget::default();
    }
}

/// State of the Output node: a borrowed view of its input's render target
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OutputNode {
    /// Published texture (never owned, never destroyed by the node)
    pub published: RenderTarget,
}

/// Per-kind node state
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    /// Scalar literal
    Scalar(f32),
    /// 2D vector literal
    Vector2([f32; 2]),
    /// 4D vector literal
    Vector4([f32; 4]),
    /// Texture producer
    Texture(TextureNode),
    /// Output alias
    Output(OutputNode),
}

/// A node instance in the graph
#[derive(Debug, Clone)]
pub struct Node {
    /// Display title (defaults to the kind title)
    pub title: String,
    /// Position in the graph UI
    pub position: [f32; 2],
    /// Whether the node is selected in the UI
    pub selected: bool,
    kind: NodeKind,
    connections: Vec<Connection>,
    state: NodeState,
}

impl Node {
    /// Create a default-initialized node of a kind
    pub fn new(kind: NodeKind) -> Self {
        Self {
            title: kind.title().to_string(),
            position: [0.0, 0.0],
            selected: false,
            kind,
            connections: Vec::new(),
            state: kind.default_state(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set the literal value (value kinds only; mismatches are ignored)
    pub fn with_value(mut self, value: SlotValue) -> Self {
        self.set_value(value);
        self
    }

    /// Node kind
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Per-kind state
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut NodeState {
        &mut self.state
    }

    /// Declared input slots
    pub fn inputs(&self) -> &'static [Slot] {
        self.kind.inputs()
    }

    /// Declared output slots
    pub fn outputs(&self) -> &'static [Slot] {
        self.kind.outputs()
    }

    /// Find an input slot by name
    pub fn input(&self, name: &str) -> Option<&'static Slot> {
        self.inputs().iter().find(|s| s.name == name)
    }

    /// Find an output slot by name
    pub fn output(&self, name: &str) -> Option<&'static Slot> {
        self.outputs().iter().find(|s| s.name == name)
    }

    /// Every connection this node participates in, on either side
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub(crate) fn push_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// Remove the first record equal to `connection` from this node's list.
    ///
    /// Only this node's list is touched; the other endpoint keeps its copy.
    pub fn delete_connection(&mut self, connection: &Connection) -> bool {
        match self.connections.iter().position(|c| c == connection) {
            Some(index) => {
                self.connections.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear_connections(&mut self) -> Vec<Connection> {
        std::mem::take(&mut self.connections)
    }

    /// Literal value of a value node
    pub fn value(&self) -> Option<SlotValue> {
        match self.state {
            NodeState::Scalar(v) => Some(SlotValue::Scalar(v)),
            NodeState::Vector2(v) => Some(SlotValue::Vector2(v)),
            NodeState::Vector4(v) => Some(SlotValue::Vector4(v)),
            NodeState::Texture(_) | NodeState::Output(_) => None,
        }
    }

    /// Replace the literal value; returns whether anything changed.
    ///
    /// A value of the wrong category (or a non-value node) is ignored.
    pub fn set_value(&mut self, value: SlotValue) -> bool {
        let next = match (&self.state, value) {
            (NodeState::Scalar(_), SlotValue::Scalar(v)) => NodeState::Scalar(v),
            (NodeState::Vector2(_), SlotValue::Vector2(v)) => NodeState::Vector2(v),
            (NodeState::Vector4(_), SlotValue::Vector4(v)) => NodeState::Vector4(v),
            _ => return false,
        };
        if self.state == next {
            return false;
        }
        self.state = next;
        true
    }

    /// Render target this node draws into or publishes
    pub fn render_target(&self) -> RenderTarget {
        match &self.state {
            NodeState::Texture(texture) => texture.render_target(),
            NodeState::Output(output) => output.published,
            NodeState::Scalar(_) | NodeState::Vector2(_) | NodeState::Vector4(_) => {
                RenderTarget::default()
            }
        }
    }

    /// Current value of an output slot
    pub fn output_value(&self, slot: &str) -> Option<SlotValue> {
        self.output(slot)?;
        match &self.state {
            NodeState::Texture(texture) => Some(SlotValue::Texture(texture.render_target())),
            NodeState::Output(_) => None,
            NodeState::Scalar(_) | NodeState::Vector2(_) | NodeState::Vector4(_) => self.value(),
        }
    }

    /// Whether the node can produce its output right now
    pub fn is_renderable(&self) -> bool {
        match &self.state {
            NodeState::Texture(texture) => texture.is_renderable(),
            _ => true,
        }
    }

    /// Create GPU resources. Nodes without resources succeed trivially.
    pub fn initialize(
        &mut self,
        config: &GeneratorConfig,
        backend: &mut dyn Backend,
    ) -> Result<(), BackendError> {
        let Some(pixel) = self.kind.pixel_shader() else {
            return Ok(());
        };
        match &mut self.state {
            NodeState::Texture(texture) => texture.initialize(pixel, config, backend),
            _ => Ok(()),
        }
    }

    /// Release GPU resources owned by this node
    pub fn destroy(&mut self, backend: &mut dyn Backend) {
        match &mut self.state {
            NodeState::Texture(texture) => texture.destroy(backend),
            NodeState::Output(output) => output.published = RenderTarget::default(),
            NodeState::Scalar(_) | NodeState::Vector2(_) | NodeState::Vector4(_) => {}
        }
    }
}
