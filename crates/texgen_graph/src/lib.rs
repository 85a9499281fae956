// SPDX-License-Identifier: MIT OR Apache-2.0
//! Procedural texture generator driven by a node graph.
//!
//! Value nodes (scalars, vectors) feed texture nodes, each of which renders a
//! full-screen pass into its own render target. The Output node publishes the
//! texture bound to its input.
//!
//! ## Architecture
//!
//! - [`TextureGraph`] owns a generation-checked node arena, the entry point
//!   and the dirty/output-updated flags
//! - Connections are stored in both endpoint nodes
//! - Evaluation walks producer edges from the entry point and drives a
//!   [`Backend`]; [`HeadlessBackend`] records commands instead of rendering
//! - [`GraphEditorState`] is an egui editor over the graph

pub mod backend;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod evaluation;
pub mod graph;
pub mod headless;
pub mod node;
pub mod params;
pub mod shaders;
pub mod slot;
pub mod ui;

pub use backend::{Backend, BackendError, RenderTarget, ShaderSource, TextureFormat};
pub use catalog::NodeCatalog;
pub use config::GeneratorConfig;
pub use connection::Connection;
pub use evaluation::EvaluationOutcome;
pub use graph::{ConnectionError, GraphError, TextureGraph};
pub use headless::HeadlessBackend;
pub use node::{Node, NodeId, NodeKind, NodeState};
pub use slot::{Slot, SlotCategory, SlotDirection, SlotValue};
pub use ui::GraphEditorState;
