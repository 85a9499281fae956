// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame evaluation of the texture graph.
//!
//! A pass runs only when the graph is dirty. Nodes are evaluated in
//! [`TextureGraph::visit`] order: each texture node resolves its inputs,
//! uploads its parameter block, binds its texture inputs and draws one
//! full-screen triangle into its own render target. The Output node copies
//! its input's render target by value.

use crate::backend::{Backend, RenderTarget, TEXTURE_SLOT_COUNT};
use crate::graph::TextureGraph;
use crate::node::{NodeId, NodeKind, NodeState};
use crate::params::{
    EnvironmentMapParams, LoopParams, ParamBlock, RectangleParams, SineDistParams,
};

/// Result of [`TextureGraph::on_update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// Nothing changed since the last pass
    Skipped,
    /// The graph was dirty but has no entry point
    NoOutput,
    /// A pass ran
    Evaluated {
        /// Nodes finalized
        nodes: usize,
        /// Draws issued
        draws: usize,
    },
}

/// What a node needs from the backend this pass, computed from its inputs
#[derive(Debug, Clone, Copy)]
enum Step {
    Nothing,
    Draw {
        params: ParamBlock,
        textures: [RenderTarget; TEXTURE_SLOT_COUNT as usize],
    },
    Publish(RenderTarget),
}

impl TextureGraph {
    /// Re-evaluate the graph if it is dirty.
    ///
    /// Never fails: a missing entry point yields [`EvaluationOutcome::NoOutput`]
    /// and nodes that cannot render are skipped with a warning. After a pass
    /// with an entry point the output-updated flag is raised.
    pub fn on_update(&mut self, backend: &mut dyn Backend, time: f32) -> EvaluationOutcome {
        if !self.is_dirty() {
            return EvaluationOutcome::Skipped;
        }

        let order = self.evaluation_order();
        if order.is_empty() {
            tracing::warn!("Texture graph has no entry point; nothing published");
            self.finish_pass(false);
            return EvaluationOutcome::NoOutput;
        }

        let mut draws = 0;
        for id in &order {
            if self.evaluate_node(*id, backend) {
                draws += 1;
            }
        }

        tracing::debug!(
            "Evaluated {} nodes ({draws} draws) at t={time:.3}",
            order.len()
        );
        self.finish_pass(true);
        EvaluationOutcome::Evaluated {
            nodes: order.len(),
            draws,
        }
    }

    fn plan(&self, id: NodeId, kind: NodeKind) -> Step {
        let none = RenderTarget::default();
        match kind {
            NodeKind::Scalar | NodeKind::Vector2 | NodeKind::Vector4 => Step::Nothing,
            NodeKind::Rectangle => {
                let bounds = self.resolve_input(id, "Position", [0.5f32, 0.5, 1.0, 1.0]);
                let chamfer = self.resolve_input(id, "Chamfer", 3.0f32);
                let falloff = self.resolve_input(id, "Falloff", 0.0f32);
                Step::Draw {
                    params: ParamBlock::Rectangle(RectangleParams {
                        bounds,
                        chamfer,
                        falloff,
                        _pad: [0.0; 2],
                    }),
                    textures: [none, none],
                }
            }
            NodeKind::Loop => Step::Draw {
                params: ParamBlock::Loop(LoopParams {
                    repeat: self.resolve_input(id, "Repeat", [1.0, 1.0]),
                    _pad: [0.0; 2],
                }),
                textures: [self.resolve_input(id, "Input", none), none],
            },
            NodeKind::SineDistortion => {
                let [count_x, count_y] = self.resolve_input(id, "Count", [0.0f32, 0.0]);
                let [ampl_x, ampl_y] = self.resolve_input(id, "Amplitude", [0.0f32, 0.0]);
                Step::Draw {
                    params: ParamBlock::SineDist(SineDistParams {
                        count_x,
                        ampl_x,
                        count_y,
                        ampl_y,
                    }),
                    textures: [self.resolve_input(id, "Input", none), none],
                }
            }
            NodeKind::EnvironmentMap => Step::Draw {
                params: ParamBlock::EnvironmentMap(EnvironmentMapParams {
                    rotation: self.resolve_input(id, "Rotation", [0.0, 0.0]),
                    _pad: [0.0; 2],
                }),
                textures: [self.resolve_input(id, "Input", none), none],
            },
            NodeKind::Output => Step::Publish(self.resolve_input(id, "Input", none)),
        }
    }

    /// Evaluate one node; returns whether a draw was issued
    fn evaluate_node(&mut self, id: NodeId, backend: &mut dyn Backend) -> bool {
        let Some(kind) = self.node(id).map(|n| n.kind()) else {
            return false;
        };
        let step = self.plan(id, kind);
        let clear_color = self.config().clear_color;
        let vertex_count = self.config().vertex_count;

        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let title = node.title.clone();

        match (step, node.state_mut()) {
            (Step::Draw { params, textures }, NodeState::Texture(texture)) => {
                texture.params = params;
                if !texture.is_renderable() {
                    tracing::warn!("Skipping non-renderable node '{title}' ({id})");
                    return false;
                }

                backend.update_parameter_buffer(texture.parameter_buffer(), params.as_bytes());
                backend.set_render_target(texture.render_target());
                backend.clear_render_target(clear_color);
                for (slot, target) in (0..TEXTURE_SLOT_COUNT).zip(textures) {
                    backend.bind_texture(slot, target);
                }
                backend.set_pipeline(texture.pipeline());
                backend.set_parameter_buffer(texture.parameter_buffer());
                backend.draw(vertex_count);
                backend.unbind_render_targets();
                true
            }
            (Step::Publish(target), NodeState::Output(output)) => {
                output.published = target;
                false
            }
            (Step::Nothing, _) => false,
            (_, state) => {
                tracing::warn!("Node '{title}' has unexpected state {state:?}");
                false
            }
        }
    }
}
