// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory backend that records commands instead of rendering.
//!
//! Used when no GPU is available and as the test double for everything that
//! talks to a [`Backend`]. Handles are allocated from a single counter so they
//! are unique across resource kinds, and every resource is tracked until it is
//! destroyed, which makes ownership mistakes (leaks, double frees, destroying a
//! borrowed view) observable.

use crate::backend::{
    Backend, BackendError, BufferHandle, PipelineHandle, RenderTarget, ShaderSource,
    TextureFormat, TextureHandle,
};
use std::collections::BTreeMap;

/// Kind of a tracked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Render target
    RenderTarget,
    /// Shader pipeline
    Pipeline,
    /// Parameter buffer
    ParameterBuffer,
}

/// A recorded backend command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Render target switched
    SetRenderTarget(TextureHandle),
    /// Current target cleared
    Clear([f32; 4]),
    /// Pipeline selected
    SetPipeline(PipelineHandle),
    /// Parameter buffer selected
    SetParameterBuffer(BufferHandle),
    /// Parameter buffer contents replaced
    UpdateParameterBuffer {
        /// Buffer written
        buffer: BufferHandle,
        /// New contents
        bytes: Vec<u8>,
    },
    /// Texture bound to a slot
    BindTexture {
        /// Slot index
        slot: u32,
        /// Bound texture (invalid when unbinding)
        texture: TextureHandle,
    },
    /// Draw issued
    Draw(u32),
    /// Pass ended
    Unbind,
}

/// Which creation calls should fail
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureInjection {
    /// Fail `create_render_target`
    pub render_targets: bool,
    /// Fail `create_shader_pipeline`
    pub pipelines: bool,
    /// Fail `create_parameter_buffer`
    pub buffers: bool,
}

#[derive(Debug, Clone)]
struct Resource {
    kind: ResourceKind,
    label: String,
    contents: Vec<u8>,
}

/// Backend that performs no rendering and records what it was asked to do
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u64,
    resources: BTreeMap<u64, Resource>,
    commands: Vec<Command>,
    current_target: TextureHandle,
    /// Failure injection switches
    pub fail: FailureInjection,
}

impl HeadlessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands recorded so far
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Forget recorded commands (resources stay alive)
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of live resources of a kind
    pub fn live_count(&self, kind: ResourceKind) -> usize {
        self.resources.values().filter(|r| r.kind == kind).count()
    }

    /// Total number of live resources
    pub fn live_total(&self) -> usize {
        self.resources.len()
    }

    /// Whether a raw handle value refers to a live resource
    pub fn is_live(&self, handle: u64) -> bool {
        self.resources.contains_key(&handle)
    }

    /// Last contents uploaded into a parameter buffer
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.resources
            .get(&buffer.0)
            .filter(|r| r.kind == ResourceKind::ParameterBuffer)
            .map(|r| r.contents.as_slice())
    }

    /// Render targets that received a draw, in submission order
    pub fn draw_targets(&self) -> Vec<TextureHandle> {
        let mut current = TextureHandle::INVALID;
        let mut targets = Vec::new();
        for command in &self.commands {
            match command {
                Command::SetRenderTarget(handle) => current = *handle,
                Command::Draw(_) => targets.push(current),
                _ => {}
            }
        }
        targets
    }

    /// Number of draws recorded
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw(_)))
            .count()
    }

    fn allocate(&mut self, kind: ResourceKind, label: impl Into<String>) -> u64 {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.resources.insert(
            handle,
            Resource {
                kind,
                label: label.into(),
                contents: Vec::new(),
            },
        );
        handle
    }

    fn release(&mut self, handle: u64, kind: ResourceKind) {
        match self.resources.get(&handle) {
            Some(resource) if resource.kind == kind => {
                self.resources.remove(&handle);
            }
            Some(resource) => {
                tracing::warn!(
                    "Refusing to destroy handle {handle} ({}): it is a {:?}, not a {kind:?}",
                    resource.label,
                    resource.kind
                );
            }
            None => {
                tracing::warn!("Destroying unknown {kind:?} handle {handle}");
            }
        }
    }
}

impl Backend for HeadlessBackend {
    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<RenderTarget, BackendError> {
        if self.fail.render_targets || width == 0 || height == 0 {
            return Err(BackendError::RenderTargetCreation {
                width,
                height,
                reason: "headless failure".to_string(),
            });
        }
        let handle = self.allocate(ResourceKind::RenderTarget, format!("{width}x{height} {format:?}"));
        Ok(RenderTarget {
            handle: TextureHandle(handle),
            width,
            height,
            format,
        })
    }

    fn create_shader_pipeline(
        &mut self,
        vertex: &ShaderSource,
        pixel: &ShaderSource,
    ) -> Result<PipelineHandle, BackendError> {
        if self.fail.pipelines {
            return Err(BackendError::PipelineCreation {
                label: pixel.label.to_string(),
                reason: "headless failure".to_string(),
            });
        }
        let handle = self.allocate(
            ResourceKind::Pipeline,
            format!("{}+{}", vertex.label, pixel.label),
        );
        Ok(PipelineHandle(handle))
    }

    fn create_parameter_buffer(&mut self, size: usize) -> Result<BufferHandle, BackendError> {
        if self.fail.buffers {
            return Err(BackendError::BufferCreation {
                size,
                reason: "headless failure".to_string(),
            });
        }
        let handle = self.allocate(ResourceKind::ParameterBuffer, format!("{size} bytes"));
        if let Some(resource) = self.resources.get_mut(&handle) {
            resource.contents = vec![0; (size | 15) + 1];
        }
        Ok(BufferHandle(handle))
    }

    fn update_parameter_buffer(&mut self, buffer: BufferHandle, bytes: &[u8]) {
        match self.resources.get_mut(&buffer.0) {
            Some(resource) if resource.kind == ResourceKind::ParameterBuffer => {
                resource.contents = bytes.to_vec();
            }
            _ => tracing::warn!("Update of unknown parameter buffer {}", buffer.0),
        }
        self.commands.push(Command::UpdateParameterBuffer {
            buffer,
            bytes: bytes.to_vec(),
        });
    }

    fn bind_texture(&mut self, slot: u32, target: RenderTarget) {
        self.commands.push(Command::BindTexture {
            slot,
            texture: target.handle,
        });
    }

    fn set_render_target(&mut self, target: RenderTarget) {
        self.current_target = target.handle;
        self.commands.push(Command::SetRenderTarget(target.handle));
    }

    fn clear_render_target(&mut self, color: [f32; 4]) {
        self.commands.push(Command::Clear(color));
    }

    fn set_pipeline(&mut self, pipeline: PipelineHandle) {
        self.commands.push(Command::SetPipeline(pipeline));
    }

    fn set_parameter_buffer(&mut self, buffer: BufferHandle) {
        self.commands.push(Command::SetParameterBuffer(buffer));
    }

    fn draw(&mut self, vertex_count: u32) {
        if !self.current_target.is_valid() {
            tracing::warn!("Draw issued without a render target");
        }
        self.commands.push(Command::Draw(vertex_count));
    }

    fn unbind_render_targets(&mut self) {
        self.current_target = TextureHandle::INVALID;
        self.commands.push(Command::Unbind);
    }

    fn destroy_render_target(&mut self, target: RenderTarget) {
        self.release(target.handle.0, ResourceKind::RenderTarget);
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        self.release(pipeline.0, ResourceKind::Pipeline);
    }

    fn destroy_parameter_buffer(&mut self, buffer: BufferHandle) {
        self.release(buffer.0, ResourceKind::ParameterBuffer);
    }
}
