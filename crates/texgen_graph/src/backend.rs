// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graphics backend contract consumed by the node graph.
//!
//! The graph never talks to a graphics API directly. Texture-producing nodes
//! create their resources through [`Backend`] at initialization, issue one
//! full-screen draw per evaluation, and release everything explicitly before
//! they are dropped. Resources are exclusively owned by the node that created
//! them; the only thing ever handed out is a [`RenderTarget`] view, which is a
//! plain `Copy` value and carries no ownership.
//!
//! ## Binding model
//!
//! Every pipeline shares one fixed binding layout:
//!
//! | group | binding | resource                         |
//! |-------|---------|----------------------------------|
//! | 0     | 0       | parameter block (uniform buffer) |
//! | 0     | 1       | linear sampler                   |
//! | 0     | 2       | texture slot 0                   |
//! | 0     | 3       | texture slot 1                   |

use serde::{Deserialize, Serialize};

/// Number of texture slots a pass can bind
pub const TEXTURE_SLOT_COUNT: u32 = 2;

macro_rules! resource_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u64);

        impl $name {
            /// The empty handle, never returned by a successful creation call
            pub const INVALID: Self = Self(0);

            /// Whether this handle refers to a resource at all
            pub fn is_valid(&self) -> bool {
                self.0 != 0
            }
        }
    };
}

resource_handle!(
    /// Handle to a render target (a texture that can be drawn into and sampled)
    TextureHandle
);
resource_handle!(
    /// Handle to a vertex + pixel shader pipeline
    PipelineHandle
);
resource_handle!(
    /// Handle to a parameter (constant/uniform) buffer
    BufferHandle
);

/// Pixel format of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit RGBA, sRGB encoded
    #[default]
    Rgba8UnormSrgb,
    /// 8-bit RGBA, linear
    Rgba8Unorm,
    /// 8-bit single channel, linear
    R8Unorm,
}

/// A by-value view of a render target.
///
/// Copying this does not transfer ownership: whoever created the underlying
/// texture is the only one allowed to destroy it. The default value is the
/// empty view (invalid handle, zero size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderTarget {
    /// Backend texture handle
    pub handle: TextureHandle,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
}

impl RenderTarget {
    /// Whether this view refers to a live texture
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }
}

/// A named WGSL shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    /// Debug label
    pub label: &'static str,
    /// WGSL source code
    pub wgsl: &'static str,
    /// Entry point function name
    pub entry_point: &'static str,
}

/// Errors reported by a backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Render target could not be created
    #[error("Failed to create {width}x{height} render target: {reason}")]
    RenderTargetCreation {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Backend specific reason
        reason: String,
    },

    /// Shader pipeline could not be created
    #[error("Failed to create shader pipeline '{label}': {reason}")]
    PipelineCreation {
        /// Pixel stage label
        label: String,
        /// Backend specific reason
        reason: String,
    },

    /// Parameter buffer could not be created
    #[error("Failed to create {size}-byte parameter buffer: {reason}")]
    BufferCreation {
        /// Requested size in bytes
        size: usize,
        /// Backend specific reason
        reason: String,
    },

    /// A handle did not refer to a live resource
    #[error("Unknown resource handle: {0}")]
    UnknownHandle(u64),

    /// Reading a render target back to the CPU failed
    #[error("Readback failed: {0}")]
    Readback(String),
}

/// The graphics API surface the generator depends on.
///
/// Creation calls report failure; everything else is fire-and-forget, in the
/// spirit of an immediate context. Commands issued between
/// [`set_render_target`](Backend::set_render_target) and
/// [`unbind_render_targets`](Backend::unbind_render_targets) form one pass.
pub trait Backend {
    /// Create a render target
    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<RenderTarget, BackendError>;

    /// Create a shader pipeline from a vertex and a pixel stage
    fn create_shader_pipeline(
        &mut self,
        vertex: &ShaderSource,
        pixel: &ShaderSource,
    ) -> Result<PipelineHandle, BackendError>;

    /// Create a parameter buffer of the given size (rounded up to 16 bytes by the backend)
    fn create_parameter_buffer(&mut self, size: usize) -> Result<BufferHandle, BackendError>;

    /// Upload new contents into a parameter buffer
    fn update_parameter_buffer(&mut self, buffer: BufferHandle, bytes: &[u8]);

    /// Bind a texture to a sampling slot; an invalid target unbinds the slot
    fn bind_texture(&mut self, slot: u32, target: RenderTarget);

    /// Make `target` the current draw destination
    fn set_render_target(&mut self, target: RenderTarget);

    /// Clear the current draw destination
    fn clear_render_target(&mut self, color: [f32; 4]);

    /// Select the pipeline used by the next draw
    fn set_pipeline(&mut self, pipeline: PipelineHandle);

    /// Select the parameter buffer bound to the pixel stage
    fn set_parameter_buffer(&mut self, buffer: BufferHandle);

    /// Draw `vertex_count` vertices without a vertex buffer
    fn draw(&mut self, vertex_count: u32);

    /// End the current pass and reset bindings
    fn unbind_render_targets(&mut self);

    /// Release a render target
    fn destroy_render_target(&mut self, target: RenderTarget);

    /// Release a shader pipeline
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);

    /// Release a parameter buffer
    fn destroy_parameter_buffer(&mut self, buffer: BufferHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_render_target_is_empty() {
        let target = RenderTarget::default();
        assert!(!target.is_valid());
        assert_eq!(target.width, 0);
        assert_eq!(target.handle, TextureHandle::INVALID);
    }

    #[test]
    fn test_handle_validity() {
        assert!(!PipelineHandle::INVALID.is_valid());
        assert!(BufferHandle(7).is_valid());
    }
}
