// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-pass blur of the scene, modulated by a mask texture.
//!
//! The mask is normally the texture generator's published output. It is only
//! ever borrowed: [`BlurMask::destroy`] releases the intermediate targets, the
//! pipelines and a built-in fallback mask, never a mask handed in through
//! [`BlurMask::set_mask`].

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use texgen_graph::backend::{BufferHandle, PipelineHandle};
use texgen_graph::shaders::FULLSCREEN_VS;
use texgen_graph::{Backend, BackendError, RenderTarget, ShaderSource, TextureFormat};

const BLUR_X_FS: ShaderSource = ShaderSource {
    label: "blur_x",
    wgsl: include_str!("shaders/blur_x.wgsl"),
    entry_point: "fs_main",
};

const BLUR_Y_FS: ShaderSource = ShaderSource {
    label: "blur_y",
    wgsl: include_str!("shaders/blur_y.wgsl"),
    entry_point: "fs_main",
};

const DEFAULT_MASK_FS: ShaderSource = ShaderSource {
    label: "blur_default_mask",
    wgsl: include_str!("shaders/mask.wgsl"),
    entry_point: "fs_main",
};

const CLEAR_COLOR: [f32; 4] = [0.0, 0.2, 0.4, 1.0];

/// Blur shader parameters
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurParams {
    /// 0 is a box filter, 1 a gaussian
    pub smooth: f32,
    /// Overall blur length
    pub size: f32,
    /// Sample count per axis, normalized
    pub samples: [f32; 2],
    /// Direction weight per axis
    pub direction: [f32; 2],
    /// Blur length per axis
    pub power: [f32; 2],
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            smooth: 0.963,
            size: 0.643,
            samples: [0.352, 0.536],
            direction: [0.488, 0.664],
            power: [0.376, 0.423],
        }
    }
}

/// Masked two-pass blur
#[derive(Debug)]
pub struct BlurMask {
    params: BlurParams,
    enabled: bool,
    pass_x: PipelineHandle,
    pass_y: PipelineHandle,
    mask_pipeline: PipelineHandle,
    parameter_buffer: BufferHandle,
    intermediate: RenderTarget,
    result: RenderTarget,
    default_mask: RenderTarget,
    mask: RenderTarget,
}

impl BlurMask {
    /// Create the blur resources. Nothing is leaked on failure.
    pub fn new(
        backend: &mut dyn Backend,
        size: [u32; 2],
        format: TextureFormat,
        params: BlurParams,
    ) -> Result<Self, BackendError> {
        let mut blur = Self {
            params,
            enabled: true,
            pass_x: PipelineHandle::INVALID,
            pass_y: PipelineHandle::INVALID,
            mask_pipeline: PipelineHandle::INVALID,
            parameter_buffer: BufferHandle::INVALID,
            intermediate: RenderTarget::default(),
            result: RenderTarget::default(),
            default_mask: RenderTarget::default(),
            mask: RenderTarget::default(),
        };

        if let Err(e) = blur.create(backend, size, format) {
            blur.destroy(backend);
            return Err(e);
        }
        blur.draw_default_mask(backend);
        blur.mask = blur.default_mask;
        Ok(blur)
    }

    fn create(
        &mut self,
        backend: &mut dyn Backend,
        [width, height]: [u32; 2],
        format: TextureFormat,
    ) -> Result<(), BackendError> {
        self.pass_x = backend.create_shader_pipeline(&FULLSCREEN_VS, &BLUR_X_FS)?;
        self.pass_y = backend.create_shader_pipeline(&FULLSCREEN_VS, &BLUR_Y_FS)?;
        self.mask_pipeline = backend.create_shader_pipeline(&FULLSCREEN_VS, &DEFAULT_MASK_FS)?;
        self.parameter_buffer = backend.create_parameter_buffer(size_of::<BlurParams>())?;
        self.intermediate = backend.create_render_target(width, height, format)?;
        self.result = backend.create_render_target(width, height, format)?;
        self.default_mask = backend.create_render_target(width, height, format)?;
        Ok(())
    }

    fn draw_default_mask(&self, backend: &mut dyn Backend) {
        backend.set_render_target(self.default_mask);
        backend.clear_render_target([0.0, 0.0, 0.0, 1.0]);
        backend.set_pipeline(self.mask_pipeline);
        backend.set_parameter_buffer(self.parameter_buffer);
        backend.draw(3);
        backend.unbind_render_targets();
    }

    /// Use `mask` from now on; an empty target restores the built-in mask
    pub fn set_mask(&mut self, mask: RenderTarget) {
        self.mask = if mask.is_valid() {
            mask
        } else {
            tracing::debug!("Empty blur mask, using the built-in one");
            self.default_mask
        };
    }

    /// Current mask
    pub fn mask(&self) -> RenderTarget {
        self.mask
    }

    /// Output of the last blur
    pub fn result(&self) -> RenderTarget {
        self.result
    }

    /// Turn the blur on or off
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Blur `scene` and return the texture to present (the scene itself when disabled)
    pub fn render(&self, backend: &mut dyn Backend, scene: RenderTarget) -> RenderTarget {
        if !self.enabled {
            return scene;
        }

        backend.update_parameter_buffer(self.parameter_buffer, bytemuck::bytes_of(&self.params));
        let passes = [
            (self.intermediate, scene, self.pass_x),
            (self.result, self.intermediate, self.pass_y),
        ];
        for (target, source, pipeline) in passes {
            backend.set_render_target(target);
            backend.clear_render_target(CLEAR_COLOR);
            backend.bind_texture(0, source);
            backend.bind_texture(1, self.mask);
            backend.set_pipeline(pipeline);
            backend.set_parameter_buffer(self.parameter_buffer);
            backend.draw(3);
        }
        backend.unbind_render_targets();
        self.result
    }

    /// Release everything the blur owns
    pub fn destroy(&mut self, backend: &mut dyn Backend) {
        for pipeline in [self.pass_x, self.pass_y, self.mask_pipeline] {
            if pipeline.is_valid() {
                backend.destroy_pipeline(pipeline);
            }
        }
        if self.parameter_buffer.is_valid() {
            backend.destroy_parameter_buffer(self.parameter_buffer);
        }
        for target in [self.intermediate, self.result, self.default_mask] {
            if target.is_valid() {
                backend.destroy_render_target(target);
            }
        }

        self.pass_x = PipelineHandle::INVALID;
        self.pass_y = PipelineHandle::INVALID;
        self.mask_pipeline = PipelineHandle::INVALID;
        self.parameter_buffer = BufferHandle::INVALID;
        self.intermediate = RenderTarget::default();
        self.result = RenderTarget::default();
        self.default_mask = RenderTarget::default();
        self.mask = RenderTarget::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texgen_graph::headless::{Command, ResourceKind};
    use texgen_graph::HeadlessBackend;

    fn blur(backend: &mut HeadlessBackend) -> BlurMask {
        BlurMask::new(backend, [64, 32], TextureFormat::Rgba8UnormSrgb, BlurParams::default()).unwrap()
    }

    #[test]
    fn test_params_layout() {
        assert_eq!(size_of::<BlurParams>(), 32);
        let params = BlurParams::default();
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&params));
        assert_eq!(floats, &[0.963, 0.643, 0.352, 0.536, 0.488, 0.664, 0.376, 0.423]);
    }

    #[test]
    fn test_creation_draws_default_mask() {
        let mut backend = HeadlessBackend::new();
        let blur = blur(&mut backend);
        assert_eq!(backend.live_count(ResourceKind::Pipeline), 3);
        assert_eq!(backend.live_count(ResourceKind::RenderTarget), 3);
        assert_eq!(backend.live_count(ResourceKind::ParameterBuffer), 1);
        assert_eq!(backend.draw_targets(), vec![blur.mask().handle]);
    }

    #[test]
    fn test_two_passes_with_borrowed_mask() {
        let mut backend = HeadlessBackend::new();
        let blur_mask = {
            let mut blur = blur(&mut backend);
            let scene = backend.create_render_target(64, 32, TextureFormat::Rgba8UnormSrgb).unwrap();
            let mask = backend.create_render_target(64, 32, TextureFormat::Rgba8UnormSrgb).unwrap();
            blur.set_mask(mask);
            backend.clear_commands();

            let presented = blur.render(&mut backend, scene);
            assert_eq!(presented, blur.result());
            assert_eq!(backend.draw_count(), 2);
            assert_eq!(
                backend.draw_targets(),
                vec![blur.intermediate.handle, blur.result().handle]
            );
            assert!(backend.commands().contains(&Command::BindTexture {
                slot: 1,
                texture: mask.handle
            }));
            assert!(backend.commands().contains(&Command::BindTexture {
                slot: 0,
                texture: blur.intermediate.handle
            }));

            blur.destroy(&mut backend);
            mask
        };

        // Only the scene and the borrowed mask survive.
        assert!(backend.is_live(blur_mask.handle.0));
        assert_eq!(backend.live_total(), 2);
    }

    #[test]
    fn test_empty_mask_restores_default() {
        let mut backend = HeadlessBackend::new();
        let mut blur = blur(&mut backend);
        let builtin = blur.mask();
        blur.set_mask(RenderTarget::default());
        assert_eq!(blur.mask(), builtin);
    }

    #[test]
    fn test_disabled_passes_scene_through() {
        let mut backend = HeadlessBackend::new();
        let mut blur = blur(&mut backend);
        let scene = backend.create_render_target(64, 32, TextureFormat::Rgba8UnormSrgb).unwrap();
        blur.set_enabled(false);
        backend.clear_commands();

        assert_eq!(blur.render(&mut backend, scene), scene);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_failure_leaks_nothing() {
        let mut backend = HeadlessBackend::new();
        backend.fail.render_targets = true;
        let result = BlurMask::new(
            &mut backend,
            [64, 32],
            TextureFormat::Rgba8UnormSrgb,
            BlurParams::default(),
        );
        assert!(matches!(result, Err(BackendError::RenderTargetCreation { .. })));
        assert_eq!(backend.live_total(), 0);
    }
}
