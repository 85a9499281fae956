// SPDX-License-Identifier: MIT OR Apache-2.0
//! Procedural scene that the blur is applied to.

use bytemuck::{Pod, Zeroable};
use texgen_graph::backend::{BufferHandle, PipelineHandle};
use texgen_graph::shaders::FULLSCREEN_VS;
use texgen_graph::{Backend, BackendError, RenderTarget, ShaderSource, TextureFormat};

const SCENE_FS: ShaderSource = ShaderSource {
    label: "scene",
    wgsl: include_str!("shaders/scene.wgsl"),
    entry_point: "fs_main",
};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct SceneParams {
    light_dir: [f32; 4],
    sky: [f32; 4],
    time: f32,
    aspect: f32,
    _pad: [f32; 2],
}

/// Full-screen scene render target
#[derive(Debug)]
pub struct SceneBackdrop {
    pipeline: PipelineHandle,
    parameter_buffer: BufferHandle,
    target: RenderTarget,
}

impl SceneBackdrop {
    /// Create the scene resources
    pub fn new(
        backend: &mut dyn Backend,
        [width, height]: [u32; 2],
        format: TextureFormat,
    ) -> Result<Self, BackendError> {
        let pipeline = backend.create_shader_pipeline(&FULLSCREEN_VS, &SCENE_FS)?;
        let parameter_buffer = match backend.create_parameter_buffer(size_of::<SceneParams>()) {
            Ok(buffer) => buffer,
            Err(e) => {
                backend.destroy_pipeline(pipeline);
                return Err(e);
            }
        };
        let target = match backend.create_render_target(width, height, format) {
            Ok(target) => target,
            Err(e) => {
                backend.destroy_parameter_buffer(parameter_buffer);
                backend.destroy_pipeline(pipeline);
                return Err(e);
            }
        };
        Ok(Self {
            pipeline,
            parameter_buffer,
            target,
        })
    }

    /// The scene texture
    pub fn target(&self) -> RenderTarget {
        self.target
    }

    /// Draw the scene at `time`
    pub fn render(&self, backend: &mut dyn Backend, time: f32) -> RenderTarget {
        let angle = time * 0.5;
        let params = SceneParams {
            light_dir: [angle.cos(), 0.8, angle.sin().abs() + 0.5, 0.0],
            sky: [0.0, 0.2, 0.4, 1.0],
            time,
            aspect: self.target.width as f32 / self.target.height.max(1) as f32,
            _pad: [0.0; 2],
        };
        backend.update_parameter_buffer(self.parameter_buffer, bytemuck::bytes_of(&params));
        backend.set_render_target(self.target);
        backend.clear_render_target([0.0, 0.2, 0.4, 1.0]);
        backend.set_pipeline(self.pipeline);
        backend.set_parameter_buffer(self.parameter_buffer);
        backend.draw(3);
        backend.unbind_render_targets();
        self.target
    }

    /// Release the scene resources
    pub fn destroy(&mut self, backend: &mut dyn Backend) {
        backend.destroy_pipeline(self.pipeline);
        backend.destroy_parameter_buffer(self.parameter_buffer);
        backend.destroy_render_target(self.target);
        self.pipeline = PipelineHandle::INVALID;
        self.parameter_buffer = BufferHandle::INVALID;
        self.target = RenderTarget::default();
    }
}
