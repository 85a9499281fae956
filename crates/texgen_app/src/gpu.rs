// SPDX-License-Identifier: MIT OR Apache-2.0
//! wgpu implementation of the generator backend.
//!
//! Rendering is entirely off-screen. Every draw is encoded as its own render
//! pass and submitted immediately; a pending clear becomes the load op of the
//! next pass on the same target, or an empty pass when the target changes
//! without a draw.

use crate::error::{AppError, Result};
use egui_wgpu::wgpu;
use std::collections::HashMap;
use texgen_graph::backend::{BufferHandle, PipelineHandle, TextureHandle, TEXTURE_SLOT_COUNT};
use texgen_graph::{Backend, BackendError, RenderTarget, ShaderSource, TextureFormat};

/// Size of the buffer bound when a pass selected no parameter buffer
const FALLBACK_BUFFER_SIZE: u64 = 256;

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    target: RenderTarget,
}

struct GpuPipeline {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    vertex_entry: &'static str,
    fragment_entry: &'static str,
    label: &'static str,
    /// One pipeline per render target format
    variants: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
}

#[derive(Default)]
struct PassState {
    target: TextureHandle,
    clear: Option<[f32; 4]>,
    pipeline: PipelineHandle,
    buffer: BufferHandle,
    textures: [TextureHandle; TEXTURE_SLOT_COUNT as usize],
}

/// Off-screen wgpu renderer
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    fallback_view: wgpu::TextureView,
    fallback_buffer: wgpu::Buffer,
    next_handle: u64,
    textures: HashMap<u64, GpuTexture>,
    pipelines: HashMap<u64, GpuPipeline>,
    buffers: HashMap<u64, GpuBuffer>,
    pass: PassState,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter_name)
            .field("textures", &self.textures.len())
            .field("pipelines", &self.pipelines.len())
            .field("buffers", &self.buffers.len())
            .finish_non_exhaustive()
    }
}

impl WgpuBackend {
    /// Open the first suitable adapter
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| AppError::RendererInit("no compatible GPU adapter".to_string()))?;

        let adapter_name = adapter.get_info().name;
        tracing::info!("Using GPU adapter: {adapter_name}");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("texgen_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                ..Default::default()
            },
            None,
        ))
        .map_err(|e| AppError::RendererInit(e.to_string()))?;

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texgen_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(2),
                texture_entry(3),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("texgen_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texgen_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let fallback_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("texgen_fallback_texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &fallback_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[0, 0, 0, 0],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let fallback_view = fallback_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let fallback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("texgen_fallback_parameters"),
            size: FALLBACK_BUFFER_SIZE,
            usage: wgpu::BufferUsages::UNIFORM,
            mapped_at_creation: false,
        });

        Ok(Self {
            device,
            queue,
            adapter_name,
            bind_group_layout,
            pipeline_layout,
            sampler,
            fallback_view,
            fallback_buffer,
            next_handle: 0,
            textures: HashMap::new(),
            pipelines: HashMap::new(),
            buffers: HashMap::new(),
            pass: PassState::default(),
        })
    }

    /// Name of the adapter in use
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Number of live resources
    pub fn live_total(&self) -> usize {
        self.textures.len() + self.pipelines.len() + self.buffers.len()
    }

    fn allocate_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Run `create` inside a validation error scope
    fn scoped<T>(&self, create: impl FnOnce(&wgpu::Device) -> T) -> std::result::Result<T, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let memory = pollster::block_on(self.device.pop_error_scope());
        match validation.or(memory) {
            Some(error) => Err(error.to_string()),
            None => Ok(value),
        }
    }

    fn build_variant(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        pipeline: &GpuPipeline,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(pipeline.label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &pipeline.vertex,
                entry_point: Some(pipeline.vertex_entry),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &pipeline.fragment,
                entry_point: Some(pipeline.fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Encode a pass that only clears the current target
    fn flush_clear(&mut self) {
        let Some(color) = self.pass.clear.take() else {
            return;
        };
        let Some(target) = self.textures.get(&self.pass.target.0) else {
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("texgen_clear"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("texgen_clear_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(to_color(color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Copy a render target back to the CPU as 8-bit RGBA
    pub fn read_render_target(&mut self, target: RenderTarget) -> std::result::Result<image::RgbaImage, BackendError> {
        self.flush_clear();
        let texture = self
            .textures
            .get(&target.handle.0)
            .ok_or(BackendError::UnknownHandle(target.handle.0))?;
        let RenderTarget { width, height, format, .. } = texture.target;

        let bytes_per_pixel = bytes_per_pixel(format);
        let unpadded = width * bytes_per_pixel;
        let padded = padded_bytes_per_row(unpadded);

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("texgen_readback"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("texgen_readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|e| BackendError::Readback(e.to_string()))?
            .map_err(|e| BackendError::Readback(e.to_string()))?;

        let pixels = {
            let mapped = slice.get_mapped_range();
            let mut pixels = Vec::with_capacity((width * height * 4) as usize);
            for row in mapped.chunks(padded as usize).take(height as usize) {
                let row = &row[..unpadded as usize];
                if bytes_per_pixel == 1 {
                    pixels.extend(row.iter().flat_map(|&v| [v, v, v, 255]));
                } else {
                    pixels.extend_from_slice(row);
                }
            }
            pixels
        };
        staging.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| BackendError::Readback("pixel buffer size mismatch".to_string()))
    }
}

impl Backend for WgpuBackend {
    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> std::result::Result<RenderTarget, BackendError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(BackendError::RenderTargetCreation {
                width,
                height,
                reason: format!("size must be between 1 and {max}"),
            });
        }

        let texture = self
            .scoped(|device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("texgen_render_target"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: to_wgpu_format(format),
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                })
            })
            .map_err(|reason| BackendError::RenderTargetCreation { width, height, reason })?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let handle = TextureHandle(self.allocate_handle());
        let target = RenderTarget {
            handle,
            width,
            height,
            format,
        };
        self.textures.insert(handle.0, GpuTexture { texture, view, target });
        tracing::trace!("Created {width}x{height} {format:?} render target {}", handle.0);
        Ok(target)
    }

    fn create_shader_pipeline(
        &mut self,
        vertex: &ShaderSource,
        pixel: &ShaderSource,
    ) -> std::result::Result<PipelineHandle, BackendError> {
        let layout = &self.pipeline_layout;
        let pipeline = self
            .scoped(|device| {
                let module = |source: &ShaderSource| {
                    device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(source.label),
                        source: wgpu::ShaderSource::Wgsl(source.wgsl.into()),
                    })
                };
                let mut pipeline = GpuPipeline {
                    vertex: module(vertex),
                    fragment: module(pixel),
                    vertex_entry: vertex.entry_point,
                    fragment_entry: pixel.entry_point,
                    label: pixel.label,
                    variants: HashMap::new(),
                };
                let format = to_wgpu_format(TextureFormat::default());
                let variant = Self::build_variant(device, layout, &pipeline, format);
                pipeline.variants.insert(format, variant);
                pipeline
            })
            .map_err(|reason| BackendError::PipelineCreation {
                label: pixel.label.to_string(),
                reason,
            })?;

        let handle = self.allocate_handle();
        self.pipelines.insert(handle, pipeline);
        tracing::trace!("Created pipeline '{}' {handle}", pixel.label);
        Ok(PipelineHandle(handle))
    }

    fn create_parameter_buffer(&mut self, size: usize) -> std::result::Result<BufferHandle, BackendError> {
        let rounded = (size.max(1) as u64).div_ceil(16) * 16;
        let buffer = self
            .scoped(|device| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("texgen_parameters"),
                    size: rounded,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .map_err(|reason| BackendError::BufferCreation { size, reason })?;

        let handle = self.allocate_handle();
        self.buffers.insert(handle, GpuBuffer { buffer, size: rounded });
        Ok(BufferHandle(handle))
    }

    fn update_parameter_buffer(&mut self, buffer: BufferHandle, bytes: &[u8]) {
        let Some(gpu) = self.buffers.get(&buffer.0) else {
            tracing::warn!("Update of unknown parameter buffer {}", buffer.0);
            return;
        };
        let mut data = bytes.to_vec();
        if data.len() as u64 > gpu.size {
            tracing::warn!(
                "Parameter block of {} bytes truncated to {} bytes",
                data.len(),
                gpu.size
            );
            data.truncate(gpu.size as usize);
        }
        data.resize(data.len().next_multiple_of(4), 0);
        self.queue.write_buffer(&gpu.buffer, 0, &data);
    }

    fn bind_texture(&mut self, slot: u32, target: RenderTarget) {
        match self.pass.textures.get_mut(slot as usize) {
            Some(bound) => *bound = target.handle,
            None => tracing::warn!("Texture slot {slot} out of range"),
        }
    }

    fn set_render_target(&mut self, target: RenderTarget) {
        if self.pass.target != target.handle {
            self.flush_clear();
        }
        self.pass.target = target.handle;
    }

    fn clear_render_target(&mut self, color: [f32; 4]) {
        self.pass.clear = Some(color);
    }

    fn set_pipeline(&mut self, pipeline: PipelineHandle) {
        self.pass.pipeline = pipeline;
    }

    fn set_parameter_buffer(&mut self, buffer: BufferHandle) {
        self.pass.buffer = buffer;
    }

    fn draw(&mut self, vertex_count: u32) {
        let Some(target) = self.textures.get(&self.pass.target.0) else {
            tracing::warn!("Draw issued without a render target");
            return;
        };
        let format = to_wgpu_format(target.target.format);

        let Some(pipeline) = self.pipelines.get_mut(&self.pass.pipeline.0) else {
            tracing::warn!("Draw issued without a pipeline");
            return;
        };
        if !pipeline.variants.contains_key(&format) {
            tracing::debug!("Building '{}' for {format:?}", pipeline.label);
            let variant = Self::build_variant(&self.device, &self.pipeline_layout, pipeline, format);
            pipeline.variants.insert(format, variant);
        }
        let Some(render_pipeline) = pipeline.variants.get(&format) else {
            return;
        };

        let buffer = self
            .buffers
            .get(&self.pass.buffer.0)
            .map_or(&self.fallback_buffer, |b| &b.buffer);

        let views: Vec<&wgpu::TextureView> = self
            .pass
            .textures
            .iter()
            .map(|handle| {
                if *handle == self.pass.target {
                    tracing::warn!("Texture {} is bound while being drawn into", handle.0);
                    return &self.fallback_view;
                }
                self.textures
                    .get(&handle.0)
                    .map_or(&self.fallback_view, |t| &t.view)
            })
            .collect();

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texgen_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(views[1]),
                },
            ],
        });

        let load = match self.pass.clear.take() {
            Some(color) => wgpu::LoadOp::Clear(to_color(color)),
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("texgen_draw"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("texgen_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(render_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..vertex_count, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn unbind_render_targets(&mut self) {
        self.flush_clear();
        self.pass = PassState::default();
    }

    fn destroy_render_target(&mut self, target: RenderTarget) {
        match self.textures.remove(&target.handle.0) {
            Some(gpu) => gpu.texture.destroy(),
            None => tracing::warn!("Destroying unknown render target {}", target.handle.0),
        }
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        if self.pipelines.remove(&pipeline.0).is_none() {
            tracing::warn!("Destroying unknown pipeline {}", pipeline.0);
        }
    }

    fn destroy_parameter_buffer(&mut self, buffer: BufferHandle) {
        match self.buffers.remove(&buffer.0) {
            Some(gpu) => gpu.buffer.destroy(),
            None => tracing::warn!("Destroying unknown parameter buffer {}", buffer.0),
        }
    }
}

fn to_wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
    }
}

fn to_color([r, g, b, a]: [f32; 4]) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: f64::from(a),
    }
}

fn bytes_per_pixel(format: TextureFormat) -> u32 {
    match format {
        TextureFormat::R8Unorm => 1,
        TextureFormat::Rgba8UnormSrgb | TextureFormat::Rgba8Unorm => 4,
    }
}

/// Row pitch required by texture-to-buffer copies
fn padded_bytes_per_row(unpadded: u32) -> u32 {
    unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use texgen_graph::shaders::FULLSCREEN_VS;

    #[test]
    fn test_row_padding() {
        assert_eq!(padded_bytes_per_row(4), 256);
        assert_eq!(padded_bytes_per_row(256), 256);
        assert_eq!(padded_bytes_per_row(1024 * 4), 4096);
        assert_eq!(padded_bytes_per_row(257), 512);
    }

    #[test]
    fn test_format_mapping() {
        assert_eq!(to_wgpu_format(TextureFormat::R8Unorm), wgpu::TextureFormat::R8Unorm);
        assert_eq!(bytes_per_pixel(TextureFormat::R8Unorm), 1);
        assert_eq!(bytes_per_pixel(TextureFormat::Rgba8Unorm), 4);
    }

    // Needs a GPU; returns early when no adapter is available
    #[test]
    fn test_clear_and_readback() {
        let Ok(mut gpu) = WgpuBackend::new() else {
            return;
        };
        let target = gpu
            .create_render_target(8, 4, TextureFormat::Rgba8Unorm)
            .unwrap();
        gpu.set_render_target(target);
        gpu.clear_render_target([1.0, 0.0, 0.0, 1.0]);
        gpu.unbind_render_targets();

        let image = gpu.read_render_target(target).unwrap();
        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(image.get_pixel(3, 2).0, [255, 0, 0, 255]);

        gpu.destroy_render_target(target);
        assert_eq!(gpu.live_total(), 0);
    }

    #[test]
    fn test_invalid_shader_reports_error() {
        let Ok(mut gpu) = WgpuBackend::new() else {
            return;
        };
        let broken = ShaderSource {
            label: "broken",
            wgsl: "this is not wgsl",
            entry_point: "fs_main",
        };
        let err = gpu.create_shader_pipeline(&FULLSCREEN_VS, &broken).unwrap_err();
        assert!(matches!(err, BackendError::PipelineCreation { .. }));
        assert_eq!(gpu.live_total(), 0);
    }
}
