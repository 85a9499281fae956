// SPDX-License-Identifier: MIT OR Apache-2.0
//! The texture generator application.
//!
//! Runs a fixed number of frames off-screen. Each frame evaluates the graph,
//! hands a freshly published texture to the blur as its mask, renders the
//! scene and blurs it. Results are exported as PNG at the end of the run.

use crate::blur::BlurMask;
use crate::config::AppConfig;
use crate::error::Result;
use crate::gpu::WgpuBackend;
use crate::layout::GraphLayout;
use crate::scene::SceneBackdrop;
use std::path::{Path, PathBuf};
use texgen_graph::{Backend, BackendError, EvaluationOutcome, HeadlessBackend, RenderTarget, TextureGraph};

/// The backend the application renders with
#[derive(Debug)]
pub enum RenderBackend {
    /// wgpu on a real adapter
    Gpu(Box<WgpuBackend>),
    /// No GPU; commands are recorded and dropped
    Headless(HeadlessBackend),
}

impl RenderBackend {
    /// Open a GPU backend, falling back to the headless one
    pub fn select(force_headless: bool) -> Self {
        if force_headless {
            tracing::info!("Headless backend requested");
            return Self::Headless(HeadlessBackend::new());
        }
        match WgpuBackend::new() {
            Ok(gpu) => Self::Gpu(Box::new(gpu)),
            Err(e) => {
                tracing::warn!("{e}, falling back to the headless backend");
                Self::Headless(HeadlessBackend::new())
            }
        }
    }

    /// The backend as a trait object
    pub fn as_dyn(&mut self) -> &mut dyn Backend {
        match self {
            Self::Gpu(gpu) => gpu.as_mut(),
            Self::Headless(headless) => headless,
        }
    }

    /// Read a render target back; `None` when the backend holds no pixels
    pub fn read_render_target(
        &mut self,
        target: RenderTarget,
    ) -> Option<std::result::Result<image::RgbaImage, BackendError>> {
        match self {
            Self::Gpu(gpu) => Some(gpu.read_render_target(target)),
            Self::Headless(_) => None,
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &str {
        match self {
            Self::Gpu(gpu) => gpu.adapter_name(),
            Self::Headless(_) => "headless",
        }
    }
}

/// What one frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Graph evaluation result
    pub outcome: EvaluationOutcome,
    /// Whether the blur mask was replaced this frame
    pub mask_updated: bool,
    /// Texture presented at the end of the frame
    pub presented: RenderTarget,
}

/// Texture generator plus its consumers
#[derive(Debug)]
pub struct TexGenApp {
    config: AppConfig,
    backend: RenderBackend,
    graph: TextureGraph,
    scene: SceneBackdrop,
    blur: BlurMask,
    frame: u32,
    presented: RenderTarget,
}

impl TexGenApp {
    /// Build the graph (from the configured layout or the default one) and its consumers
    pub fn new(config: AppConfig, mut backend: RenderBackend) -> Result<Self> {
        tracing::info!("Rendering with {}", backend.name());
        let gpu = backend.as_dyn();

        let mut graph = match &config.layout {
            Some(path) => GraphLayout::load(path)?.build(config.generator, gpu)?,
            None => TextureGraph::with_default_layout(config.generator, gpu),
        };

        let format = config.generator.texture_format;
        let mut scene = match SceneBackdrop::new(gpu, config.scene_size, format) {
            Ok(scene) => scene,
            Err(e) => {
                graph.shutdown(gpu);
                return Err(e.into());
            }
        };

        let mut blur = match BlurMask::new(gpu, config.scene_size, format, config.blur.params) {
            Ok(blur) => blur,
            Err(e) => {
                scene.destroy(gpu);
                graph.shutdown(gpu);
                return Err(e.into());
            }
        };
        blur.set_enabled(config.blur.enabled);

        Ok(Self {
            config,
            backend,
            graph,
            scene,
            blur,
            frame: 0,
            presented: RenderTarget::default(),
        })
    }

    /// The node graph
    pub fn graph(&self) -> &TextureGraph {
        &self.graph
    }

    /// The node graph, for edits between frames
    pub fn graph_mut(&mut self) -> &mut TextureGraph {
        &mut self.graph
    }

    /// The blur consumer
    pub fn blur(&self) -> &BlurMask {
        &self.blur
    }

    /// The backend in use
    pub fn backend(&self) -> &RenderBackend {
        &self.backend
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u32 {
        self.frame
    }

    /// Run one frame
    pub fn frame(&mut self) -> FrameReport {
        let time = self.config.frame_time(self.frame);
        let backend = self.backend.as_dyn();

        let outcome = self.graph.on_update(backend, time);
        let mask_updated = self.graph.consume_output_updated();
        if mask_updated {
            let published = self.graph.published_output();
            tracing::debug!("Frame {}: new mask {:?}", self.frame, published.handle);
            self.blur.set_mask(published);
        }

        let scene = self.scene.render(backend, time);
        self.presented = self.blur.render(backend, scene);
        self.frame += 1;

        FrameReport {
            outcome,
            mask_updated,
            presented: self.presented,
        }
    }

    /// Run the configured number of frames, then export and save as configured
    pub fn run(&mut self) -> Result<()> {
        for _ in 0..self.config.frames {
            let report = self.frame();
            tracing::debug!("Frame {}: {:?}", self.frame, report.outcome);
        }
        tracing::info!("Ran {} frames", self.frame);

        if self.config.export {
            let written = self.export()?;
            for path in &written {
                tracing::info!("Wrote {}", path.display());
            }
        }
        if let Some(path) = self.config.save_layout.clone() {
            self.save_layout(&path)?;
            tracing::info!("Saved layout to {}", path.display());
        }
        Ok(())
    }

    /// Write the published texture and the presented frame as PNG files
    pub fn export(&mut self) -> Result<Vec<PathBuf>> {
        if matches!(self.backend, RenderBackend::Headless(_)) {
            tracing::info!("Headless backend has no pixels, skipping PNG export");
            return Ok(Vec::new());
        }

        let published = self.graph.published_output();
        let exports = [("texture.png", published), ("scene.png", self.presented)];
        std::fs::create_dir_all(&self.config.output_dir)?;

        let mut written = Vec::new();
        for (name, target) in exports {
            if !target.is_valid() {
                tracing::warn!("Nothing to export for {name}");
                continue;
            }
            let Some(image) = self.backend.read_render_target(target) else {
                continue;
            };
            let path = self.config.output_dir.join(name);
            image?.save(&path)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Save the current graph structure
    pub fn save_layout(&self, path: &Path) -> Result<()> {
        GraphLayout::capture(&self.graph).save(path)
    }

    /// Release every GPU resource
    pub fn shutdown(&mut self) {
        let backend = self.backend.as_dyn();
        self.blur.destroy(backend);
        self.scene.destroy(backend);
        self.graph.shutdown(backend);
        self.presented = RenderTarget::default();
        tracing::info!("Shut down after {} frames", self.frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use texgen_graph::{NodeKind, SlotValue, TextureFormat};

    fn headless_app(config: AppConfig) -> TexGenApp {
        TexGenApp::new(config, RenderBackend::Headless(HeadlessBackend::new())).unwrap()
    }

    fn headless(app: &TexGenApp) -> &HeadlessBackend {
        match app.backend() {
            RenderBackend::Headless(backend) => backend,
            RenderBackend::Gpu(_) => unreachable!(),
        }
    }

    #[test]
    fn test_first_frame_updates_mask() {
        let mut app = headless_app(AppConfig::default());
        let report = app.frame();

        assert!(matches!(report.outcome, EvaluationOutcome::Evaluated { .. }));
        assert!(report.mask_updated);
        assert_eq!(app.blur().mask(), app.graph().published_output());
        assert_eq!(report.presented, app.blur().result());

        let second = app.frame();
        assert_eq!(second.outcome, EvaluationOutcome::Skipped);
        assert!(!second.mask_updated);
        app.shutdown();
    }

    #[test]
    fn test_edit_republishes() {
        let mut app = headless_app(AppConfig::default());
        app.frame();

        let scalar = app
            .graph()
            .nodes()
            .find(|(_, node)| node.kind() == NodeKind::Scalar)
            .map(|(id, _)| id)
            .unwrap();
        assert!(app.graph_mut().set_value(scalar, SlotValue::Scalar(8.0)).unwrap());
        assert!(app.frame().mask_updated);
        app.shutdown();
    }

    #[test]
    fn test_consumers_use_generator_format() {
        let mut config = AppConfig::default();
        config.generator.texture_format = TextureFormat::Rgba8Unorm;
        let mut app = headless_app(config);
        let report = app.frame();

        assert_eq!(report.presented.format, TextureFormat::Rgba8Unorm);
        assert_eq!(app.blur().mask().format, TextureFormat::Rgba8Unorm);
        app.shutdown();
    }

    #[test]
    fn test_disabled_blur_presents_scene() {
        let mut config = AppConfig::default();
        config.blur.enabled = false;
        let mut app = headless_app(config);
        let report = app.frame();
        assert_ne!(report.presented, app.blur().result());
        app.shutdown();
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut app = headless_app(AppConfig::default());
        app.run().unwrap();
        assert_eq!(app.frame_count(), 3);
        app.shutdown();
        assert_eq!(headless(&app).live_total(), 0);
    }

    #[test]
    fn test_headless_export_is_skipped() {
        let mut app = headless_app(AppConfig::default());
        app.frame();
        assert!(app.export().unwrap().is_empty());
        app.shutdown();
    }

    #[test]
    fn test_missing_layout_file() {
        let config = AppConfig {
            layout: Some(PathBuf::from("/nonexistent/texgen-layout.ron")),
            ..AppConfig::default()
        };
        let result = TexGenApp::new(config, RenderBackend::Headless(HeadlessBackend::new()));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_scene_failure_is_reported() {
        let config = AppConfig {
            scene_size: [0, 0],
            ..AppConfig::default()
        };
        let result = TexGenApp::new(config, RenderBackend::Headless(HeadlessBackend::new()));
        assert!(matches!(result, Err(AppError::Backend(_))));
    }

    #[test]
    fn test_layout_roundtrip_through_app() {
        let path = std::env::temp_dir().join(format!("texgen-app-layout-{}.ron", std::process::id()));
        let mut app = headless_app(AppConfig::default());
        app.save_layout(&path).unwrap();
        app.shutdown();

        let config = AppConfig {
            layout: Some(path.clone()),
            ..AppConfig::default()
        };
        let mut restored = headless_app(config);
        assert_eq!(restored.graph().node_count(), 4);
        assert!(restored.frame().mask_updated);
        restored.shutdown();
        std::fs::remove_file(&path).unwrap();
    }
}
