// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application configuration, read from a RON file.

use crate::blur::BlurParams;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use texgen_graph::GeneratorConfig;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "texgen.ron";

/// Blur post-process settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurSettings {
    /// Run the blur at all
    pub enabled: bool,
    /// Shader parameters
    pub params: BlurParams,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            params: BlurParams::default(),
        }
    }
}

/// Top-level application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Texture generator settings
    pub generator: GeneratorConfig,
    /// Number of frames to run
    pub frames: u32,
    /// Simulated frame rate, used to derive the time passed to each update
    pub frame_rate: f32,
    /// Graph layout to load instead of the default graph
    pub layout: Option<PathBuf>,
    /// Write the default graph's layout here on exit
    pub save_layout: Option<PathBuf>,
    /// Directory PNG exports are written to
    pub output_dir: PathBuf,
    /// Export the published texture and the blurred scene as PNG
    pub export: bool,
    /// Use the headless backend even if a GPU is available
    pub headless: bool,
    /// Scene render target size
    pub scene_size: [u32; 2],
    /// Blur settings
    pub blur: BlurSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            frames: 3,
            frame_rate: 60.0,
            layout: None,
            save_layout: None,
            output_dir: PathBuf::from("output"),
            export: true,
            headless: false,
            scene_size: [1280, 720],
            blur: BlurSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Load settings, falling back to defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let config = Self::load(path)?;
            tracing::info!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            tracing::info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        ron::from_str(content).map_err(|e| AppError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Time in seconds at the start of `frame`
    pub fn frame_time(&self, frame: u32) -> f32 {
        if self.frame_rate > 0.0 {
            frame as f32 / self.frame_rate
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::parse(
            "(frames: 10, generator: (texture_size: (256, 256)), headless: true)",
            Path::new("test.ron"),
        )
        .unwrap();
        assert_eq!(config.frames, 10);
        assert!(config.headless);
        assert_eq!(config.generator.texture_size, [256, 256]);
        assert_eq!(config.generator.vertex_count, 3);
        assert_eq!(config.scene_size, [1280, 720]);
        assert!(config.blur.enabled);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = AppConfig::parse("(frames: \"many\")", Path::new("bad.ron")).unwrap_err();
        assert!(err.to_string().contains("bad.ron"));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("texgen-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);

        let config = AppConfig {
            frames: 7,
            layout: Some(PathBuf::from("graph.ron")),
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = AppConfig::load_or_default(Path::new("/definitely/not/here.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_frame_time() {
        let config = AppConfig::default();
        assert_eq!(config.frame_time(30), 0.5);
        let frozen = AppConfig {
            frame_rate: 0.0,
            ..AppConfig::default()
        };
        assert_eq!(frozen.frame_time(30), 0.0);
    }
}
