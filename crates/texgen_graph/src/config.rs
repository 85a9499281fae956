// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generator configuration.

use crate::backend::TextureFormat;
use serde::{Deserialize, Serialize};

/// Settings shared by every texture-producing node of a graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Render target size in pixels `[width, height]`
    pub texture_size: [u32; 2],
    /// Render target format
    pub texture_format: TextureFormat,
    /// Color every target is cleared to before its pass
    pub clear_color: [f32; 4],
    /// Vertices per full-screen pass
    pub vertex_count: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            texture_size: [1024, 1024],
            texture_format: TextureFormat::Rgba8UnormSrgb,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            vertex_count: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.texture_size, [1024, 1024]);
        assert_eq!(config.vertex_count, 3);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: GeneratorConfig = ron::from_str("(texture_size: (256, 128))").unwrap();
        assert_eq!(config.texture_size, [256, 128]);
        assert_eq!(config.texture_format, TextureFormat::Rgba8UnormSrgb);
        assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);
    }
}
