// SPDX-License-Identifier: MIT OR Apache-2.0
//! WGSL stages used by the texture-producing node kinds.

use crate::backend::ShaderSource;

/// Full-screen triangle vertex stage shared by every pass
pub const FULLSCREEN_VS: ShaderSource = ShaderSource {
    label: "fullscreen_triangle",
    wgsl: include_str!("shaders/fullscreen.wgsl"),
    entry_point: "vs_main",
};

/// Rounded rectangle with soft edges
pub const RECTANGLE_FS: ShaderSource = ShaderSource {
    label: "rectangle",
    wgsl: include_str!("shaders/rectangle.wgsl"),
    entry_point: "fs_main",
};

/// Tiles the input texture
pub const LOOP_FS: ShaderSource = ShaderSource {
    label: "loop",
    wgsl: include_str!("shaders/loop.wgsl"),
    entry_point: "fs_main",
};

/// Per-axis sine offset of the input texture
pub const SINE_DIST_FS: ShaderSource = ShaderSource {
    label: "sine_dist",
    wgsl: include_str!("shaders/sine_dist.wgsl"),
    entry_point: "fs_main",
};

/// Latitude/longitude re-projection of the input texture
pub const ENVIRONMENT_MAP_FS: ShaderSource = ShaderSource {
    label: "environment_map",
    wgsl: include_str!("shaders/environment_map.wgsl"),
    entry_point: "fs_main",
};
