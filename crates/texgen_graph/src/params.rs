// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter blocks uploaded to each texture node's parameter buffer.
//!
//! Layouts match the WGSL structs in `shaders/` and are padded to 16-byte
//! multiples as uniform buffers require.

use bytemuck::{Pod, Zeroable};

/// Rectangle parameters
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct RectangleParams {
    /// Bounds `[x1, y1, x2, y2]`
    pub bounds: [f32; 4],
    /// Corner radius
    pub chamfer: f32,
    /// Edge softness
    pub falloff: f32,
    /// Padding for 16-byte alignment
    pub _pad: [f32; 2],
}

/// Loop (tiling) parameters
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LoopParams {
    /// Repetitions per axis
    pub repeat: [f32; 2],
    /// Padding for 16-byte alignment
    pub _pad: [f32; 2],
}

/// Sine distortion parameters
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SineDistParams {
    /// Wave count along X
    pub count_x: f32,
    /// Amplitude along X
    pub ampl_x: f32,
    /// Wave count along Y
    pub count_y: f32,
    /// Amplitude along Y
    pub ampl_y: f32,
}

/// Environment map parameters
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct EnvironmentMapParams {
    /// Yaw and pitch, in turns
    pub rotation: [f32; 2],
    /// Padding for 16-byte alignment
    pub _pad: [f32; 2],
}

/// The parameter block of one texture node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamBlock {
    /// Rectangle
    Rectangle(RectangleParams),
    /// Loop
    Loop(LoopParams),
    /// Sine distortion
    SineDist(SineDistParams),
    /// Environment map
    EnvironmentMap(EnvironmentMapParams),
}

impl ParamBlock {
    /// Raw bytes as uploaded to the GPU
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Rectangle(p) => bytemuck::bytes_of(p),
            Self::Loop(p) => bytemuck::bytes_of(p),
            Self::SineDist(p) => bytemuck::bytes_of(p),
            Self::EnvironmentMap(p) => bytemuck::bytes_of(p),
        }
    }

    /// Size of the block in bytes
    pub fn size(&self) -> usize {
        self.as_bytes().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_are_uniform_aligned() {
        let blocks = [
            ParamBlock::Rectangle(RectangleParams::default()),
            ParamBlock::Loop(LoopParams::default()),
            ParamBlock::SineDist(SineDistParams::default()),
            ParamBlock::EnvironmentMap(EnvironmentMapParams::default()),
        ];
        for block in blocks {
            assert_eq!(block.size() % 16, 0, "{block:?}");
        }
    }

    #[test]
    fn test_rectangle_byte_layout() {
        let block = ParamBlock::Rectangle(RectangleParams {
            bounds: [1.0, 2.0, 3.0, 4.0],
            chamfer: 5.0,
            falloff: 6.0,
            _pad: [0.0; 2],
        });
        let floats: &[f32] = bytemuck::cast_slice(block.as_bytes());
        assert_eq!(&floats[..6], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
