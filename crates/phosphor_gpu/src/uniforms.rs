//! Uniform layouts shared with the WGSL shaders
//!
//! All structures use `#[repr(C)]` and implement `bytemuck::Pod` so they can
//! be copied straight into uniform buffers.

use phosphor_core::config::Z_FAR;

/// Per-draw uniforms for the line shader
///
/// Memory layout:
/// - projection: `mat4x4<f32>` (64 bytes)
/// - alpha: `f32`              (4 bytes)
/// - _padding: 3 x `f32`       (12 bytes)
/// Total: 80 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineUniforms {
    /// Framebuffer pixels to clip space (column-major)
    pub projection: [[f32; 4]; 4],
    /// Opacity of the frame being drawn
    pub alpha: f32,
    pub _padding: [f32; 3],
}

/// Uniforms for the blur and composite shaders
///
/// Memory layout:
/// - scale: `vec2<f32>` (8 bytes) - texel step of the blur, zero for blits
/// - alpha: `f32`       (4 bytes)
/// - mult: `f32`        (4 bytes)
/// Total: 16 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlitUniforms {
    pub scale: [f32; 2],
    pub alpha: f32,
    pub mult: f32,
}

impl BlitUniforms {
    /// Horizontal blur step over a `width` wide glow buffer
    pub fn horizontal_blur(width: u32, mult: f32) -> Self {
        Self {
            scale: [1.0 / width.max(1) as f32, 0.0],
            alpha: 1.0,
            mult,
        }
    }

    /// Vertical blur step over a `height` tall glow buffer
    pub fn vertical_blur(height: u32, mult: f32) -> Self {
        Self {
            scale: [0.0, 1.0 / height.max(1) as f32],
            alpha: 1.0,
            mult,
        }
    }

    /// Plain textured copy scaled by `mult`
    pub fn blit(mult: f32) -> Self {
        Self {
            scale: [0.0, 0.0],
            alpha: 1.0,
            mult,
        }
    }
}

/// Orthographic projection mapping framebuffer pixels (origin top-left,
/// y down) to clip space, with depth `z / Z_FAR`
pub fn ortho(width: f32, height: f32) -> [[f32; 4]; 4] {
    [
        [2.0 / width, 0.0, 0.0, 0.0],
        [0.0, -2.0 / height, 0.0, 0.0],
        [0.0, 0.0, 1.0 / Z_FAR, 0.0],
        [-1.0, 1.0, 0.0, 1.0],
    ]
}

/// Distance between consecutive dynamic-offset line uniforms
pub fn line_uniform_stride(min_alignment: u32) -> u64 {
    let size = std::mem::size_of::<LineUniforms>() as u64;
    let align = min_alignment.max(1) as u64;
    size.div_ceil(align) * align
}

/// Pack one `LineUniforms` per opacity at `stride` byte intervals
pub fn pack_line_uniforms(projection: [[f32; 4]; 4], alphas: &[f32], stride: u64) -> Vec<u8> {
    let stride = stride as usize;
    let mut bytes = vec![0u8; stride * alphas.len()];
    for (i, &alpha) in alphas.iter().enumerate() {
        let uniforms = LineUniforms {
            projection,
            alpha,
            _padding: [0.0; 3],
        };
        let start = i * stride;
        bytes[start..start + std::mem::size_of::<LineUniforms>()]
            .copy_from_slice(bytemuck::bytes_of(&uniforms));
    }
    bytes
}
