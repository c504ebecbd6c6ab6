//! Backend configuration
//!
//! Choices fixed for the lifetime of the GPU resources. Changing the
//! accumulation policy afterwards only rebuilds the scene pipeline.

use phosphor_core::FalloffTexture;

/// How overlapping line geometry combines in the scene buffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Accumulation {
    /// Colour `src * srcA + dst * dstA`, alpha `max(src, dst)`
    ///
    /// Overdraw never darkens, like phosphor hit twice by the beam.
    #[default]
    Phosphor,
    /// Colour `src * srcA + dst`, alpha `src + dst`
    Additive,
    /// Standard src-over alpha blending
    Alpha,
}

impl Accumulation {
    /// Blend state used by the scene pipeline
    pub fn blend_state(self) -> wgpu::BlendState {
        match self {
            Accumulation::Phosphor => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::DstAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                // Min/Max require unit factors
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Max,
                },
            },
            Accumulation::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
            Accumulation::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        }
    }
}

/// Storage format of the line falloff texture
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FalloffFormat {
    /// Half floats, packed with the core half-float codec
    #[default]
    Rgba16Float,
    /// 8-bit normalized, for adapters without filterable half floats
    Rgba8Unorm,
}

impl FalloffFormat {
    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            FalloffFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            FalloffFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    /// Bytes per texel
    pub fn texel_size(self) -> u32 {
        match self {
            FalloffFormat::Rgba16Float => 8,
            FalloffFormat::Rgba8Unorm => 4,
        }
    }

    /// Encode the falloff mask for upload
    pub fn encode(self, texture: &FalloffTexture) -> Vec<u8> {
        match self {
            FalloffFormat::Rgba16Float => texture
                .to_rgba_f16()
                .iter()
                .flat_map(|texel| texel.to_le_bytes())
                .collect(),
            FalloffFormat::Rgba8Unorm => texture.to_rgba8(),
        }
    }
}

/// Configuration for a vector display's GPU backend
#[derive(Clone, Debug)]
pub struct DisplayConfig {
    /// Format of the target view passed to `render`
    pub texture_format: wgpu::TextureFormat,
    /// Falloff texture storage
    pub falloff_format: FalloffFormat,
    /// Scene accumulation policy
    pub accumulation: Accumulation,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            texture_format: wgpu::TextureFormat::Bgra8Unorm,
            falloff_format: FalloffFormat::default(),
            accumulation: Accumulation::default(),
        }
    }
}
