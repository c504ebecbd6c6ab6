//! Bind group layouts, samplers and render pipelines
//!
//! Everything here is independent of the display resolution and survives a
//! resize.

use std::borrow::Cow;

use phosphor_core::Vertex;

use crate::config::{Accumulation, DisplayConfig};
use crate::shaders::{blur_shader, composite_shader, LINE_SHADER};
use crate::uniforms::{BlitUniforms, LineUniforms};

/// Format of the scene and glow render targets
pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub(crate) struct BindGroupLayouts {
    /// Line uniforms (dynamic offset), falloff texture, sampler
    pub line: wgpu::BindGroupLayout,
    /// Blit uniforms, source texture, sampler
    pub blit: wgpu::BindGroupLayout,
}

pub(crate) struct ShaderModules {
    pub line: wgpu::ShaderModule,
    pub blur: wgpu::ShaderModule,
    pub composite: wgpu::ShaderModule,
}

pub(crate) struct Pipelines {
    /// Line ribbons into the scene buffer, blended per accumulation policy
    pub scene: wgpu::RenderPipeline,
    /// Gaussian blur between glow buffers (src-over)
    pub blur: wgpu::RenderPipeline,
    /// Additive scene + glow composite onto the caller's target
    pub composite: wgpu::RenderPipeline,
    line_layout: wgpu::PipelineLayout,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

pub(crate) fn create_bind_group_layouts(device: &wgpu::Device) -> BindGroupLayouts {
    let line = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Phosphor Line Bind Group Layout"),
        entries: &[
            // One LineUniforms slot per decay frame
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<LineUniforms>() as u64
                    ),
                },
                count: None,
            },
            texture_entry(1),
            sampler_entry(2),
        ],
    });

    let blit = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Phosphor Blit Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<BlitUniforms>() as u64
                    ),
                },
                count: None,
            },
            texture_entry(1),
            sampler_entry(2),
        ],
    });

    BindGroupLayouts { line, blit }
}

pub(crate) fn create_shader_modules(device: &wgpu::Device) -> ShaderModules {
    let line = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Phosphor Line Shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(LINE_SHADER)),
    });
    let blur = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Phosphor Blur Shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(blur_shader())),
    });
    let composite = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Phosphor Composite Shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(composite_shader())),
    });
    ShaderModules {
        line,
        blur,
        composite,
    }
}

/// Linear, clamped sampler used for every texture read
pub(crate) fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Phosphor Linear Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn primitive_state() -> wgpu::PrimitiveState {
    // Ribbon winding flips with turn direction, so nothing is culled
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        unclipped_depth: false,
        polygon_mode: wgpu::PolygonMode::Fill,
        conservative: false,
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position: vec3<f32>
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            // color: vec4<f32>
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 12,
                shader_location: 1,
            },
            // uv: vec2<f32>
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 28,
                shader_location: 2,
            },
        ],
    }
}

fn create_scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    accumulation: Accumulation,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Phosphor Scene Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: SCENE_FORMAT,
                blend: Some(accumulation.blend_state()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: primitive_state(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: primitive_state(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl Pipelines {
    pub(crate) fn new(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        shaders: &ShaderModules,
        config: &DisplayConfig,
    ) -> Self {
        let line_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Phosphor Line Pipeline Layout"),
            bind_group_layouts: &[&layouts.line],
            push_constant_ranges: &[],
        });
        let blit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Phosphor Blit Pipeline Layout"),
            bind_group_layouts: &[&layouts.blit],
            push_constant_ranges: &[],
        });

        let scene = create_scene_pipeline(device, &line_layout, &shaders.line, config.accumulation);

        let blur = create_fullscreen_pipeline(
            device,
            "Phosphor Blur Pipeline",
            &blit_layout,
            &shaders.blur,
            SCENE_FORMAT,
            wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        );

        let additive = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };
        let composite = create_fullscreen_pipeline(
            device,
            "Phosphor Composite Pipeline",
            &blit_layout,
            &shaders.composite,
            config.texture_format,
            wgpu::BlendState {
                color: additive,
                alpha: additive,
            },
        );

        Self {
            scene,
            blur,
            composite,
            line_layout,
        }
    }

    /// Swap the scene blend without touching the other pipelines
    pub(crate) fn rebuild_scene(
        &mut self,
        device: &wgpu::Device,
        shaders: &ShaderModules,
        accumulation: Accumulation,
    ) {
        self.scene = create_scene_pipeline(device, &self.line_layout, &shaders.line, accumulation);
    }
}
