//! WGSL shaders for the vector display
//!
//! These shaders render:
//! - Line ribbons modulated by the falloff texture and per-frame opacity
//! - Separable 9-tap Gaussian blur for the glow buffers
//! - Scaled blits for the final scene + glow composite

/// Line ribbon shader
///
/// Vertices arrive in framebuffer pixels and carry their own colour. The
/// falloff texture shapes the cross-section; `alpha` fades older frames.
pub const LINE_SHADER: &str = r#"
// ============================================================================
// Phosphor Line Shader
// ============================================================================

struct LineUniforms {
    projection: mat4x4<f32>,
    alpha: f32,
    _padding0: f32,
    _padding1: f32,
    _padding2: f32,
}

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) uv: vec2<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: LineUniforms;
@group(0) @binding(1) var falloff_texture: texture_2d<f32>;
@group(0) @binding(2) var falloff_sampler: sampler;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = uniforms.projection * vec4<f32>(in.position, 1.0);
    out.color = in.color;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let falloff = textureSample(falloff_texture, falloff_sampler, in.uv);
    return in.color * falloff * vec4<f32>(1.0, 1.0, 1.0, uniforms.alpha);
}
"#;

/// Fullscreen vertex stage shared by the blur and composite passes
const FULLSCREEN_VERTEX: &str = r#"
struct BlitUniforms {
    scale: vec2<f32>,
    alpha: f32,
    mult: f32,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: BlitUniforms;
@group(0) @binding(1) var source_texture: texture_2d<f32>;
@group(0) @binding(2) var source_sampler: sampler;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var out: VertexOutput;

    // Fullscreen triangle
    let uv = vec2<f32>(
        f32((vertex_index << 1u) & 2u),
        f32(vertex_index & 2u)
    );

    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);

    return out;
}
"#;

/// Separable Gaussian blur
///
/// `uniforms.scale` is one texel along the blur axis and zero across it.
/// Weights match `phosphor_core::config::BLUR_WEIGHTS`.
const BLUR_FRAGMENT: &str = r#"
// ============================================================================
// Phosphor Glow Blur
// ============================================================================

fn tap(uv: vec2<f32>, offset: f32) -> vec4<f32> {
    return textureSample(source_texture, source_sampler, uv + offset * uniforms.scale);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var color = vec4<f32>(0.0);
    color += tap(in.uv, -4.0) * 0.05;
    color += tap(in.uv, -3.0) * 0.09;
    color += tap(in.uv, -2.0) * 0.12;
    color += tap(in.uv, -1.0) * 0.15;
    color += tap(in.uv,  0.0) * 0.16;
    color += tap(in.uv,  1.0) * 0.15;
    color += tap(in.uv,  2.0) * 0.12;
    color += tap(in.uv,  3.0) * 0.09;
    color += tap(in.uv,  4.0) * 0.05;
    let m = uniforms.mult;
    return color * vec4<f32>(m, m, m, uniforms.alpha * m);
}
"#;

/// Scaled texture blit for the final composite
const COMPOSITE_FRAGMENT: &str = r#"
// ============================================================================
// Phosphor Compositor
// ============================================================================

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(source_texture, source_sampler, in.uv);
    let m = uniforms.mult;
    return color * vec4<f32>(m, m, m, uniforms.alpha * m);
}
"#;

/// Full WGSL source of the blur shader
pub fn blur_shader() -> String {
    format!("{}{}", FULLSCREEN_VERTEX, BLUR_FRAGMENT)
}

/// Full WGSL source of the composite shader
pub fn composite_shader() -> String {
    format!("{}{}", FULLSCREEN_VERTEX, COMPOSITE_FRAGMENT)
}
