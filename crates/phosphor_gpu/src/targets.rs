//! Resolution-dependent render targets
//!
//! The scene texture matches the display size; the two glow textures are a
//! third of it on each axis. Blur and composite bind groups reference these
//! views, so the whole set is rebuilt together on resize.

use wgpu::util::DeviceExt;

use phosphor_core::config::{BLUR_GAIN, SCENE_MULT};

use crate::pipelines::SCENE_FORMAT;
use crate::uniforms::BlitUniforms;

/// A sampled colour target
pub(crate) struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, label: &str, (width, height): (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SCENE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

pub(crate) struct RenderTargets {
    pub size: (u32, u32),
    pub glow_size: (u32, u32),
    pub scene: RenderTarget,
    pub glow0: RenderTarget,
    pub glow1: RenderTarget,
    uniform_buffers: Vec<wgpu::Buffer>,
    glow_uniforms: wgpu::Buffer,
    /// Horizontal blur reading the scene (first pass)
    pub blur_h_from_scene: wgpu::BindGroup,
    /// Horizontal blur reading glow1 (later passes)
    pub blur_h_from_glow: wgpu::BindGroup,
    /// Vertical blur reading glow0
    pub blur_v: wgpu::BindGroup,
    /// Scene blit onto the destination
    pub composite_scene: wgpu::BindGroup,
    /// Glow blit onto the destination
    pub composite_glow: wgpu::BindGroup,
}

fn blit_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    uniforms: &wgpu::Buffer,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn uniform_buffer(device: &wgpu::Device, label: &str, uniforms: BlitUniforms) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(&uniforms),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

impl RenderTargets {
    pub(crate) fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: (u32, u32),
        glow_size: (u32, u32),
        glow_mult: f32,
    ) -> Self {
        let scene = RenderTarget::new(device, "Phosphor Scene Texture", size);
        let glow0 = RenderTarget::new(device, "Phosphor Glow0 Texture", glow_size);
        let glow1 = RenderTarget::new(device, "Phosphor Glow1 Texture", glow_size);

        let h_uniforms = uniform_buffer(
            device,
            "Phosphor Horizontal Blur Uniforms",
            BlitUniforms::horizontal_blur(glow_size.0, BLUR_GAIN),
        );
        let v_uniforms = uniform_buffer(
            device,
            "Phosphor Vertical Blur Uniforms",
            BlitUniforms::vertical_blur(glow_size.1, BLUR_GAIN),
        );
        let scene_uniforms = uniform_buffer(
            device,
            "Phosphor Scene Composite Uniforms",
            BlitUniforms::blit(SCENE_MULT),
        );
        let glow_uniforms = uniform_buffer(
            device,
            "Phosphor Glow Composite Uniforms",
            BlitUniforms::blit(glow_mult),
        );

        let blur_h_from_scene = blit_bind_group(
            device,
            "Phosphor Blur H (scene)",
            layout,
            &h_uniforms,
            &scene.view,
            sampler,
        );
        let blur_h_from_glow = blit_bind_group(
            device,
            "Phosphor Blur H (glow1)",
            layout,
            &h_uniforms,
            &glow1.view,
            sampler,
        );
        let blur_v = blit_bind_group(
            device,
            "Phosphor Blur V (glow0)",
            layout,
            &v_uniforms,
            &glow0.view,
            sampler,
        );
        let composite_scene = blit_bind_group(
            device,
            "Phosphor Composite (scene)",
            layout,
            &scene_uniforms,
            &scene.view,
            sampler,
        );
        let composite_glow = blit_bind_group(
            device,
            "Phosphor Composite (glow)",
            layout,
            &glow_uniforms,
            &glow1.view,
            sampler,
        );

        Self {
            size,
            glow_size,
            scene,
            glow0,
            glow1,
            uniform_buffers: vec![h_uniforms, v_uniforms, scene_uniforms],
            glow_uniforms,
            blur_h_from_scene,
            blur_h_from_glow,
            blur_v,
            composite_scene,
            composite_glow,
        }
    }

    /// Update the glow composite multiplier (brightness)
    pub(crate) fn set_glow_mult(&self, queue: &wgpu::Queue, glow_mult: f32) {
        queue.write_buffer(
            &self.glow_uniforms,
            0,
            bytemuck::bytes_of(&BlitUniforms::blit(glow_mult)),
        );
    }

    /// Free the GPU memory now rather than when the handles drop
    pub(crate) fn release(self) {
        self.scene.texture.destroy();
        self.glow0.texture.destroy();
        self.glow1.texture.destroy();
        for buffer in &self.uniform_buffers {
            buffer.destroy();
        }
        self.glow_uniforms.destroy();
    }
}
