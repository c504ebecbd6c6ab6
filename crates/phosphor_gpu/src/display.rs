//! Vector display with its GPU backend
//!
//! [`VectorDisplay`] pairs the host-side [`DisplayState`] with the wgpu
//! resources needed to draw it. GPU resources follow an explicit lifecycle:
//! [`setup`](VectorDisplay::setup) once a device exists,
//! [`resize`](VectorDisplay::resize) to rebuild the resolution-dependent
//! targets, [`teardown`](VectorDisplay::teardown) to release everything.
//!
//! Each [`render`](VectorDisplay::render):
//! 1. uploads the current frame into the next history slot
//! 2. draws every non-empty slot, oldest first, into the scene texture
//! 3. blurs the scene through the two glow buffers
//! 4. composites scene and glow additively onto the caller's target

use std::sync::Arc;

use phosphor_core::config::{BLUR_PASSES, INITIAL_BUFFER_CAPACITY, MAX_DECAY_STEPS};
use phosphor_core::{
    diagnostic, DisplayError, DisplayState, FalloffTexture, LineSink, MeshBuffer, Result,
    SlotDraw, Transform, Vertex,
};

use crate::config::{Accumulation, DisplayConfig};
use crate::pipelines::{
    create_bind_group_layouts, create_sampler, create_shader_modules, BindGroupLayouts, Pipelines,
    ShaderModules,
};
use crate::targets::RenderTargets;
use crate::uniforms::{line_uniform_stride, ortho, pack_line_uniforms, LineUniforms};

const OPAQUE_BLACK: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// Record a validation failure and turn it into a display error
fn shader_error(error: wgpu::Error) -> DisplayError {
    let message = error.to_string();
    diagnostic!("shader compilation failed: {}", message);
    DisplayError::ShaderCompilation(message)
}

fn allocation_error(message: String) -> DisplayError {
    diagnostic!("GPU resource allocation failed: {}", message);
    DisplayError::ResourceAllocation(message)
}

fn check_texture_size(device: &wgpu::Device, (width, height): (u32, u32)) -> Result<()> {
    let max = device.limits().max_texture_dimension_2d;
    if width > max || height > max {
        return Err(allocation_error(format!(
            "{}x{} exceeds the maximum texture dimension {}",
            width, height, max
        )));
    }
    Ok(())
}

/// Run `build` inside out-of-memory and validation error scopes
fn with_allocation_scope<T>(device: &wgpu::Device, build: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match validation.or(out_of_memory) {
        Some(error) => Err(allocation_error(error.to_string())),
        None => Ok(value),
    }
}

/// Every GPU resource owned by one display
struct GpuResources {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    layouts: BindGroupLayouts,
    shaders: ShaderModules,
    pipelines: Pipelines,
    sampler: wgpu::Sampler,
    falloff: wgpu::Texture,
    line_uniforms: wgpu::Buffer,
    line_uniform_stride: u64,
    line_bind_group: wgpu::BindGroup,
    targets: RenderTargets,
    /// One vertex buffer per history slot, allocated on first use
    slots: Vec<Option<wgpu::Buffer>>,
}

impl GpuResources {
    fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        config: &DisplayConfig,
        state: &DisplayState,
    ) -> Result<Self> {
        check_texture_size(&device, state.pixel_size())?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let layouts = create_bind_group_layouts(&device);
        let shaders = create_shader_modules(&device);
        let pipelines = Pipelines::new(&device, &layouts, &shaders, config);
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(shader_error(error));
        }

        let stride = line_uniform_stride(device.limits().min_uniform_buffer_offset_alignment);

        let (sampler, falloff, line_uniforms, line_bind_group, targets) =
            with_allocation_scope(&device, || {
                let sampler = create_sampler(&device);
                let falloff = Self::create_falloff_texture(&device, &queue, config);
                let falloff_view = falloff.create_view(&wgpu::TextureViewDescriptor::default());

                let line_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Phosphor Line Uniforms Buffer"),
                    size: stride * MAX_DECAY_STEPS as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });

                let line_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Phosphor Line Bind Group"),
                    layout: &layouts.line,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                                buffer: &line_uniforms,
                                offset: 0,
                                size: wgpu::BufferSize::new(
                                    std::mem::size_of::<LineUniforms>() as u64
                                ),
                            }),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&falloff_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                });

                let targets = RenderTargets::new(
                    &device,
                    &layouts.blit,
                    &sampler,
                    state.pixel_size(),
                    state.glow_size(),
                    state.glow_mult(),
                );

                (sampler, falloff, line_uniforms, line_bind_group, targets)
            })?;

        Ok(Self {
            device,
            queue,
            layouts,
            shaders,
            pipelines,
            sampler,
            falloff,
            line_uniforms,
            line_uniform_stride: stride,
            line_bind_group,
            targets,
            slots: (0..state.ring().slot_count()).map(|_| None).collect(),
        })
    }

    fn create_falloff_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &DisplayConfig,
    ) -> wgpu::Texture {
        let falloff = FalloffTexture::generate();
        let format = config.falloff_format;
        let size = falloff.size() as u32;
        let extent = wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Phosphor Falloff Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: format.texture_format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &format.encode(&falloff),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(size * format.texel_size()),
                rows_per_image: Some(size),
            },
            extent,
        );

        texture
    }

    fn rebuild_targets(&mut self, state: &DisplayState) -> Result<()> {
        check_texture_size(&self.device, state.pixel_size())?;
        let targets = with_allocation_scope(&self.device, || {
            RenderTargets::new(
                &self.device,
                &self.layouts.blit,
                &self.sampler,
                state.pixel_size(),
                state.glow_size(),
                state.glow_mult(),
            )
        })?;
        std::mem::replace(&mut self.targets, targets).release();
        Ok(())
    }

    fn rebuild_scene_pipeline(&mut self, accumulation: Accumulation) -> Result<()> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.pipelines
            .rebuild_scene(&self.device, &self.shaders, accumulation);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(shader_error(error)),
            None => Ok(()),
        }
    }

    /// Drop every slot buffer and size the slot list for a new ring
    fn reset_slots(&mut self, slot_count: usize) {
        for buffer in self.slots.drain(..).flatten() {
            buffer.destroy();
        }
        self.slots.resize_with(slot_count, || None);
    }

    /// Copy the current frame into `slot`, growing its buffer by doubling
    fn upload_slot(&mut self, slot: usize, mesh: &MeshBuffer) {
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        let bytes = mesh.as_bytes();
        if bytes.is_empty() {
            return;
        }

        let needed = bytes.len() as u64;
        let current = self.slots[slot].as_ref().map_or(0, |buffer| buffer.size());
        if current < needed {
            let mut size = current
                .max((INITIAL_BUFFER_CAPACITY * std::mem::size_of::<Vertex>()) as u64);
            while size < needed {
                size *= 2;
            }
            tracing::trace!(slot, size, "growing slot vertex buffer");
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Phosphor Slot Vertex Buffer"),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            if let Some(old) = self.slots[slot].replace(buffer) {
                old.destroy();
            }
        }

        if let Some(buffer) = &self.slots[slot] {
            self.queue.write_buffer(buffer, 0, bytes);
        }
    }

    fn blit_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        clear: wgpu::Color,
        pipeline: &wgpu::RenderPipeline,
        bind_groups: &[&wgpu::BindGroup],
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        for bind_group in bind_groups {
            pass.set_bind_group(0, *bind_group, &[]);
            // Fullscreen triangle
            pass.draw(0..3, 0..1);
        }
    }

    fn draw_frame(&self, target: &wgpu::TextureView, draws: &[SlotDraw], state: &DisplayState) {
        let (width, height) = self.targets.size;
        let alphas: Vec<f32> = draws.iter().map(|draw| draw.opacity as f32).collect();
        if !alphas.is_empty() {
            let uniforms = pack_line_uniforms(
                ortho(width as f32, height as f32),
                &alphas,
                self.line_uniform_stride,
            );
            self.queue.write_buffer(&self.line_uniforms, 0, &uniforms);
        }

        let glow_mult = state.glow_mult();
        let glow = glow_mult > 0.0;
        if glow {
            self.targets.set_glow_mult(&self.queue, glow_mult);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Phosphor Render Encoder"),
            });

        // Decaying frames into the scene buffer
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Phosphor Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.scene.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(OPAQUE_BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipelines.scene);

            let vertex_size = std::mem::size_of::<Vertex>() as u64;
            for (i, draw) in draws.iter().enumerate() {
                let Some(Some(buffer)) = self.slots.get(draw.slot) else {
                    continue;
                };
                let offset = (i as u64 * self.line_uniform_stride) as u32;
                pass.set_bind_group(0, &self.line_bind_group, &[offset]);
                pass.set_vertex_buffer(0, buffer.slice(..draw.vertex_count as u64 * vertex_size));
                pass.draw(0..draw.vertex_count as u32, 0..1);
            }
        }

        if glow {
            for iteration in 0..BLUR_PASSES {
                let source = if iteration == 0 {
                    &self.targets.blur_h_from_scene
                } else {
                    &self.targets.blur_h_from_glow
                };
                self.blit_pass(
                    &mut encoder,
                    "Phosphor Horizontal Blur Pass",
                    &self.targets.glow0.view,
                    wgpu::Color::TRANSPARENT,
                    &self.pipelines.blur,
                    &[source],
                );
                self.blit_pass(
                    &mut encoder,
                    "Phosphor Vertical Blur Pass",
                    &self.targets.glow1.view,
                    wgpu::Color::TRANSPARENT,
                    &self.pipelines.blur,
                    &[&self.targets.blur_v],
                );
            }
        }

        let composite: &[&wgpu::BindGroup] = if glow {
            &[&self.targets.composite_scene, &self.targets.composite_glow]
        } else {
            &[&self.targets.composite_scene]
        };
        self.blit_pass(
            &mut encoder,
            "Phosphor Composite Pass",
            target,
            OPAQUE_BLACK,
            &self.pipelines.composite,
            composite,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn release(self) {
        self.targets.release();
        self.falloff.destroy();
        self.line_uniforms.destroy();
        for buffer in self.slots.into_iter().flatten() {
            buffer.destroy();
        }
    }
}

/// A persistent-phosphor vector display
///
/// Host-side drawing works without a GPU; [`render`](Self::render) needs
/// [`setup`](Self::setup) first.
pub struct VectorDisplay {
    state: DisplayState,
    config: DisplayConfig,
    gpu: Option<GpuResources>,
}

impl VectorDisplay {
    /// Create a display for a `width` x `height` framebuffer
    pub fn new(width: f64, height: f64) -> Result<Self> {
        Self::with_config(width, height, DisplayConfig::default())
    }

    /// Create a display with explicit backend choices
    pub fn with_config(width: f64, height: f64, config: DisplayConfig) -> Result<Self> {
        Ok(Self {
            state: DisplayState::new(width, height)?,
            config,
            gpu: None,
        })
    }

    /// Allocate shaders, pipelines, textures and buffers on `device`
    ///
    /// Calling it again releases the previous resources and rebuilds them.
    pub fn setup(&mut self, device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Result<()> {
        if self.gpu.is_some() {
            tracing::debug!("vector display already set up, rebuilding");
            self.teardown();
        }
        let resources = GpuResources::new(device, queue, &self.config, &self.state)?;
        tracing::debug!(
            size = ?resources.targets.size,
            glow_size = ?resources.targets.glow_size,
            "vector display set up"
        );
        self.gpu = Some(resources);
        Ok(())
    }

    /// Release every GPU resource; safe to call repeatedly
    pub fn teardown(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.release();
            tracing::debug!("vector display torn down");
        }
    }

    /// Tear down and free the display
    pub fn destroy(mut self) {
        self.teardown();
    }

    pub fn is_set_up(&self) -> bool {
        self.gpu.is_some()
    }

    /// Change the framebuffer size
    ///
    /// Frame history is dropped and, when set up, only the scene and glow
    /// targets are rebuilt.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        self.state.resize(width, height)?;
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.rebuild_targets(&self.state)?;
        }
        Ok(())
    }

    /// Run the full multi-pass render into `target`
    ///
    /// `target` must have the configured `texture_format`.
    pub fn render(&mut self, target: &wgpu::TextureView) -> Result<()> {
        let gpu = self.gpu.as_mut().ok_or(DisplayError::NotSetUp)?;
        let commit = self.state.commit_frame();
        gpu.upload_slot(commit.slot, self.state.mesh());
        gpu.draw_frame(target, &commit.draws, &self.state);
        Ok(())
    }

    /// Discard the current frame's geometry
    pub fn clear(&mut self) {
        self.state.clear();
    }

    pub fn set_color(&mut self, r: f64, g: f64, b: f64) {
        self.state.set_color(r, g, b);
    }

    pub fn set_thickness(&mut self, thickness: f64) -> Result<()> {
        self.state.set_thickness(thickness)
    }

    pub fn set_default_thickness(&mut self) {
        self.state.set_default_thickness();
    }

    pub fn set_decay(&mut self, decay: f64) -> Result<()> {
        self.state.set_decay(decay)
    }

    pub fn set_initial_decay(&mut self, initial_decay: f64) -> Result<()> {
        self.state.set_initial_decay(initial_decay)
    }

    /// Change the history length, dropping prior frames
    pub fn set_decay_steps(&mut self, steps: usize) -> Result<()> {
        self.state.set_decay_steps(steps)?;
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.reset_slots(self.state.ring().slot_count());
        }
        Ok(())
    }

    pub fn set_brightness(&mut self, brightness: f64) -> Result<()> {
        self.state.set_brightness(brightness)
    }

    pub fn set_transform(&mut self, offset_x: f64, offset_y: f64, scale: f64) -> Result<()> {
        self.state.set_transform(offset_x, offset_y, scale)
    }

    /// Switch the accumulation policy, rebuilding only the scene pipeline
    pub fn set_accumulation(&mut self, accumulation: Accumulation) -> Result<()> {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.rebuild_scene_pipeline(accumulation)?;
        }
        self.config.accumulation = accumulation;
        Ok(())
    }

    pub fn size(&self) -> (f64, f64) {
        self.state.size()
    }

    pub fn glow_size(&self) -> (u32, u32) {
        self.state.glow_size()
    }

    pub fn decay_steps(&self) -> usize {
        self.state.decay_steps()
    }

    pub fn thickness(&self) -> f64 {
        self.state.thickness()
    }

    pub fn decay(&self) -> f64 {
        self.state.decay()
    }

    pub fn initial_decay(&self) -> f64 {
        self.state.initial_decay()
    }

    pub fn brightness(&self) -> f64 {
        self.state.brightness()
    }

    pub fn color(&self) -> [f64; 3] {
        self.state.color()
    }

    pub fn transform(&self) -> Transform {
        self.state.transform()
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Host-side state (parameters, current mesh, frame history)
    pub fn state(&self) -> &DisplayState {
        &self.state
    }
}

impl LineSink for VectorDisplay {
    fn begin_draw(&mut self, x: f64, y: f64) {
        self.state.begin_draw(x, y);
    }

    fn draw_to(&mut self, x: f64, y: f64) {
        self.state.draw_to(x, y);
    }

    fn end_draw(&mut self) {
        self.state.end_draw();
    }
}

impl std::fmt::Debug for VectorDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorDisplay")
            .field("size", &self.state.size())
            .field("decay_steps", &self.state.decay_steps())
            .field("config", &self.config)
            .field("set_up", &self.gpu.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_requires_setup() {
        let display = VectorDisplay::new(640.0, 480.0).unwrap();
        assert!(!display.is_set_up());
        assert_eq!(display.glow_size(), (213, 160));
    }

    #[test]
    fn test_teardown_without_setup_is_noop() {
        let mut display = VectorDisplay::new(640.0, 480.0).unwrap();
        display.teardown();
        display.teardown();
        assert!(!display.is_set_up());
        display.destroy();
    }

    #[test]
    fn test_host_side_drawing_without_gpu() {
        let mut display = VectorDisplay::new(640.0, 480.0).unwrap();
        display.draw(10.0, 10.0, 100.0, 10.0);
        assert_eq!(display.state().mesh().len(), 18);

        display.resize(320.0, 240.0).unwrap();
        assert!(display.state().mesh().is_empty());
        assert_eq!(display.size(), (320.0, 240.0));
    }

    #[test]
    fn test_setters_validate() {
        let mut display = VectorDisplay::new(640.0, 480.0).unwrap();
        assert!(display.set_thickness(-1.0).is_err());
        assert!(display.set_decay(1.0).is_err());
        assert!(display.set_decay_steps(MAX_DECAY_STEPS + 1).is_err());
        display.set_decay_steps(0).unwrap();
        assert_eq!(display.decay_steps(), 0);
    }

    #[test]
    fn test_accumulation_without_gpu() {
        let mut display = VectorDisplay::new(640.0, 480.0).unwrap();
        display.set_accumulation(Accumulation::Additive).unwrap();
        assert_eq!(display.config().accumulation, Accumulation::Additive);
    }
}
