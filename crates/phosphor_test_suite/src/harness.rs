//! Test harness for visual tests
//!
//! Provides infrastructure for running visual tests, including:
//! - Headless GPU context initialization
//! - Multi-frame rendering into an offscreen texture with readback
//! - Reference image comparison

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use phosphor_gpu::{DisplayConfig, VectorDisplay};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of a visual test
#[derive(Debug)]
pub enum TestResult {
    /// Test passed
    Passed,
    /// Test passed but reference image was created/updated
    PassedWithNewReference,
    /// Test failed with difference percentage
    Failed { difference: f32, diff_path: PathBuf },
    /// Test skipped (e.g., no GPU available)
    Skipped { reason: String },
}

impl TestResult {
    pub fn is_passed(&self) -> bool {
        matches!(
            self,
            TestResult::Passed | TestResult::PassedWithNewReference
        )
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TestResult::Skipped { .. })
    }
}

/// Context for a single test
///
/// The test function runs once per frame. The display is cleared before
/// every call, so anything not redrawn decays away.
pub struct TestContext {
    /// Display being drawn
    pub display: VectorDisplay,
    /// Frame about to be rendered (0-based)
    pub frame: usize,
    /// Frames rendered before the final readback
    pub frames: usize,
}

impl TestContext {
    /// Get the display to draw on
    pub fn display(&mut self) -> &mut VectorDisplay {
        &mut self.display
    }

    /// True while drawing the first frame
    pub fn is_first_frame(&self) -> bool {
        self.frame == 0
    }

    /// True while drawing the frame that gets read back
    pub fn is_last_frame(&self) -> bool {
        self.frame + 1 == self.frames
    }
}

/// Test harness for running visual tests
pub struct TestHarness {
    /// wgpu device
    device: Arc<wgpu::Device>,
    /// wgpu queue
    queue: Arc<wgpu::Queue>,
    /// Output directory for test results
    output_dir: PathBuf,
    /// Reference image directory
    reference_dir: PathBuf,
    /// Default viewport size
    default_size: (u32, u32),
    /// Difference threshold for visual comparison (0.0-1.0)
    threshold: f32,
}

impl TestHarness {
    /// Create a new test harness with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(TestHarnessConfig::default())
    }

    /// Create a new test harness with custom configuration
    pub fn with_config(config: TestHarnessConfig) -> Result<Self> {
        let (device, queue) = pollster::block_on(request_device())?;

        std::fs::create_dir_all(&config.output_dir).context("Failed to create output directory")?;
        std::fs::create_dir_all(&config.reference_dir)
            .context("Failed to create reference directory")?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            output_dir: config.output_dir,
            reference_dir: config.reference_dir,
            default_size: config.default_size,
            threshold: config.threshold,
        })
    }

    /// Create a display set up on the harness device, rendering to RGBA8
    pub fn create_display(&self, width: u32, height: u32) -> Result<VectorDisplay> {
        let config = DisplayConfig {
            texture_format: wgpu::TextureFormat::Rgba8Unorm,
            ..Default::default()
        };
        let mut display = VectorDisplay::with_config(width as f64, height as f64, config)
            .context("Failed to create vector display")?;
        display
            .setup(self.device.clone(), self.queue.clone())
            .context("Failed to set up vector display")?;
        Ok(display)
    }

    /// Create an offscreen texture for rendering and readback
    fn create_render_texture(&self, width: u32, height: u32) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Render Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    /// Create a buffer for reading back texture data
    fn create_readback_buffer(&self, width: u32, height: u32) -> wgpu::Buffer {
        let bytes_per_row = padded_bytes_per_row(width);
        let buffer_size = (bytes_per_row * height) as u64;

        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Test Readback Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        })
    }

    /// Render one frame of `display` and read it back
    ///
    /// `display` must have been created by [`create_display`](Self::create_display)
    /// (or otherwise target `Rgba8Unorm`) and be set up on this harness's device.
    pub fn render_to_image(&self, display: &mut VectorDisplay) -> Result<RgbaImage> {
        let (width, height) = display.state().pixel_size();
        let texture = self.create_render_texture(width, height);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        display.render(&view).context("Failed to render display")?;

        let buffer = self.create_readback_buffer(width, height);
        let bytes_per_row = padded_bytes_per_row(width);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Texture Copy Encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // Receiver outlives the poll below
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .context("Failed to receive buffer map result")?
            .context("Failed to map buffer")?;

        let data = buffer_slice.get_mapped_range();

        // Strip row padding
        let mut img: RgbaImage = ImageBuffer::new(width, height);
        for y in 0..height {
            let row_start = (y * bytes_per_row) as usize;
            let row_data = &data[row_start..row_start + (width * 4) as usize];
            for x in 0..width {
                let i = (x * 4) as usize;
                img.put_pixel(
                    x,
                    y,
                    Rgba([
                        row_data[i],
                        row_data[i + 1],
                        row_data[i + 2],
                        row_data[i + 3],
                    ]),
                );
            }
        }

        drop(data);
        buffer.unmap();
        texture.destroy();

        Ok(img)
    }

    /// Render `frames` frames of `display` and save the last one as PNG
    pub fn render_to_png<F>(
        &self,
        display: &mut VectorDisplay,
        frames: usize,
        mut draw: F,
        path: &Path,
    ) -> Result<RgbaImage>
    where
        F: FnMut(&mut VectorDisplay, usize) -> Result<()>,
    {
        let frames = frames.max(1);
        let mut last = None;
        for frame in 0..frames {
            display.clear();
            draw(display, frame)?;
            if frame + 1 == frames {
                last = Some(self.render_to_image(display)?);
            } else {
                self.render_frame(display)?;
            }
        }
        let img = last.context("No frame rendered")?;
        img.save(path).context("Failed to save PNG")?;
        Ok(img)
    }

    /// Render a frame without reading it back
    fn render_frame(&self, display: &mut VectorDisplay) -> Result<()> {
        let (width, height) = display.state().pixel_size();
        let texture = self.create_render_texture(width, height);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        display.render(&view).context("Failed to render display")?;
        texture.destroy();
        Ok(())
    }

    /// Compare two images and return the difference ratio (0.0 = identical, 1.0 = completely different)
    pub fn compare_images(img1: &RgbaImage, img2: &RgbaImage) -> f32 {
        if img1.dimensions() != img2.dimensions() {
            return 1.0;
        }

        let (width, height) = img1.dimensions();
        let total_pixels = (width * height) as f64;
        let mut diff_sum = 0.0;

        for (p1, p2) in img1.pixels().zip(img2.pixels()) {
            let channels: f64 = (0..4)
                .map(|c| (p1[c] as f64 - p2[c] as f64).abs() / 255.0)
                .sum();
            diff_sum += channels / 4.0;
        }

        (diff_sum / total_pixels) as f32
    }

    /// Generate a diff image highlighting differences between two images
    pub fn generate_diff_image(img1: &RgbaImage, img2: &RgbaImage) -> Option<RgbaImage> {
        if img1.dimensions() != img2.dimensions() {
            return None;
        }

        let (width, height) = img1.dimensions();
        let mut diff = ImageBuffer::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let p1 = img1.get_pixel(x, y);
                let p2 = img2.get_pixel(x, y);

                let max_diff = (0..3)
                    .map(|c| (p1[c] as i32 - p2[c] as i32).abs())
                    .max()
                    .unwrap_or(0);

                if max_diff > 2 {
                    diff.put_pixel(x, y, Rgba([255, 0, 0, 255]));
                } else {
                    diff.put_pixel(x, y, Rgba([p1[0] / 3, p1[1] / 3, p1[2] / 3, 128]));
                }
            }
        }

        Some(diff)
    }

    /// Run a test at the default size and save output as PNG
    pub fn run_test<F>(&self, name: &str, frames: usize, test_fn: F) -> Result<TestResult>
    where
        F: FnMut(&mut TestContext),
    {
        let (width, height) = self.default_size;
        self.run_test_with_size(name, width, height, frames, test_fn)
    }

    /// Run a test with custom size and save output as PNG
    pub fn run_test_with_size<F>(
        &self,
        name: &str,
        width: u32,
        height: u32,
        frames: usize,
        mut test_fn: F,
    ) -> Result<TestResult>
    where
        F: FnMut(&mut TestContext),
    {
        let frames = frames.max(1);
        let mut ctx = TestContext {
            display: self.create_display(width, height)?,
            frame: 0,
            frames,
        };

        let output_path = self.output_path(name);
        let reference_path = self.reference_path(name);

        let mut output_img = None;
        for frame in 0..frames {
            ctx.frame = frame;
            ctx.display.clear();
            test_fn(&mut ctx);
            if ctx.is_last_frame() {
                output_img = Some(self.render_to_image(&mut ctx.display)?);
            } else {
                self.render_frame(&mut ctx.display)?;
            }
        }
        ctx.display.destroy();

        let output_img = output_img.context("No frame rendered")?;
        output_img.save(&output_path).context("Failed to save PNG")?;
        tracing::info!("Rendered test '{}' ({} frames) to {:?}", name, frames, output_path);

        if reference_path.exists() {
            let reference_img = image::open(&reference_path)
                .context("Failed to open reference image")?
                .to_rgba8();

            let difference = Self::compare_images(&output_img, &reference_img);

            if difference <= self.threshold {
                tracing::info!("Test '{}' PASSED (diff: {:.4}%)", name, difference * 100.0);
                Ok(TestResult::Passed)
            } else {
                let diff_path = self.diff_path(name);
                if let Some(diff_img) = Self::generate_diff_image(&output_img, &reference_img) {
                    diff_img.save(&diff_path).ok();
                }
                tracing::warn!(
                    "Test '{}' FAILED (diff: {:.4}%, threshold: {:.4}%)",
                    name,
                    difference * 100.0,
                    self.threshold * 100.0
                );
                Ok(TestResult::Failed {
                    difference,
                    diff_path,
                })
            }
        } else {
            std::fs::copy(&output_path, &reference_path)
                .context("Failed to create reference image")?;
            tracing::info!(
                "Test '{}' created new reference at {:?}",
                name,
                reference_path
            );
            Ok(TestResult::PassedWithNewReference)
        }
    }

    /// Get the reference image path for a test
    pub fn reference_path(&self, name: &str) -> PathBuf {
        self.reference_dir.join(format!("{}.png", file_stem(name)))
    }

    /// Get the output image path for a test
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.png", file_stem(name)))
    }

    /// Get the diff image path for a test
    pub fn diff_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}_diff.png", file_stem(name)))
    }
}

/// Request a device without a surface
async fn request_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("No GPU adapter available")?;

    tracing::debug!(adapter = ?adapter.get_info().name, "using adapter");

    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Phosphor Test Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
            },
            None,
        )
        .await
        .context("Failed to create GPU device")
}

/// Calculate padded bytes per row (must be multiple of 256 for wgpu)
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// `suite::case` names become `suite_case` file names
fn file_stem(name: &str) -> String {
    name.replace("::", "_")
}

/// Configuration for test harness
#[derive(Debug, Clone)]
pub struct TestHarnessConfig {
    /// Output directory for test results
    pub output_dir: PathBuf,
    /// Reference image directory
    pub reference_dir: PathBuf,
    /// Default viewport size
    pub default_size: (u32, u32),
    /// Difference threshold for visual comparison (0.0-1.0)
    pub threshold: f32,
}

impl Default for TestHarnessConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test_output"),
            reference_dir: PathBuf::from("test_output/references"),
            default_size: (1024, 768),
            threshold: 0.001,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_bytes_per_row() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1024), 4096);
    }

    #[test]
    fn test_compare_identical_and_resized() {
        let a: RgbaImage = ImageBuffer::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        assert_eq!(TestHarness::compare_images(&a, &a), 0.0);

        let b: RgbaImage = ImageBuffer::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        assert_eq!(TestHarness::compare_images(&a, &b), 1.0);
        assert!(TestHarness::generate_diff_image(&a, &b).is_none());
    }

    #[test]
    fn test_compare_black_and_white() {
        let black: RgbaImage = ImageBuffer::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let white: RgbaImage = ImageBuffer::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        assert!((TestHarness::compare_images(&black, &white) - 0.75).abs() < 1e-6);

        let diff = TestHarness::generate_diff_image(&black, &white).unwrap();
        assert_eq!(*diff.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("lines::dots"), "lines_dots");
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn test_render_single_line() {
        let harness = TestHarness::new().unwrap();
        let mut display = harness.create_display(256, 128).unwrap();
        display.set_color(1.0, 0.0, 0.0);
        phosphor_shapes::draw_line(&mut display, 32.0, 64.0, 224.0, 64.0);

        let img = harness.render_to_image(&mut display).unwrap();
        assert_eq!(img.dimensions(), (256, 128));
        assert!(img.get_pixel(128, 64)[0] > 128);
        assert!(img.get_pixel(128, 64)[2] < 64);
        display.destroy();
    }
}
