//! Host-side display state
//!
//! Everything a vector display owns apart from GPU resources: drawing
//! parameters, the logical-to-framebuffer transform, the pending polyline,
//! the current frame's mesh and the frame history ring.
//!
//! Setters validate before mutating, so a rejected value leaves the state
//! exactly as it was.

use crate::config::{
    DEFAULT_BRIGHTNESS, DEFAULT_DECAY, DEFAULT_DECAY_STEPS, DEFAULT_INITIAL_DECAY, DEFAULT_OFFSET,
    DEFAULT_SCALE, GLOW_DIVISOR, GLOW_MULT, MAX_DECAY_STEPS, THICKNESS_DIVISOR,
};
use crate::draw::LineSink;
use crate::error::{DisplayError, Result};
use crate::frame_ring::{FrameRing, SlotDraw};
use crate::mesh::MeshBuffer;
use crate::tessellate::{Pen, TessellationSummary, Tessellator};

/// Logical-to-framebuffer mapping: `fb = logical * scale + offset`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Transform {
    pub fn apply(&self, x: f64, y: f64) -> [f64; 2] {
        [x * self.scale + self.offset_x, y * self.scale + self.offset_y]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset_x: DEFAULT_OFFSET,
            offset_y: DEFAULT_OFFSET,
            scale: DEFAULT_SCALE,
        }
    }
}

/// Result of committing the current frame to the history ring
#[derive(Clone, Debug, PartialEq)]
pub struct FrameCommit {
    /// Slot the current mesh must be uploaded to
    pub slot: usize,
    /// Slots to draw, oldest first
    pub draws: Vec<SlotDraw>,
}

/// Thickness guessed from the display size (8.0 at 2048 wide)
pub fn default_thickness_for(width: f64, height: f64) -> f64 {
    (width.max(height) / THICKNESS_DIVISOR).max(1.0)
}

fn validate_size(width: f64, height: f64) -> Result<()> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(DisplayError::InvalidSize { width, height })
    }
}

fn unit_interval(value: f64) -> bool {
    (0.0..1.0).contains(&value)
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    width: f64,
    height: f64,
    color: [f64; 3],
    thickness: f64,
    decay: f64,
    initial_decay: f64,
    brightness: f64,
    transform: Transform,
    tessellator: Tessellator,
    mesh: MeshBuffer,
    ring: FrameRing,
}

impl DisplayState {
    /// Create state for a `width` x `height` framebuffer
    pub fn new(width: f64, height: f64) -> Result<Self> {
        validate_size(width, height)?;
        Ok(Self {
            width,
            height,
            color: [1.0, 1.0, 1.0],
            thickness: default_thickness_for(width, height),
            decay: DEFAULT_DECAY,
            initial_decay: DEFAULT_INITIAL_DECAY,
            brightness: DEFAULT_BRIGHTNESS,
            transform: Transform::default(),
            tessellator: Tessellator::new(),
            mesh: MeshBuffer::new(),
            ring: FrameRing::new(DEFAULT_DECAY_STEPS)?,
        })
    }

    /// Change the framebuffer size, dropping frame history and the current frame
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        validate_size(width, height)?;
        tracing::debug!(width, height, "resizing vector display");
        self.width = width;
        self.height = height;
        self.ring.reset();
        self.mesh.clear();
        Ok(())
    }

    /// Discard the current frame's geometry (history is kept)
    pub fn clear(&mut self) {
        self.mesh.clear();
    }

    pub fn set_color(&mut self, r: f64, g: f64, b: f64) {
        self.color = [r, g, b];
    }

    pub fn set_thickness(&mut self, thickness: f64) -> Result<()> {
        if !(thickness.is_finite() && thickness > 0.0) {
            return Err(DisplayError::InvalidThickness(thickness));
        }
        self.thickness = thickness;
        Ok(())
    }

    /// Restore the size-derived thickness
    pub fn set_default_thickness(&mut self) {
        self.thickness = default_thickness_for(self.width, self.height);
    }

    pub fn set_decay(&mut self, decay: f64) -> Result<()> {
        if !unit_interval(decay) {
            return Err(DisplayError::InvalidDecay(decay));
        }
        self.decay = decay;
        Ok(())
    }

    pub fn set_initial_decay(&mut self, initial_decay: f64) -> Result<()> {
        if !unit_interval(initial_decay) {
            return Err(DisplayError::InvalidInitialDecay(initial_decay));
        }
        self.initial_decay = initial_decay;
        Ok(())
    }

    /// Replace the history ring; prior frames are lost
    pub fn set_decay_steps(&mut self, steps: usize) -> Result<()> {
        if steps > MAX_DECAY_STEPS {
            return Err(DisplayError::InvalidSteps(steps));
        }
        self.ring = FrameRing::new(steps)?;
        tracing::debug!(steps, "decay history reset");
        Ok(())
    }

    /// Glow intensity; `0.0` turns the glow off
    pub fn set_brightness(&mut self, brightness: f64) -> Result<()> {
        if !(brightness.is_finite() && brightness >= 0.0) {
            return Err(DisplayError::InvalidBrightness(brightness));
        }
        self.brightness = brightness;
        Ok(())
    }

    /// Map later draws through `fb = logical * scale + offset`
    pub fn set_transform(&mut self, offset_x: f64, offset_y: f64, scale: f64) -> Result<()> {
        if !(scale.is_finite() && scale != 0.0) {
            return Err(DisplayError::InvalidScale(scale));
        }
        self.transform = Transform {
            offset_x,
            offset_y,
            scale,
        };
        Ok(())
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Framebuffer size in whole pixels (at least 1x1)
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |v: f64| (v.round() as u32).max(1);
        (px(self.width), px(self.height))
    }

    /// Size of the glow buffers: a third of the framebuffer, at least 1x1
    pub fn glow_size(&self) -> (u32, u32) {
        let (w, h) = self.pixel_size();
        ((w / GLOW_DIVISOR).max(1), (h / GLOW_DIVISOR).max(1))
    }

    pub fn color(&self) -> [f64; 3] {
        self.color
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn initial_decay(&self) -> f64 {
        self.initial_decay
    }

    pub fn decay_steps(&self) -> usize {
        self.ring.steps()
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Composite multiplier for the blurred glow
    pub fn glow_mult(&self) -> f32 {
        GLOW_MULT * self.brightness as f32
    }

    /// Geometry drawn since the last `clear`
    pub fn mesh(&self) -> &MeshBuffer {
        &self.mesh
    }

    pub fn ring(&self) -> &FrameRing {
        &self.ring
    }

    /// True while a polyline is open
    pub fn is_drawing(&self) -> bool {
        self.tessellator.is_open()
    }

    /// Stroke used for the next polyline
    pub fn pen(&self) -> Pen {
        let [r, g, b] = self.color;
        Pen {
            thickness: self.thickness,
            color: [r as f32, g as f32, b as f32, 1.0],
        }
    }

    /// Close the open polyline, reporting what was emitted
    pub fn finish_polyline(&mut self) -> TessellationSummary {
        let pen = self.pen();
        self.tessellator.end(&pen, &mut self.mesh)
    }

    /// Advance the ring with the current mesh and list the slots to draw
    pub fn commit_frame(&mut self) -> FrameCommit {
        let slot = self.ring.advance(self.mesh.len());
        let draws = self.ring.draw_order(self.decay, self.initial_decay);
        tracing::trace!(slot, draws = draws.len(), vertices = self.mesh.len(), "committed frame");
        FrameCommit { slot, draws }
    }
}

impl LineSink for DisplayState {
    fn begin_draw(&mut self, x: f64, y: f64) {
        let [x, y] = self.transform.apply(x, y);
        self.tessellator.begin(x, y);
    }

    fn draw_to(&mut self, x: f64, y: f64) {
        let [x, y] = self.transform.apply(x, y);
        self.tessellator.line_to(x, y);
    }

    fn end_draw(&mut self) {
        self.finish_polyline();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_THICKNESS;

    fn state() -> DisplayState {
        DisplayState::new(2048.0, 1536.0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let s = state();
        assert_eq!(s.size(), (2048.0, 1536.0));
        assert_eq!(s.thickness(), DEFAULT_THICKNESS);
        assert_eq!(s.decay(), DEFAULT_DECAY);
        assert_eq!(s.initial_decay(), DEFAULT_INITIAL_DECAY);
        assert_eq!(s.decay_steps(), DEFAULT_DECAY_STEPS);
        assert_eq!(s.brightness(), DEFAULT_BRIGHTNESS);
        assert_eq!(s.transform(), Transform::default());
        assert_eq!(s.glow_size(), (682, 512));
    }

    #[test]
    fn test_invalid_size() {
        assert!(matches!(
            DisplayState::new(0.0, 10.0),
            Err(DisplayError::InvalidSize { .. })
        ));
        assert!(DisplayState::new(10.0, f64::NAN).is_err());

        let mut s = state();
        assert!(s.resize(-1.0, 10.0).is_err());
        assert_eq!(s.size(), (2048.0, 1536.0));
    }

    #[test]
    fn test_thickness_validation() {
        let mut s = state();
        s.set_thickness(3.0).unwrap();
        assert_eq!(s.set_thickness(-1.0), Err(DisplayError::InvalidThickness(-1.0)));
        assert_eq!(s.set_thickness(0.0), Err(DisplayError::InvalidThickness(0.0)));
        assert_eq!(s.thickness(), 3.0);

        s.set_default_thickness();
        assert_eq!(s.thickness(), 8.0);
    }

    #[test]
    fn test_small_display_thickness_floor() {
        let s = DisplayState::new(100.0, 80.0).unwrap();
        assert_eq!(s.thickness(), 1.0);
        assert_eq!(s.glow_size(), (33, 26));

        let tiny = DisplayState::new(2.0, 2.0).unwrap();
        assert_eq!(tiny.glow_size(), (1, 1));
    }

    #[test]
    fn test_decay_validation() {
        let mut s = state();
        assert_eq!(s.set_decay(1.0), Err(DisplayError::InvalidDecay(1.0)));
        assert!(s.set_decay(-0.1).is_err());
        assert!(s.set_decay(f64::NAN).is_err());
        s.set_decay(0.0).unwrap();
        assert_eq!(s.decay(), 0.0);

        assert_eq!(
            s.set_initial_decay(1.5),
            Err(DisplayError::InvalidInitialDecay(1.5))
        );
        s.set_initial_decay(0.5).unwrap();
        assert_eq!(s.initial_decay(), 0.5);
    }

    #[test]
    fn test_brightness_and_transform_validation() {
        let mut s = state();
        assert_eq!(s.set_brightness(-0.1), Err(DisplayError::InvalidBrightness(-0.1)));
        s.set_brightness(0.0).unwrap();
        assert_eq!(s.glow_mult(), 0.0);
        s.set_brightness(2.0).unwrap();
        assert!((s.glow_mult() - 3.0).abs() < 1e-6);

        assert_eq!(s.set_transform(1.0, 2.0, 0.0), Err(DisplayError::InvalidScale(0.0)));
        assert_eq!(s.transform(), Transform::default());
    }

    #[test]
    fn test_transform_applies_at_push() {
        let mut s = state();
        s.set_transform(100.0, 50.0, 2.0).unwrap();
        s.begin_draw(10.0, 10.0);
        s.draw_to(20.0, 10.0);
        assert_eq!(s.tessellator.pending(), &[[120.0, 70.0], [140.0, 70.0]]);

        // Later transforms do not move pending points
        s.set_transform(0.0, 0.0, 1.0).unwrap();
        assert_eq!(s.tessellator.pending()[0], [120.0, 70.0]);
        s.end_draw();
        assert!(!s.is_drawing());
    }

    #[test]
    fn test_steps_reset_history() {
        let mut s = state();
        s.draw(0.0, 0.0, 100.0, 0.0);
        s.commit_frame();
        s.commit_frame();
        assert!(!s.ring().is_empty());

        s.set_decay_steps(3).unwrap();
        assert_eq!(s.decay_steps(), 3);
        assert!(s.ring().is_empty());

        assert_eq!(
            s.set_decay_steps(MAX_DECAY_STEPS + 1),
            Err(DisplayError::InvalidSteps(MAX_DECAY_STEPS + 1))
        );
        assert_eq!(s.decay_steps(), 3);
    }

    #[test]
    fn test_resize_drops_frames() {
        let mut s = state();
        s.draw(0.0, 0.0, 100.0, 0.0);
        s.commit_frame();
        s.resize(640.0, 480.0).unwrap();
        assert!(s.ring().is_empty());
        assert!(s.mesh().is_empty());
        assert_eq!(s.size(), (640.0, 480.0));
        assert_eq!(s.thickness(), 8.0);
    }

    #[test]
    fn test_clear_keeps_history() {
        let mut s = state();
        s.draw(0.0, 0.0, 100.0, 0.0);
        s.commit_frame();
        s.clear();
        assert!(s.mesh().is_empty());
        assert!(!s.ring().is_empty());
    }

    #[test]
    fn test_decay_scenario() {
        let mut s = state();
        s.set_thickness(8.0).unwrap();
        s.set_decay(0.8).unwrap();
        s.set_initial_decay(0.04).unwrap();
        s.set_decay_steps(5).unwrap();

        s.draw(0.0, 0.0, 100.0, 0.0);
        let first = s.commit_frame();
        assert_eq!(first.draws.len(), 1);
        assert_eq!(first.draws[0].opacity, 1.0);
        let slot = first.draws[0].slot;
        s.clear();

        let mut observed = vec![first.draws[0].opacity];
        for _ in 0..4 {
            let commit = s.commit_frame();
            assert_eq!(commit.draws.len(), 1);
            assert_eq!(commit.draws[0].slot, slot);
            observed.push(commit.draws[0].opacity);
        }

        let expected = [1.0, 0.04, 0.032, 0.0256, 0.02048];
        for (got, want) in observed.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{} != {}", got, want);
        }
    }

    #[test]
    fn test_pen_uses_color() {
        let mut s = state();
        s.set_color(0.5, 0.25, 1.0);
        assert_eq!(s.pen().color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(s.color(), [0.5, 0.25, 1.0]);
    }
}
