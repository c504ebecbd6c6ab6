//! Line falloff texture
//!
//! A square radial intensity mask sampled by every line vertex. The texture
//! centre is fully bright and brightness drops as `16^(-2d)` with the
//! normalized distance `d` from the centre, clamped at the rim.

use crate::config::TEXTURE_SIZE;
use crate::half_float::f32_to_f16_bits;

/// Intensity of every texel at or beyond the rim (`16^-2`)
pub const FALLOFF_FLOOR: f32 = 1.0 / 256.0;

/// CPU-side falloff mask, one alpha value per texel (row-major)
#[derive(Clone, Debug, PartialEq)]
pub struct FalloffTexture {
    size: usize,
    alpha: Vec<f32>,
}

impl FalloffTexture {
    /// Generate the mask at the standard [`TEXTURE_SIZE`]
    pub fn generate() -> Self {
        Self::with_size(TEXTURE_SIZE)
    }

    /// Generate the mask at an arbitrary side length (at least 2 texels)
    pub fn with_size(size: usize) -> Self {
        let size = size.max(2);
        let half = (size / 2) as f64;
        let mut alpha = Vec::with_capacity(size * size);

        for y in 0..size {
            for x in 0..size {
                let dx = x as f64 - half;
                let dy = y as f64 - half;
                let distance = ((dx * dx + dy * dy).sqrt() / half).min(1.0);
                let value = 16f64.powf(-2.0 * distance).clamp(0.0, 1.0);
                alpha.push(value as f32);
            }
        }

        Self { size, alpha }
    }

    /// Side length in texels
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alpha of the texel at (x, y)
    pub fn alpha_at(&self, x: usize, y: usize) -> f32 {
        self.alpha[x + y * self.size]
    }

    /// Alpha of the centre texel
    pub fn center_alpha(&self) -> f32 {
        self.alpha_at(self.size / 2, self.size / 2)
    }

    /// Row-major alpha values
    pub fn alpha(&self) -> &[f32] {
        &self.alpha
    }

    /// RGBA half-float texels (white, alpha = falloff)
    pub fn to_rgba_f16(&self) -> Vec<u16> {
        let one = f32_to_f16_bits(1.0);
        let mut texels = Vec::with_capacity(self.alpha.len() * 4);
        for &a in &self.alpha {
            texels.extend_from_slice(&[one, one, one, f32_to_f16_bits(a)]);
        }
        texels
    }

    /// RGBA 8-bit texels (white, alpha = falloff)
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut texels = Vec::with_capacity(self.alpha.len() * 4);
        for &a in &self.alpha {
            let a = (a * 255.0).round().clamp(0.0, 255.0) as u8;
            texels.extend_from_slice(&[255, 255, 255, a]);
        }
        texels
    }
}

impl Default for FalloffTexture {
    fn default() -> Self {
        Self::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HALF_TEXTURE_SIZE;

    #[test]
    fn test_center_is_fully_bright() {
        let tex = FalloffTexture::generate();
        assert_eq!(tex.size(), TEXTURE_SIZE);
        assert!((tex.center_alpha() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_monotonic_along_radius() {
        let tex = FalloffTexture::generate();
        let row = HALF_TEXTURE_SIZE;
        let mut previous = tex.alpha_at(HALF_TEXTURE_SIZE, row);
        for x in HALF_TEXTURE_SIZE + 1..TEXTURE_SIZE {
            let value = tex.alpha_at(x, row);
            assert!(value <= previous, "alpha rose at x={}", x);
            previous = value;
        }
    }

    #[test]
    fn test_rim_shares_floor_value() {
        let tex = FalloffTexture::generate();
        // Corners lie beyond the radius
        for (x, y) in [(0, 0), (TEXTURE_SIZE - 1, 0), (0, TEXTURE_SIZE - 1)] {
            assert!((tex.alpha_at(x, y) - FALLOFF_FLOOR).abs() < 1e-6);
        }
        // Exactly on the radius
        assert!((tex.alpha_at(0, HALF_TEXTURE_SIZE) - FALLOFF_FLOOR).abs() < 1e-6);
    }

    #[test]
    fn test_rgba_f16_layout() {
        let tex = FalloffTexture::generate();
        let texels = tex.to_rgba_f16();
        assert_eq!(texels.len(), TEXTURE_SIZE * TEXTURE_SIZE * 4);

        let centre = (HALF_TEXTURE_SIZE + HALF_TEXTURE_SIZE * TEXTURE_SIZE) * 4;
        assert_eq!(&texels[centre..centre + 4], &[0x3C00, 0x3C00, 0x3C00, 0x3C00]);

        let corner_alpha = half::f16::from_bits(texels[3]).to_f32();
        assert!((corner_alpha - FALLOFF_FLOOR).abs() < 1e-4);
    }

    #[test]
    fn test_rgba8_layout() {
        let tex = FalloffTexture::generate();
        let texels = tex.to_rgba8();
        assert_eq!(texels.len(), TEXTURE_SIZE * TEXTURE_SIZE * 4);
        assert_eq!(&texels[0..4], &[255, 255, 255, 1]);

        let centre = (HALF_TEXTURE_SIZE + HALF_TEXTURE_SIZE * TEXTURE_SIZE) * 4;
        assert_eq!(texels[centre + 3], 255);
    }
}
