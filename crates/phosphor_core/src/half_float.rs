//! IEEE 754 single <-> half precision conversion
//!
//! Used to pack the falloff texture into `Rgba16Float` storage. Encoding
//! rounds to nearest even; values beyond the half range become infinities
//! and NaNs stay NaNs.

use half::f16;

/// Encode an `f32` as half-precision bits
pub fn f32_to_f16_bits(value: f32) -> u16 {
    f16::from_f32(value).to_bits()
}

/// Decode half-precision bits to an `f32`
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}
