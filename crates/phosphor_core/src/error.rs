//! Display error types

use thiserror::Error;

/// Errors reported by vector display operations
///
/// Parameter errors are raised before any state is touched, so a failed
/// setter leaves the display exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DisplayError {
    /// Width or height is zero, negative or not finite
    #[error("Invalid display size: {width}x{height}")]
    InvalidSize { width: f64, height: f64 },

    /// Thickness must be strictly positive
    #[error("Invalid line thickness: {0} (must be > 0)")]
    InvalidThickness(f64),

    /// Decay must lie in [0, 1)
    #[error("Invalid decay: {0} (must be in [0, 1))")]
    InvalidDecay(f64),

    /// Initial decay must lie in [0, 1)
    #[error("Invalid initial decay: {0} (must be in [0, 1))")]
    InvalidInitialDecay(f64),

    /// Step count above the supported maximum
    #[error("Invalid decay step count: {0} (must be in 0..={max})", max = crate::config::MAX_DECAY_STEPS)]
    InvalidSteps(usize),

    /// Brightness must be finite and non-negative
    #[error("Invalid brightness: {0} (must be >= 0)")]
    InvalidBrightness(f64),

    /// Transform scale must be finite and non-zero
    #[error("Invalid transform scale: {0}")]
    InvalidScale(f64),

    /// Shader module or pipeline failed validation
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),

    /// A GPU texture, buffer or render target could not be created
    #[error("GPU resource allocation failed: {0}")]
    ResourceAllocation(String),

    /// A GPU operation was requested before `setup`
    #[error("GPU resources have not been set up")]
    NotSetUp,
}

/// Result type for display operations
pub type Result<T> = std::result::Result<T, DisplayError>;
