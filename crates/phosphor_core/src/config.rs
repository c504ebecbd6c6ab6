//! Default parameters and fixed constants for vector displays
//!
//! Values mirror the tuning of the classic vector display: five decay frames,
//! a steep first-frame drop to 4% and an 80% per-frame falloff afterwards.

/// Upper bound (inclusive) for the number of decay steps
pub const MAX_DECAY_STEPS: usize = 60;

/// Decay steps used by a freshly created display
pub const DEFAULT_DECAY_STEPS: usize = 5;

/// Brightness multiplier applied on each decay frame after the first
pub const DEFAULT_DECAY: f64 = 0.8;

/// Brightness multiplier applied on the first decay frame
pub const DEFAULT_INITIAL_DECAY: f64 = 0.04;

/// Line thickness (framebuffer units) for a 2048-wide display
pub const DEFAULT_THICKNESS: f64 = 8.0;

/// Glow brightness multiplier
pub const DEFAULT_BRIGHTNESS: f64 = 1.0;

/// Default logical-to-framebuffer scale
pub const DEFAULT_SCALE: f64 = 1.0;

/// Default logical-to-framebuffer offset (both axes)
pub const DEFAULT_OFFSET: f64 = 0.0;

/// Largest display dimension divided by this gives the default thickness
pub const THICKNESS_DIVISOR: f64 = 256.0;

/// Side length of the square falloff texture, in texels
pub const TEXTURE_SIZE: usize = 128;

/// Half of [`TEXTURE_SIZE`], the texture centre
pub const HALF_TEXTURE_SIZE: usize = TEXTURE_SIZE / 2;

/// Glow buffers are this many times smaller than the scene on each axis
pub const GLOW_DIVISOR: u32 = 3;

/// Horizontal + vertical blur iterations over the glow buffers
pub const BLUR_PASSES: usize = 3;

/// Gain applied by every blur pass
pub const BLUR_GAIN: f32 = 1.05;

/// 9-tap Gaussian kernel, centre tap in the middle
pub const BLUR_WEIGHTS: [f32; 9] = [0.05, 0.09, 0.12, 0.15, 0.16, 0.15, 0.12, 0.09, 0.05];

/// Multiplier for the scene when compositing to the destination
pub const SCENE_MULT: f32 = 1.0;

/// Multiplier for the blurred glow when compositing (scaled by brightness)
pub const GLOW_MULT: f32 = 1.5;

/// First and last point closer than this (per axis) close the polyline
pub const CLOSED_PATH_EPSILON: f64 = 0.1;

/// Depth sentinel written into every emitted vertex
pub const VERTEX_Z: f32 = 10000.0;

/// Far plane of the orthographic projection; must exceed [`VERTEX_Z`]
pub const Z_FAR: f32 = 70001.0;

/// Initial capacity of pending point and vertex buffers
pub const INITIAL_BUFFER_CAPACITY: usize = 60;
