//! Phosphor GPU Renderer
//!
//! Draws a [`phosphor_core::DisplayState`] with wgpu.
//!
//! # Features
//!
//! - **Line ribbons**: Falloff-textured triangles shaped by the core tessellator
//! - **Persistence**: Each frame is kept for a number of decay steps and redrawn with fading opacity
//! - **Glow**: Separable Gaussian blur at a third of the display resolution
//! - **Compositing**: Scene and glow added onto the caller's render target

pub mod config;
pub mod display;
mod pipelines;
pub mod shaders;
mod targets;
pub mod uniforms;

pub use config::{Accumulation, DisplayConfig, FalloffFormat};
pub use display::VectorDisplay;
pub use pipelines::SCENE_FORMAT;
pub use shaders::{blur_shader, composite_shader, LINE_SHADER};
pub use uniforms::{BlitUniforms, LineUniforms};

pub use phosphor_core::{DisplayError, LineSink, Result};
