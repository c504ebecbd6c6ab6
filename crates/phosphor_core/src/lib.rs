//! Phosphor Core
//!
//! Host-side engine for persistent-phosphor vector displays. Turns polylines
//! into textured triangle ribbons and keeps the decaying frame history the
//! GPU backend composites from. Nothing in this crate touches the GPU.
//!
//! # Example
//!
//! ```
//! use phosphor_core::{DisplayState, LineSink};
//!
//! let mut state = DisplayState::new(2048.0, 1536.0).unwrap();
//! state.set_color(0.2, 1.0, 0.4);
//! state.begin_draw(100.0, 100.0);
//! state.draw_to(400.0, 100.0);
//! state.draw_to(400.0, 400.0);
//! state.end_draw();
//!
//! assert!(!state.mesh().is_empty());
//! let frame = state.commit_frame();
//! assert_eq!(frame.draws[0].opacity, 1.0);
//! ```

pub mod config;
pub mod draw;
pub mod error;
pub mod falloff;
pub mod frame_ring;
pub mod half_float;
pub mod log;
pub mod mesh;
pub mod state;
pub mod tessellate;

pub use draw::LineSink;
pub use error::{DisplayError, Result};
pub use falloff::FalloffTexture;
pub use frame_ring::{opacity_for_age, FrameRing, SlotDraw};
pub use half_float::{f16_bits_to_f32, f32_to_f16_bits};
pub use log::{log_diagnostic, set_log_sink, LogSink};
pub use mesh::{MeshBuffer, Vertex};
pub use state::{default_thickness_for, DisplayState, FrameCommit, Transform};
pub use tessellate::{tessellate, Pen, TessellationSummary, Tessellator};
