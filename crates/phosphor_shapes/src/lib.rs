//! Phosphor Shapes
//!
//! Outline helpers built on the [`LineSink`] polyline API. Anything that
//! implements it can be drawn on: the host-side `DisplayState`, a GPU
//! `VectorDisplay`, or a recorder in tests.
//!
//! ```
//! use phosphor_core::DisplayState;
//! use phosphor_shapes::{draw_box, draw_circle};
//!
//! let mut state = DisplayState::new(640.0, 480.0).unwrap();
//! draw_box(&mut state, 10.0, 10.0, 100.0, 50.0);
//! draw_circle(&mut state, 320.0, 240.0, 40.0, 32);
//! assert!(!state.mesh().is_empty());
//! ```

pub mod outline;
pub mod shapes;

pub use outline::{draw_shape, ShapeError};
pub use phosphor_core::LineSink;
pub use shapes::{draw_box, draw_circle, draw_line, draw_wheel};
