//! Phosphor Visual Test Suite
//!
//! Headless rendering tests for the vector display.
//!
//! # Test Categories
//!
//! - **Lines**: Segments, dots, joints and thickness
//! - **Shapes**: Boxes, circles, wheels and packed outlines
//! - **Decay**: Multi-frame persistence and glow
//! - **Pattern**: The full calibration pattern
//!
//! Each run writes PNGs to `test_output/` and compares them with references
//! in `test_output/references/`, creating missing references on first run.

pub mod harness;
pub mod pattern;
pub mod runner;
pub mod tests;

pub use harness::{TestContext, TestHarness, TestHarnessConfig, TestResult};
pub use pattern::{fit_pattern, test_pattern};
pub use runner::TestRunner;
