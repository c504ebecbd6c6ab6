//! Classic calibration pattern
//!
//! Laid out on a 2048x1536 logical canvas and fitted to the display through
//! its transform: rows of lines and dots, circles, boxes and wheels.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use phosphor_core::Result;
use phosphor_gpu::{LineSink, VectorDisplay};
use phosphor_shapes::{draw_box, draw_circle, draw_wheel};

/// Logical canvas the pattern is laid out on
pub const PATTERN_WIDTH: f64 = 2048.0;
pub const PATTERN_HEIGHT: f64 = 1536.0;

/// Scale and offset that letterbox the pattern canvas into `width` x `height`
pub fn fit_pattern(width: f64, height: f64) -> (f64, (f64, f64)) {
    if width / height < PATTERN_WIDTH / PATTERN_HEIGHT {
        let scale = width / PATTERN_WIDTH;
        (scale, (0.0, ((height - PATTERN_HEIGHT * scale) / 2.0).floor()))
    } else {
        let scale = height / PATTERN_HEIGHT;
        (scale, (((width - PATTERN_WIDTH * scale) / 2.0).floor(), 0.0))
    }
}

/// Draw the pattern with the given transform
///
/// The display keeps the transform afterwards.
pub fn test_pattern(display: &mut VectorDisplay, scale: f64, offset: (f64, f64)) -> Result<()> {
    display.set_transform(offset.0, offset.1, scale)?;

    // Lines and dots, repeated to show overdraw
    display.set_color(1.0, 0.7, 0.7);
    for i in 0..4 {
        let y = 750.0 + 100.0 * i as f64;
        for _ in 0..i {
            display.draw(50.0, y, 400.0, y);
            display.draw(500.0, y, 500.0, y);
        }
    }
    for i in 0..4 {
        let x = 50.0 + 100.0 * i as f64;
        for _ in 0..=i {
            display.draw(x, 1200.0, x, 1400.0);
            display.draw(x, 1450.0, x, 1450.0);
        }
    }

    display.set_color(0.7, 0.7, 1.0);
    draw_circle(display, 500.0, 950.0, 20.0, 32);
    draw_circle(display, 600.0, 950.0, 50.0, 32);
    draw_circle(display, 800.0, 950.0, 100.0, 32);
    draw_circle(display, 1075.0, 950.0, 150.0, 64);

    display.set_color(0.7, 1.0, 0.7);
    draw_box(display, 500.0, 1200.0, 40.0, 40.0);
    draw_box(display, 565.0, 1200.0, 100.0, 100.0);
    draw_box(display, 700.0, 1200.0, 200.0, 200.0);
    draw_box(display, 950.0, 1200.0, 300.0, 300.0);

    display.set_color(1.0, 0.7, 1.0);
    draw_wheel(display, PI, 1425.0, 950.0, 150.0);
    draw_wheel(display, 3.0 * FRAC_PI_4, 1700.0, 950.0, 100.0);
    draw_wheel(display, FRAC_PI_2, 1900.0, 950.0, 50.0);
    draw_wheel(display, FRAC_PI_4, 2000.0, 950.0, 20.0);

    let vertices = display.state().mesh().len();
    tracing::debug!(
        vertices,
        scale,
        "drew test pattern"
    );
    Ok(())
}
