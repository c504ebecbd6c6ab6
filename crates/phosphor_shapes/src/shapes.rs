//! Basic outlines: lines, boxes, circles and wheels

use std::f64::consts::{FRAC_PI_4, TAU};

use phosphor_core::LineSink;

/// Inset of wheel spokes from the rim
const SPOKE_INSET: f64 = 2.0;

/// Rim segments of a wheel
const WHEEL_RIM_STEPS: usize = 8;

/// Point on a circle, angle measured clockwise from "up"
fn rim_point(x: f64, y: f64, radius: f64, angle: f64) -> (f64, f64) {
    (x + radius * angle.sin(), y - radius * angle.cos())
}

/// Single segment from (x0, y0) to (x1, y1)
pub fn draw_line<S: LineSink + ?Sized>(sink: &mut S, x0: f64, y0: f64, x1: f64, y1: f64) {
    sink.begin_draw(x0, y0);
    sink.draw_to(x1, y1);
    sink.end_draw();
}

/// Axis-aligned rectangle as one closed polyline
pub fn draw_box<S: LineSink + ?Sized>(sink: &mut S, x: f64, y: f64, w: f64, h: f64) {
    sink.begin_draw(x, y);
    sink.draw_to(x + w, y);
    sink.draw_to(x + w, y + h);
    sink.draw_to(x, y + h);
    sink.draw_to(x, y);
    sink.end_draw();
}

/// Regular polygon with `steps` sides approximating a circle
///
/// Starts at the top and pushes `steps + 1` points, the last landing back on
/// the first so the outline closes without caps.
pub fn draw_circle<S: LineSink + ?Sized>(sink: &mut S, x: f64, y: f64, radius: f64, steps: usize) {
    if steps == 0 {
        return;
    }
    draw_polygon(sink, x, y, radius, 0.0, steps);
}

/// Spoked wheel: four spokes at 45 degree intervals inside an octagon rim
pub fn draw_wheel<S: LineSink + ?Sized>(sink: &mut S, angle: f64, x: f64, y: f64, radius: f64) {
    let spoke = radius - SPOKE_INSET;
    for i in 0..4 {
        let a = angle + i as f64 * FRAC_PI_4;
        let (x0, y0) = rim_point(x, y, spoke, a);
        let (x1, y1) = rim_point(x, y, -spoke, a);
        draw_line(sink, x0, y0, x1, y1);
    }
    draw_polygon(sink, x, y, radius, angle, WHEEL_RIM_STEPS);
}

fn draw_polygon<S: LineSink + ?Sized>(
    sink: &mut S,
    x: f64,
    y: f64,
    radius: f64,
    start: f64,
    steps: usize,
) {
    let step = TAU / steps as f64;
    let (x0, y0) = rim_point(x, y, radius, start);
    sink.begin_draw(x0, y0);
    for i in 1..=steps {
        let (px, py) = rim_point(x, y, radius, start + i as f64 * step);
        sink.draw_to(px, py);
    }
    sink.end_draw();
}
