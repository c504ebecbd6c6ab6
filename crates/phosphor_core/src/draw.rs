//! Line drawing trait shared by the host state, the GPU display and helpers

/// Anything that accepts polylines
///
/// Coordinates are logical; implementors apply their own transform.
pub trait LineSink {
    /// Start a polyline at (x, y)
    fn begin_draw(&mut self, x: f64, y: f64);

    /// Extend the open polyline to (x, y)
    fn draw_to(&mut self, x: f64, y: f64);

    /// Close the polyline and emit its geometry
    fn end_draw(&mut self);

    /// Draw a single segment
    fn draw(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        self.begin_draw(x0, y0);
        self.draw_to(x1, y1);
        self.end_draw();
    }
}
