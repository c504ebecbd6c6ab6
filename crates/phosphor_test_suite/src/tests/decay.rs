//! Persistence tests
//!
//! Frames drawn once and then left to fade through the history

use super::check;
use crate::runner::TestSuite;
use phosphor_gpu::LineSink;
use phosphor_shapes::draw_circle;

/// Create the decay test suite
pub fn suite() -> TestSuite {
    let mut suite = TestSuite::new("decay");

    // A dot moving right leaves a fading trail
    suite.add_frames("trail", 6, |ctx| {
        let frame = ctx.frame;
        let d = ctx.display();
        d.set_color(1.0, 1.0, 1.0);
        let x = 200.0 + 120.0 * frame as f64;
        d.draw(x, 384.0, x, 384.0);
    });

    // Drawn only in the first frame, read back once it has aged
    suite.add_frames("afterglow", 3, |ctx| {
        if ctx.is_first_frame() {
            let d = ctx.display();
            d.set_color(0.7, 1.0, 0.7);
            draw_circle(d, 512.0, 384.0, 200.0, 64);
        }
    });

    // Slower decay over a longer history
    suite.add_frames("long_history", 12, |ctx| {
        let frame = ctx.frame;
        let d = ctx.display();
        if frame == 0 {
            check(d.set_decay_steps(12));
            check(d.set_decay(0.9));
            check(d.set_initial_decay(0.3));
        }
        d.set_color(1.0, 0.7, 0.7);
        let y = 100.0 + 50.0 * frame as f64;
        d.draw(100.0, y, 900.0, y);
    });

    // Brightness scales only the glow
    suite.add("no_glow", |ctx| {
        let d = ctx.display();
        check(d.set_brightness(0.0));
        d.set_color(1.0, 1.0, 1.0);
        d.draw(100.0, 384.0, 900.0, 384.0);
    });

    suite
}
