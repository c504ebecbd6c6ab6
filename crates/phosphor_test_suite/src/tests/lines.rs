//! Line rendering tests
//!
//! Single segments, joints, caps and thickness

use super::check;
use crate::runner::TestSuite;
use phosphor_gpu::LineSink;

/// Create the lines test suite
pub fn suite() -> TestSuite {
    let mut suite = TestSuite::new("lines");

    // Axis-aligned and diagonal segments
    suite.add("segments", |ctx| {
        let d = ctx.display();
        d.set_color(1.0, 1.0, 1.0);
        d.draw(100.0, 100.0, 900.0, 100.0);
        d.draw(100.0, 200.0, 100.0, 700.0);
        d.draw(200.0, 200.0, 900.0, 700.0);
    });

    // Coincident endpoints still leave a capped dot
    suite.add("dots", |ctx| {
        let d = ctx.display();
        d.set_color(1.0, 0.7, 0.7);
        for i in 0..8 {
            let x = 100.0 + 100.0 * i as f64;
            d.draw(x, 384.0, x, 384.0);
        }
    });

    // Shallow and sharp turns: fans below 90 degrees, caps beyond
    suite.add("joints", |ctx| {
        let d = ctx.display();
        d.set_color(0.7, 1.0, 0.7);

        d.begin_draw(100.0, 600.0);
        d.draw_to(300.0, 500.0);
        d.draw_to(500.0, 600.0);
        d.draw_to(700.0, 500.0);
        d.end_draw();

        d.begin_draw(100.0, 300.0);
        d.draw_to(400.0, 100.0);
        d.draw_to(450.0, 350.0);
        d.end_draw();

        // Hairpin; the joint is disconnected
        d.begin_draw(600.0, 100.0);
        d.draw_to(900.0, 120.0);
        d.draw_to(600.0, 140.0);
        d.end_draw();
    });

    // Thickness ramp
    suite.add("thickness", |ctx| {
        let d = ctx.display();
        d.set_color(0.7, 0.7, 1.0);
        for i in 0..6 {
            let y = 100.0 + 110.0 * i as f64;
            check(d.set_thickness(1.0 + 4.0 * i as f64));
            d.draw(100.0, y, 900.0, y);
        }
    });

    // Overlapping strokes brighten rather than darken
    suite.add("overdraw", |ctx| {
        let d = ctx.display();
        d.set_color(0.5, 0.5, 0.5);
        for i in 0..4 {
            let y = 200.0 + 120.0 * i as f64;
            for _ in 0..=i {
                d.draw(150.0, y, 850.0, y);
            }
        }
    });

    suite
}
