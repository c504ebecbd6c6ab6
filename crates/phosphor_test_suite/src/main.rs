//! Test Pattern Renderer
//!
//! Renders the calibration pattern headlessly and writes it as a PNG, or
//! runs the visual regression suites.
//!
//! Usage:
//!   phosphor-test-pattern                        # Write test_pattern.png
//!   phosphor-test-pattern --out p.png --frames 3 # Custom path, let frames accumulate
//!   phosphor-test-pattern --size 2048x1536       # Custom resolution
//!   phosphor-test-pattern --suites               # Run all visual tests
//!   phosphor-test-pattern --suites --filter foo  # Run tests matching "foo"
//!   phosphor-test-pattern --list                 # List all tests

use anyhow::{bail, Context, Result};
use phosphor_test_suite::{fit_pattern, runner::TestRunner, test_pattern, tests, TestHarness};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Value following `flag`, if present
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (w, h) = value
        .split_once('x')
        .with_context(|| format!("Invalid size '{}', expected WIDTHxHEIGHT", value))?;
    let width = w.parse().with_context(|| format!("Invalid width '{}'", w))?;
    let height = h.parse().with_context(|| format!("Invalid height '{}'", h))?;
    if width == 0 || height == 0 {
        bail!("Size must be non-zero, got {}x{}", width, height);
    }
    Ok((width, height))
}

fn run_suites(filter: Option<&str>) -> Result<()> {
    println!("╔══════════════════════════════════════════╗");
    println!("║    PHOSPHOR VISUAL REGRESSION TESTS      ║");
    println!("╚══════════════════════════════════════════╝\n");

    let mut runner = TestRunner::new();
    for suite in tests::all_suites() {
        runner.add_suite(suite);
    }

    if let Some(pattern) = filter {
        println!("Running tests matching: {}\n", pattern);
        runner.filter(pattern);
    }

    let result = runner.run();
    result.print_summary();

    if result.all_passed() {
        println!("\nAll tests passed!");
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn write_pattern(out: PathBuf, frames: usize, (width, height): (u32, u32)) -> Result<()> {
    let harness = TestHarness::new().context("Failed to create headless GPU context")?;
    let mut display = harness.create_display(width, height)?;
    let (scale, offset) = fit_pattern(width as f64, height as f64);

    harness.render_to_png(
        &mut display,
        frames,
        |display, _| test_pattern(display, scale, offset).context("Failed to draw test pattern"),
        &out,
    )?;
    display.destroy();

    tracing::info!("Wrote {}x{} test pattern to {:?}", width, height, out);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--list") {
        println!("Available test suites:");
        for suite in tests::all_suites() {
            println!("\n  {}:", suite.name);
            for case in &suite.cases {
                println!("    - {}", case.name);
            }
        }
        return Ok(());
    }

    if args.iter().any(|a| a == "--suites") {
        return run_suites(flag_value(&args, "--filter"));
    }

    let out = PathBuf::from(flag_value(&args, "--out").unwrap_or("test_pattern.png"));
    let frames = match flag_value(&args, "--frames") {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid frame count '{}'", value))?,
        None => 1,
    };
    let size = match flag_value(&args, "--size") {
        Some(value) => parse_size(value)?,
        None => (2048, 1536),
    };

    write_pattern(out, frames, size)
}
