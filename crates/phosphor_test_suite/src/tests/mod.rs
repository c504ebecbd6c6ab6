//! Visual test cases organized by category

pub mod decay;
pub mod lines;

use crate::runner::TestSuite;

/// Create all test suites
pub fn all_suites() -> Vec<TestSuite> {
    vec![
        lines::suite(),
        shapes::suite(),
        decay::suite(),
        pattern::suite(),
    ]
}

/// Log a rejected display parameter instead of aborting the run
pub(crate) fn check(result: phosphor_core::Result<()>) {
    if let Err(e) = result {
        tracing::error!("display rejected test parameter: {}", e);
    }
}
