//! Test runner for executing test suites
//!
//! Manages test execution, result collection, and reporting.

use crate::harness::{TestContext, TestHarness, TestResult};
use std::collections::HashMap;
use std::time::{Duration, Instant};

type TestFn = Box<dyn FnMut(&mut TestContext) + Send>;

/// A single test case
pub struct TestCase {
    /// Test name
    pub name: String,
    /// Test category
    pub category: String,
    /// Frames to render; the last one is compared
    pub frames: usize,
    /// Viewport override
    pub size: Option<(u32, u32)>,
    /// Test function, called once per frame
    pub test_fn: TestFn,
}

impl TestCase {
    pub fn new<F>(name: &str, category: &str, test_fn: F) -> Self
    where
        F: FnMut(&mut TestContext) + Send + 'static,
    {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            frames: 1,
            size: None,
            test_fn: Box::new(test_fn),
        }
    }
}

/// Result of running a test
pub struct TestRun {
    /// Test name
    pub name: String,
    /// Test category
    pub category: String,
    /// Test result
    pub result: TestResult,
    /// Time taken
    pub duration: Duration,
}

impl TestRun {
    pub fn is_passed(&self) -> bool {
        self.result.is_passed()
    }
}

/// Test suite containing multiple test cases
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Test cases
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cases: Vec::new(),
        }
    }

    /// Add a single-frame test case
    pub fn add<F>(&mut self, name: &str, test_fn: F) -> &mut Self
    where
        F: FnMut(&mut TestContext) + Send + 'static,
    {
        self.cases.push(TestCase::new(name, &self.name, test_fn));
        self
    }

    /// Add a test case rendered over `frames` frames
    pub fn add_frames<F>(&mut self, name: &str, frames: usize, test_fn: F) -> &mut Self
    where
        F: FnMut(&mut TestContext) + Send + 'static,
    {
        let mut case = TestCase::new(name, &self.name, test_fn);
        case.frames = frames.max(1);
        self.cases.push(case);
        self
    }

    /// Add a single-frame test case with its own viewport
    pub fn add_sized<F>(&mut self, name: &str, width: u32, height: u32, test_fn: F) -> &mut Self
    where
        F: FnMut(&mut TestContext) + Send + 'static,
    {
        let mut case = TestCase::new(name, &self.name, test_fn);
        case.size = Some((width, height));
        self.cases.push(case);
        self
    }
}

/// Test runner for executing suites
pub struct TestRunner {
    /// Test harness, absent when no adapter could be created
    harness: Option<TestHarness>,
    /// Why the harness is missing
    skip_reason: String,
    /// Test suites to run
    suites: Vec<TestSuite>,
    /// Filter pattern (None = run all)
    filter: Option<String>,
}

impl TestRunner {
    /// Create a new test runner
    ///
    /// Without a usable adapter every test reports [`TestResult::Skipped`].
    pub fn new() -> Self {
        match TestHarness::new() {
            Ok(harness) => Self::with_harness(harness),
            Err(e) => {
                tracing::warn!("GPU unavailable, skipping visual tests: {:#}", e);
                Self {
                    harness: None,
                    skip_reason: format!("{:#}", e),
                    suites: Vec::new(),
                    filter: None,
                }
            }
        }
    }

    /// Create with custom harness
    pub fn with_harness(harness: TestHarness) -> Self {
        Self {
            harness: Some(harness),
            skip_reason: String::new(),
            suites: Vec::new(),
            filter: None,
        }
    }

    /// Add a test suite
    pub fn add_suite(&mut self, suite: TestSuite) -> &mut Self {
        self.suites.push(suite);
        self
    }

    /// Set a filter pattern
    pub fn filter(&mut self, pattern: &str) -> &mut Self {
        self.filter = Some(pattern.to_string());
        self
    }

    fn run_case(&self, full_name: &str, case: TestCase) -> TestResult {
        let Some(harness) = &self.harness else {
            return TestResult::Skipped {
                reason: self.skip_reason.clone(),
            };
        };

        let outcome = match case.size {
            Some((width, height)) => {
                harness.run_test_with_size(full_name, width, height, case.frames, case.test_fn)
            }
            None => harness.run_test(full_name, case.frames, case.test_fn),
        };

        outcome.unwrap_or_else(|e| {
            tracing::error!("Test {} failed with error: {:#}", full_name, e);
            TestResult::Failed {
                difference: 1.0,
                diff_path: harness.diff_path(full_name),
            }
        })
    }

    /// Run all tests
    pub fn run(&mut self) -> RunResult {
        let start = Instant::now();
        let mut results = Vec::new();

        let suites: Vec<TestSuite> = self.suites.drain(..).collect();
        for suite in suites {
            tracing::info!("Running suite: {}", suite.name);

            for case in suite.cases {
                if let Some(ref pattern) = self.filter {
                    if !case.name.contains(pattern) && !case.category.contains(pattern) {
                        continue;
                    }
                }

                let test_start = Instant::now();
                let full_name = format!("{}::{}", case.category, case.name);
                tracing::debug!("Running test: {}", full_name);

                let name = case.name.clone();
                let category = case.category.clone();
                let result = self.run_case(&full_name, case);

                let duration = test_start.elapsed();
                if result.is_passed() {
                    tracing::info!("  ✓ {} ({:?})", name, duration);
                } else if result.is_skipped() {
                    tracing::info!("  - {} (skipped)", name);
                } else {
                    tracing::error!("  ✗ {} ({:?})", name, duration);
                }

                results.push(TestRun {
                    name,
                    category,
                    result,
                    duration,
                });
            }
        }

        RunResult::new(results, start.elapsed())
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Results from running tests
pub struct RunResult {
    /// Individual test results
    pub results: Vec<TestRun>,
    /// Total time taken
    pub duration: Duration,
}

impl RunResult {
    pub fn new(results: Vec<TestRun>, duration: Duration) -> Self {
        Self { results, duration }
    }

    /// Count of passed tests
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.is_passed()).count()
    }

    /// Count of skipped tests
    pub fn skipped(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_skipped()).count()
    }

    /// Count of failed tests
    pub fn failed(&self) -> usize {
        self.total() - self.passed() - self.skipped()
    }

    /// Total test count
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// No test failed (skips allowed)
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Get results by category
    pub fn by_category(&self) -> HashMap<String, Vec<&TestRun>> {
        let mut map: HashMap<String, Vec<&TestRun>> = HashMap::new();
        for result in &self.results {
            map.entry(result.category.clone()).or_default().push(result);
        }
        map
    }

    /// Print summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════╗");
        println!("║           TEST RESULTS SUMMARY           ║");
        println!("╠══════════════════════════════════════════╣");
        println!("║  Passed:  {:>5}                          ║", self.passed());
        println!("║  Failed:  {:>5}                          ║", self.failed());
        println!("║  Skipped: {:>5}                          ║", self.skipped());
        println!("║  Total:   {:>5}                          ║", self.total());
        println!("║  Time:    {:>8.2?}                      ║", self.duration);
        println!("╚══════════════════════════════════════════╝");

        let by_category = self.by_category();
        let mut categories: Vec<_> = by_category.keys().collect();
        categories.sort();
        for category in categories {
            let runs = &by_category[category];
            let passed = runs.iter().filter(|r| r.is_passed()).count();
            println!("  {:<12} {:>3}/{:<3}", category, passed, runs.len());
        }

        if self.failed() > 0 {
            println!("\nFailed tests:");
            for result in &self.results {
                if !result.is_passed() && !result.result.is_skipped() {
                    println!("  ✗ {}::{}", result.category, result.name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn run(name: &str, category: &str, result: TestResult) -> TestRun {
        TestRun {
            name: name.to_string(),
            category: category.to_string(),
            result,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_suite_builders() {
        let mut suite = TestSuite::new("decay");
        suite
            .add("single", |_| {})
            .add_frames("fade", 4, |_| {})
            .add_sized("small", 64, 48, |_| {});
        assert_eq!(suite.cases.len(), 3);
        assert_eq!(suite.cases[0].frames, 1);
        assert_eq!(suite.cases[1].frames, 4);
        assert_eq!(suite.cases[2].size, Some((64, 48)));
        assert!(suite.cases.iter().all(|c| c.category == "decay"));
    }

    #[test]
    fn test_run_result_counts() {
        let result = RunResult::new(
            vec![
                run("a", "lines", TestResult::Passed),
                run("b", "lines", TestResult::PassedWithNewReference),
                run(
                    "c",
                    "shapes",
                    TestResult::Skipped {
                        reason: "no adapter".into(),
                    },
                ),
                run(
                    "d",
                    "shapes",
                    TestResult::Failed {
                        difference: 0.5,
                        diff_path: PathBuf::from("d_diff.png"),
                    },
                ),
            ],
            Duration::ZERO,
        );
        assert_eq!(result.passed(), 2);
        assert_eq!(result.skipped(), 1);
        assert_eq!(result.failed(), 1);
        assert!(!result.all_passed());
        assert_eq!(result.by_category()["shapes"].len(), 2);
    }
}
