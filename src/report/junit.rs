// ABOUTME: JUnit XML report parser producing pass/fail summaries
// Tolerates missing or malformed files by reporting the failure inline

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::models::TestSummary;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read report: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("invalid count attribute '{attribute}': {value}")]
    InvalidCount { attribute: &'static str, value: String },
}

/// Parse one JUnit XML report into a summary.
///
/// A `testsuites` root sums over its `testsuite` children; any other root is
/// treated as a single suite. Per suite, `passed = tests - failures - errors`
/// and `failed = failures + errors`, with missing attributes counted as zero.
///
/// This function never fails: a missing file, unreadable XML, or non-numeric
/// count yields a zero summary carrying the diagnostic in its `error` field.
pub fn parse_report(path: &Path) -> TestSummary {
    match read_summary(path) {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Error parsing {}: {}", path.display(), e);
            TestSummary::parse_error(e.to_string())
        }
    }
}

fn read_summary(path: &Path) -> Result<TestSummary, ReportError> {
    let text = std::fs::read_to_string(path)?;
    let document = roxmltree::Document::parse(&text)?;
    let root = document.root_element();

    let mut passed = 0u64;
    let mut failed = 0u64;

    if root.has_tag_name("testsuites") {
        for suite in root.children().filter(|n| n.has_tag_name("testsuite")) {
            let (p, f) = suite_counts(&suite)?;
            passed += p;
            failed += f;
        }
    } else {
        let (p, f) = suite_counts(&root)?;
        passed = p;
        failed = f;
    }

    Ok(TestSummary::new(passed, failed))
}

fn suite_counts(suite: &roxmltree::Node<'_, '_>) -> Result<(u64, u64), ReportError> {
    let tests = count_attribute(suite, "tests")?;
    let failures = count_attribute(suite, "failures")?;
    let errors = count_attribute(suite, "errors")?;

    // A suite claiming more failures than tests is not worth rejecting
    // outright; the pass count just bottoms out at zero.
    let passed = tests.saturating_sub(failures + errors);
    Ok((passed, failures + errors))
}

fn count_attribute(
    node: &roxmltree::Node<'_, '_>,
    attribute: &'static str,
) -> Result<u64, ReportError> {
    match node.attribute(attribute) {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| ReportError::InvalidCount {
            attribute,
            value: value.to_string(),
        }),
    }
}
