// ABOUTME: Test report parsing for JUnit XML files produced by subproject test runners

pub mod junit;

pub use junit::parse_report;
