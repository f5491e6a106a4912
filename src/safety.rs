//! Safety checks for files the binaries write.
//!
//! A stats report is written with `std::fs::write`, which truncates. These
//! checks stop a mistyped `--report` from clobbering the library dump or a
//! playlist export.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that a report path is safe to overwrite.
///
/// Checks:
/// - The report must have a `.json` extension
/// - The report cannot be any of the input paths
pub fn validate_report_path(report: &Path, inputs: &[&Path]) -> Result<()> {
    let is_json = report
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        bail!(
            "Safety check failed: report '{}' must have a .json extension",
            report.display()
        );
    }

    for input in inputs {
        if report == *input {
            bail!(
                "Safety check failed: report '{}' cannot be the same as input '{}'",
                report.display(),
                input.display()
            );
        }
    }

    Ok(())
}
