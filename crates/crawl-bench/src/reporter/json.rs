//! JSON reporter for benchmark reports

use anyhow::Result;

use crate::report::BenchmarkReport;

/// JSON format reporter
pub struct JsonReporter;

impl JsonReporter {
    /// Serialize the report with the camelCase field names readers of saved
    /// reports expect.
    pub fn format(report: &BenchmarkReport, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(output)
    }
}
