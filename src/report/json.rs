use super::Report;
use crate::error::{DeadbindError, Result};
use serde::Serialize;

/// JSON reporter for programmatic output
#[derive(Debug, Default)]
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &Report) -> Result<String> {
        let json = JsonReport {
            version: "1.0",
            summary: JsonSummary {
                unused_classes: report.unused_classes.len(),
                unused_methods: report.method_count(),
                diagnostics: report.diagnostics.len(),
            },
            report,
        };
        let mut rendered = serde_json::to_string_pretty(&json)
            .map_err(|e| DeadbindError::config(format!("cannot serialize report: {}", e)))?;
        rendered.push('\n');
        Ok(rendered)
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    summary: JsonSummary,
    #[serde(flatten)]
    report: &'a Report,
}

#[derive(Serialize)]
struct JsonSummary {
    unused_classes: usize,
    unused_methods: usize,
    diagnostics: usize,
}
