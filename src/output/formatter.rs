//! Picks the renderer for a finished report.

use crate::engine::Report;
use crate::output::human::format_human;
use crate::output::json::format_json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }

    /// Whether progress lines should be echoed while the reset runs.
    /// JSON output keeps stdout to the single final document.
    pub fn streams_progress(self) -> bool {
        self == OutputFormat::Human
    }
}

pub fn format_output(report: &Report, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(report),
        OutputFormat::Json => format_json(report),
    }
}
