//! Human-readable output formatting

use crate::engine::{PreviewReport, Report, ResetReport};
use bytesize::ByteSize;

pub fn format_human(report: &Report) -> String {
    match report {
        Report::Reset(reset) => format_reset(reset),
        Report::Preview(preview) => format_preview(preview),
    }
}

fn format_reset(report: &ResetReport) -> String {
    let reaper = &report.reaper;
    let purge = &report.purge;

    let mut output = String::from("Summary\n-------\n");
    if reaper.used_fallback_kill {
        output.push_str("Processes: killed by name (count unknown)\n");
    } else {
        output.push_str(&format!("Processes: {} terminated\n", reaper.terminated_count));
    }
    output.push_str(&format!("Errors:    {}\n", reaper.error_count));

    let folder = match (&purge.error_message, purge.directory_existed) {
        (Some(err), _) => format!("not removed ({})", err),
        (None, true) => "deleted".to_string(),
        (None, false) => "not found".to_string(),
    };
    output.push_str(&format!("Folder:    {}\n", folder));
    output.push_str(&format!("\nTarget folder: {}", report.target_dir.display()));
    output
}

fn format_preview(preview: &PreviewReport) -> String {
    let mut output = String::from("[DRY RUN] No changes were made\n\n");

    output.push_str("Processes\n---------\n");
    if !preview.enumeration_available {
        output.push_str("Process enumeration unavailable; would kill by name\n");
    } else if preview.processes.is_empty() {
        output.push_str("No matching processes found\n");
    } else {
        output.push_str(&format!("{:<8} {:<20}\n", "PID", "NAME"));
        output.push_str(&"-".repeat(29));
        output.push('\n');
        for proc in &preview.processes {
            output.push_str(&format!("{:<8} {:<20}\n", proc.pid, proc.name));
        }
    }

    output.push_str("\nData folder\n-----------\n");
    if preview.directory_exists {
        output.push_str(&format!(
            "Would delete: {} ({} in {} entries)",
            preview.target_dir.display(),
            ByteSize(preview.total_bytes),
            preview.entry_count
        ));
    } else {
        output.push_str(&format!("Not found: {}", preview.target_dir.display()));
    }
    output
}
