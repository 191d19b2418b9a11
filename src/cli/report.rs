use crate::services::{DoctorReport, Outcome, Severity};
use tracing::{debug, info, warn};

/// Summarises a finished batch. Per-item lines were already logged.
pub fn outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Nothing => debug!("nothing to do"),
        Outcome::Declined => {}
        Outcome::Executed(report) if report.is_clean() => {
            debug!("{} action(s) completed", report.attempted())
        }
        Outcome::Executed(report) => {
            for failure in &report.failures {
                warn!("issue: {failure}");
            }
        }
    }
}

pub fn doctor(report: &DoctorReport) {
    for section in report.sections() {
        if section.lines.is_empty() {
            continue;
        }

        let label = match section.severity {
            Severity::Issue => "issue",
            Severity::Warning => "warning",
        };

        println!("{label}: {} ({})", section.title, section.remedy);
        for line in section.lines {
            println!("  - {line}");
        }
    }

    if report.is_healthy() {
        info!("everything looks tidy");
    }
}
