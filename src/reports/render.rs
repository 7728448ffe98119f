//! Markdown rendering of reports for users and admins.

use super::{Report, ReportDraft, ReportStatus};

/// Number of detail characters shown in the confirmation summary.
pub const SUMMARY_DETAILS_LENGTH: usize = 200;

/// Summary shown to the reporter before confirming.
#[must_use]
pub fn confirmation_summary(draft: &ReportDraft) -> String {
    format!(
        "📋 **Please confirm your report:**\n\n\
         **Type:** {}\n\
         **Target:** {}\n\
         **Reason:** {}\n\
         **Details:** {}",
        draft.kind.label(),
        draft.target,
        draft.reason.title(),
        draft.details.chars().take(SUMMARY_DETAILS_LENGTH).collect::<String>(),
    )
}

/// Notification delivered to the report channel and the admins.
#[must_use]
pub fn notification_text(report: &Report) -> String {
    format!(
        "🚨 **NEW REPORT**\n\n\
         **Report ID:** #{}\n\
         **Date:** {}\n\
         **Reporter:** {} (ID: `{}`)\n\
         **Type:** {}\n\
         **Target:** {}\n\
         **Reason:** {}\n\
         **Details:** {}\n",
        report.id,
        report.created_at.format("%Y-%m-%d %H:%M:%S"),
        report.reporter.full_name,
        report.reporter.id,
        report.kind.label(),
        report.target,
        report.reason.title(),
        report.details,
    )
}

/// Footer appended to a notification once an admin acted on it.
#[must_use]
pub const fn review_footer(status: ReportStatus) -> Option<&'static str> {
    match status {
        ReportStatus::Pending => None,
        ReportStatus::Resolved => Some("✅ **Report resolved by admin**"),
        ReportStatus::Rejected => Some("❌ **Report rejected by admin**"),
    }
}

/// Notification text including the review footer, if any.
#[must_use]
pub fn reviewed_notification_text(report: &Report) -> String {
    let mut text = notification_text(report);
    if let Some(footer) = review_footer(report.status) {
        text.push('\n');
        text.push_str(footer);
    }
    text
}

/// Listing of a user's recent reports, newest first.
#[must_use]
pub fn history_text(reports: &[Report]) -> String {
    if reports.is_empty() {
        return "📊 You have not submitted any reports yet.\n\
                Use /report to create one."
            .to_owned();
    }

    let mut text = format!("📊 **Your last {} reports:**\n", reports.len());
    for report in reports {
        text.push_str(&format!(
            "\n#{} · {}\n{} {} · {}\n",
            report.id,
            report.status.label(),
            report.kind.label(),
            truncate(&report.target, 40),
            report.reason.title(),
        ));
    }
    text
}

/// Truncates a string to a maximum length, adding "..." if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
