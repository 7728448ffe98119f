//! Selection of stored reports for offline review.

use super::{Report, ReportStatus};

/// Criteria for listing reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Only reports with this status.
    pub status: Option<ReportStatus>,

    /// Only reports filed by this user.
    pub reporter: Option<i64>,

    /// At most this many reports, newest first.
    pub limit: Option<usize>,
}

impl ReportFilter {
    /// Checks whether a single report matches the status and reporter criteria.
    #[must_use]
    pub fn matches(&self, report: &Report) -> bool {
        self.status.is_none_or(|status| report.status == status)
            && self.reporter.is_none_or(|id| report.reporter.id == id)
    }

    /// Returns matching reports, newest first.
    #[must_use]
    pub fn apply<'a>(&self, reports: &'a [Report]) -> Vec<&'a Report> {
        reports
            .iter()
            .rev()
            .filter(|r| self.matches(r))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Counts of reports per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub resolved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    /// Tallies the reports.
    #[must_use]
    pub fn tally(reports: &[Report]) -> Self {
        reports.iter().fold(Self::default(), |mut counts, report| {
            match report.status {
                ReportStatus::Pending => counts.pending += 1,
                ReportStatus::Resolved => counts.resolved += 1,
                ReportStatus::Rejected => counts.rejected += 1,
            }
            counts
        })
    }

    /// Total number of reports.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.resolved + self.rejected
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::reports::{ReportKind, ReportReason, Reporter};

    fn report(id: &str, reporter: i64, status: ReportStatus) -> Report {
        Report {
            id: id.to_owned(),
            created_at: Local::now(),
            reporter: Reporter {
                id: reporter,
                full_name: "Someone".to_owned(),
            },
            kind: ReportKind::Group,
            target: "@some_group".to_owned(),
            reason: ReportReason::Spam,
            details: String::new(),
            status,
            reviewed_by: None,
        }
    }

    fn sample() -> Vec<Report> {
        vec![
            report("1", 10, ReportStatus::Pending),
            report("2", 20, ReportStatus::Resolved),
            report("3", 10, ReportStatus::Rejected),
            report("4", 10, ReportStatus::Pending),
        ]
    }

    fn ids(reports: &[&Report]) -> Vec<String> {
        reports.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_default_filter_lists_all_newest_first() {
        let reports = sample();
        assert_eq!(ids(&ReportFilter::default().apply(&reports)), ["4", "3", "2", "1"]);
    }

    #[test]
    fn test_filter_by_status_and_reporter() {
        let reports = sample();
        let filter = ReportFilter {
            status: Some(ReportStatus::Pending),
            reporter: Some(10),
            limit: None,
        };
        assert_eq!(ids(&filter.apply(&reports)), ["4", "1"]);
    }

    #[test]
    fn test_filter_limit() {
        let reports = sample();
        let filter = ReportFilter {
            limit: Some(2),
            ..ReportFilter::default()
        };
        assert_eq!(ids(&filter.apply(&reports)), ["4", "3"]);
    }

    #[test]
    fn test_status_counts() {
        let counts = StatusCounts::tally(&sample());
        assert_eq!(
            counts,
            StatusCounts {
                pending: 2,
                resolved: 1,
                rejected: 1
            }
        );
        assert_eq!(counts.total(), 4);
    }
}
