//! Report storage backed by a JSON file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{Report, ReportDraft, ReportStatus, Reporter};

/// Errors that can occur while reading or updating the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access report store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse report store: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Report not found: #{0}")]
    NotFound(String),

    #[error("Report #{id} was already {status}")]
    AlreadyReviewed { id: String, status: ReportStatus },
}

/// Stores submitted reports and persists them after every change.
#[derive(Debug)]
pub struct ReportStore {
    /// File the reports are saved to. `None` keeps them in memory only.
    path: Option<PathBuf>,

    /// Reports in submission order.
    reports: RwLock<Vec<Report>>,
}

impl ReportStore {
    /// Opens the store at the given path.
    ///
    /// A missing file yields an empty store; a file that cannot be parsed
    /// is an error so existing reports are never overwritten.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let reports = load_reports(&path).await?;

        info!("Loaded {} reports from {}", reports.len(), path.display());

        Ok(Self {
            path: Some(path),
            reports: RwLock::new(reports),
        })
    }

    /// Creates a store that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            reports: RwLock::new(Vec::new()),
        }
    }

    /// Returns the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stores a new report submitted now.
    pub async fn submit(&self, reporter: Reporter, draft: ReportDraft) -> Result<Report, StoreError> {
        self.submit_at(reporter, draft, Local::now()).await
    }

    /// Stores a new report with an explicit submission time.
    pub async fn submit_at(
        &self,
        reporter: Reporter,
        draft: ReportDraft,
        created_at: DateTime<Local>,
    ) -> Result<Report, StoreError> {
        let mut reports = self.reports.write().await;

        let id = unique_id(&reports, &created_at);
        let report = Report {
            id,
            created_at,
            reporter,
            kind: draft.kind,
            target: draft.target,
            reason: draft.reason,
            details: draft.details,
            status: ReportStatus::Pending,
            reviewed_by: None,
        };

        reports.push(report.clone());

        if let Err(e) = self.persist(&reports).await {
            reports.pop(); // Rollback
            return Err(e);
        }

        debug!("Stored report #{}", report.id);
        Ok(report)
    }

    /// Records an admin decision on a pending report.
    pub async fn review(
        &self,
        id: &str,
        status: ReportStatus,
        admin_id: i64,
    ) -> Result<Report, StoreError> {
        let mut reports = self.reports.write().await;

        let Some(idx) = reports.iter().position(|r| r.id == id) else {
            return Err(StoreError::NotFound(id.to_owned()));
        };

        let current = reports[idx].status;
        if current.is_reviewed() {
            return Err(StoreError::AlreadyReviewed {
                id: id.to_owned(),
                status: current,
            });
        }

        reports[idx].status = status;
        reports[idx].reviewed_by = Some(admin_id);

        if let Err(e) = self.persist(&reports).await {
            reports[idx].status = current; // Rollback
            reports[idx].reviewed_by = None;
            return Err(e);
        }

        info!("Report #{} marked {} by admin {}", id, status, admin_id);
        Ok(reports[idx].clone())
    }

    /// Returns the newest reports of a user, newest first.
    pub async fn recent_for(&self, user_id: i64, limit: usize) -> Vec<Report> {
        let reports = self.reports.read().await;
        reports
            .iter()
            .rev()
            .filter(|r| r.reporter.id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Gets a report by id.
    pub async fn get(&self, id: &str) -> Option<Report> {
        let reports = self.reports.read().await;
        reports.iter().find(|r| r.id == id).cloned()
    }

    /// Returns all reports in submission order.
    pub async fn all(&self) -> Vec<Report> {
        self.reports.read().await.clone()
    }

    /// Returns the number of stored reports.
    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    /// Returns true if no reports are stored.
    pub async fn is_empty(&self) -> bool {
        self.reports.read().await.is_empty()
    }

    /// Writes the reports to disk through a temporary file.
    async fn persist(&self, reports: &[Report]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(reports)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Reads reports from a JSON file; a missing file means no reports.
pub async fn load_reports(path: &Path) -> Result<Vec<Report>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Builds a report id from the timestamp, adding `-2`, `-3`, ... on collision.
fn unique_id(reports: &[Report], created_at: &DateTime<Local>) -> String {
    let base = created_at.format("%Y%m%d%H%M%S").to_string();
    let taken = |candidate: &str| reports.iter().any(|r| r.id == candidate);

    if !taken(&base) {
        return base;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::reports::{ReportKind, ReportReason};

    fn reporter(id: i64) -> Reporter {
        Reporter {
            id,
            full_name: format!("User {id}"),
        }
    }

    fn draft(target: &str) -> ReportDraft {
        ReportDraft {
            kind: ReportKind::Group,
            target: target.to_owned(),
            reason: ReportReason::Scam,
            details: "Fake giveaway".to_owned(),
        }
    }

    fn at(secs: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 6, 7, 8, secs).unwrap()
    }

    #[tokio::test]
    async fn test_submit_assigns_timestamp_id() {
        let store = ReportStore::in_memory();
        let report = store.submit_at(reporter(1), draft("@group_one"), at(9)).await.unwrap();

        assert_eq!(report.id, "20240506070809");
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_submit_same_second_gets_suffix() {
        let store = ReportStore::in_memory();
        let first = store.submit_at(reporter(1), draft("@a_group"), at(9)).await.unwrap();
        let second = store.submit_at(reporter(2), draft("@b_group"), at(9)).await.unwrap();
        let third = store.submit_at(reporter(3), draft("@c_group"), at(9)).await.unwrap();

        assert_eq!(first.id, "20240506070809");
        assert_eq!(second.id, "20240506070809-2");
        assert_eq!(third.id, "20240506070809-3");
    }

    #[tokio::test]
    async fn test_review_once() {
        let store = ReportStore::in_memory();
        let report = store.submit_at(reporter(1), draft("@group_one"), at(1)).await.unwrap();

        let reviewed = store.review(&report.id, ReportStatus::Resolved, 99).await.unwrap();
        assert_eq!(reviewed.status, ReportStatus::Resolved);
        assert_eq!(reviewed.reviewed_by, Some(99));

        let again = store.review(&report.id, ReportStatus::Rejected, 98).await;
        assert!(matches!(
            again,
            Err(StoreError::AlreadyReviewed { status: ReportStatus::Resolved, .. })
        ));
    }

    #[tokio::test]
    async fn test_review_unknown() {
        let store = ReportStore::in_memory();
        let result = store.review("nope", ReportStatus::Resolved, 1).await;
        assert!(matches!(result, Err(StoreError::NotFound(ref id)) if id == "nope"));
    }

    #[tokio::test]
    async fn test_recent_for_newest_first() {
        let store = ReportStore::in_memory();
        for secs in 0..7 {
            store
                .submit_at(reporter(1), draft(&format!("@target_{secs}")), at(secs))
                .await
                .unwrap();
        }
        store.submit_at(reporter(2), draft("@other_one"), at(30)).await.unwrap();

        let recent = store.recent_for(1, 5).await;
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].target, "@target_6");
        assert_eq!(recent[4].target, "@target_2");
        assert!(recent.iter().all(|r| r.reporter.id == 1));
    }

    #[tokio::test]
    async fn test_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.json");

        let store = ReportStore::open(&path).await.unwrap();
        assert!(store.is_empty().await);
        let report = store.submit_at(reporter(5), draft("@persisted"), at(1)).await.unwrap();
        store.review(&report.id, ReportStatus::Rejected, 7).await.unwrap();

        let reopened = ReportStore::open(&path).await.unwrap();
        let loaded = reopened.get(&report.id).await.unwrap();
        assert_eq!(loaded.target, "@persisted");
        assert_eq!(loaded.status, ReportStatus::Rejected);
        assert_eq!(loaded.reviewed_by, Some(7));
    }

    #[tokio::test]
    async fn test_open_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(ReportStore::open(&path).await, Err(StoreError::Parse(_))));
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the temp file makes the write fail
        let path = dir.path().join("reports.json");
        std::fs::create_dir(dir.path().join("reports.json.tmp")).unwrap();

        let store = ReportStore::open(&path).await.unwrap();
        let result = store.submit_at(reporter(1), draft("@group_one"), at(1)).await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.is_empty().await);
    }
}
