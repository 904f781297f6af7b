use serde::{Deserialize, Serialize};

/// Knowledge-base ingestion job status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Starting,
    InProgress,
    Complete,
    Failed,
    Stopping,
    Stopped,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_running(self) -> bool {
        matches!(self, JobStatus::Starting | JobStatus::InProgress | JobStatus::Stopping)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed | JobStatus::Stopped)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::InProgress => "in progress",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
            JobStatus::Stopping => "stopping",
            JobStatus::Stopped => "stopped",
            JobStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobStatistics {
    #[serde(default)]
    pub documents_scanned: u64,
    #[serde(default)]
    pub documents_indexed: u64,
    #[serde(default)]
    pub documents_failed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestJob {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub statistics: JobStatistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_job_record() {
        let job: IngestJob = serde_json::from_str(
            r#"{"job_id":"J1","status":"IN_PROGRESS","started_at":"2024-01-01T00:00:00Z",
                "statistics":{"documents_scanned":12,"documents_indexed":9}}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        assert!(job.status.is_running());
        assert_eq!(job.statistics.documents_indexed, 9);
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let job: IngestJob = serde_json::from_str(r#"{"job_id":"J2","status":"PAUSED"}"#).unwrap();
        assert_eq!(job.status, JobStatus::Unknown);
        assert!(!job.status.is_running());
        assert!(!job.status.is_terminal());
    }
}
