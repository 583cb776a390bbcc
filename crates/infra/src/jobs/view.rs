//! Read-side projections handed to polling clients.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::progress::estimate_progress;
use super::types::{Job, JobId, JobKind, JobStatus};

/// Returned synchronously from submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHandle {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}

impl JobHandle {
    pub fn from_job(job: &Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            progress: 0,
            created_at: job.created_at,
        }
    }
}

/// Status of a job as seen by a polling client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobView {
    /// Project a stored job at `now`. Pure.
    pub fn project(job: &Job, now: DateTime<Utc>) -> Self {
        let result = job.result();
        Self {
            id: job.id,
            kind: job.kind,
            status: job.status,
            progress: estimate_progress(job, now),
            result_url: result.map(|r| r.result_url.clone()),
            caption: result.and_then(|r| r.caption.clone()),
            error: job.error().map(str::to_owned),
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}
