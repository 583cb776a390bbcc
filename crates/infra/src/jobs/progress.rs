//! Display-only progress estimate for polled jobs.

use chrono::{DateTime, Utc};

use super::types::{Job, JobStatus};

/// Lowest percentage shown for a job that is processing.
pub const PROCESSING_FLOOR: u8 = 5;
/// Highest percentage shown before the job actually completes.
pub const PROCESSING_CEILING: u8 = 95;

/// Estimate completion percentage of `job` at `now`.
///
/// Never used for control decisions. Processing jobs advance linearly over
/// the kind's expected duration, clamped to `[5, 95]`.
pub fn estimate_progress(job: &Job, now: DateTime<Utc>) -> u8 {
    match job.status {
        JobStatus::Completed => 100,
        JobStatus::Pending | JobStatus::Failed => 0,
        JobStatus::Processing => {
            let Some(started_at) = job.started_at else {
                return PROCESSING_FLOOR;
            };
            let elapsed_ms = (now - started_at).num_milliseconds().max(0) as f64;
            let expected_ms = job.kind.expected_duration().as_millis().max(1) as f64;
            let pct = (elapsed_ms / expected_ms * 100.0).round();
            pct.clamp(PROCESSING_FLOOR as f64, PROCESSING_CEILING as f64) as u8
        }
    }
}
