//! Pipeline metrics, recorded through the `metrics` facade.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "clipscene_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "clipscene_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "clipscene_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "clipscene_job_duration_seconds";

    pub const CLIPS_CREATED_TOTAL: &str = "clipscene_clips_created_total";
    pub const CLIPS_FAILED_TOTAL: &str = "clipscene_clips_failed_total";
}

pub fn record_job_submitted(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::JOBS_SUBMITTED_TOTAL, &labels).increment(1);
}

pub fn record_job_completed(kind: &str, duration_secs: f64) {
    let labels = [("kind", kind.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_job_failed(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_clip_created() {
    counter!(names::CLIPS_CREATED_TOTAL).increment(1);
}

pub fn record_clip_failed() {
    counter!(names::CLIPS_FAILED_TOTAL).increment(1);
}
