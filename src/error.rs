use chrono::{DateTime, Utc};
use thiserror::Error;

/// Client-visible failures of the study-time core. Storage failures pass
/// through unchanged; nothing here is retried or recovered locally.
#[derive(Debug, Error)]
pub enum Error {
    #[error("study {0} not found")]
    StudyNotFound(i64),

    #[error("no total study time row for study {0}")]
    TotalNotFound(i64),

    #[error("session ended at {ended_at} before it started at {started_at}")]
    InvalidTimeRange {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
