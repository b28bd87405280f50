use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Lifecycle states of a study. Stored as TEXT in Postgres.
///
/// `Canceled` is only ever set by the study-post cancellation flow, never
/// by the lifecycle tick. `Completed` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyStatus {
    Pending,
    InProgress,
    Completed,
    Canceled,
}

impl StudyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudyStatus::Pending => "PENDING",
            StudyStatus::InProgress => "IN_PROGRESS",
            StudyStatus::Completed => "COMPLETED",
            StudyStatus::Canceled => "CANCELED",
        }
    }

    pub fn parse(value: &str) -> Option<StudyStatus> {
        match value {
            "PENDING" => Some(StudyStatus::Pending),
            "IN_PROGRESS" => Some(StudyStatus::InProgress),
            "COMPLETED" => Some(StudyStatus::Completed),
            "CANCELED" => Some(StudyStatus::Canceled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Study {
    pub id: i64,
    pub name: String,
    pub status: StudyStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_participants: i32,
}

/// One completed video session. Immutable after insert; references its
/// study by numeric id only, not by a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyTimeline {
    pub id: i64,
    pub study_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Accumulated study seconds, one row per study, keyed by the study id.
/// Monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalStudyTime {
    pub study_id: i64,
    pub total_seconds: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankEntry {
    pub rank: usize,
    pub study_id: i64,
    pub study_name: String,
    pub total_seconds: i64,
    pub formatted: String,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub study_id: i64,
    pub study_name: String,
    pub entries: Vec<StudyTimeline>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalView {
    pub study_id: i64,
    pub study_name: String,
    pub total_seconds: i64,
    pub formatted: String,
}
