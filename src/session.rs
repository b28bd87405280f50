use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::db;
use crate::error::Error;
use crate::models::StudyTimeline;

/// Records one completed video session: credits the study's running total
/// and inserts the immutable timeline entry, in a single transaction so a
/// crash between the two cannot leave a credited duration without its
/// timeline row or vice versa.
///
/// The total row must already exist; studies get a zero row at creation.
pub async fn record_session(
    pool: &PgPool,
    study_id: i64,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> Result<StudyTimeline, Error> {
    let seconds = session_seconds(started_at, ended_at)?;

    let mut tx = pool.begin().await?;
    let affected = db::add_study_seconds(&mut tx, study_id, seconds).await?;
    if affected == 0 {
        return Err(Error::TotalNotFound(study_id));
    }
    let entry = db::insert_timeline(&mut tx, study_id, started_at, ended_at).await?;
    tx.commit().await?;

    tracing::debug!(study_id, seconds, "session recorded");
    Ok(entry)
}

/// Whole seconds between the two timestamps, truncating any sub-second
/// remainder. Rejects ranges that end before they start.
pub fn session_seconds(
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> Result<i64, Error> {
    if ended_at < started_at {
        return Err(Error::InvalidTimeRange {
            started_at,
            ended_at,
        });
    }

    Ok((ended_at - started_at).num_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
    }

    #[test]
    fn half_hour_session_is_1800_seconds() {
        assert_eq!(session_seconds(at(10, 0, 0), at(10, 30, 0)).unwrap(), 1800);
    }

    #[test]
    fn zero_length_session_is_allowed() {
        assert_eq!(session_seconds(at(10, 0, 0), at(10, 0, 0)).unwrap(), 0);
    }

    #[test]
    fn sub_second_remainder_truncates() {
        let started = at(10, 0, 0);
        let ended = at(10, 0, 1) + chrono::Duration::milliseconds(900);
        assert_eq!(session_seconds(started, ended).unwrap(), 1);
    }

    #[test]
    fn backwards_range_is_rejected() {
        let err = session_seconds(at(10, 30, 0), at(10, 0, 0)).unwrap_err();
        assert!(matches!(err, Error::InvalidTimeRange { .. }));
    }
}
