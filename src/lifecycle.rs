use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::db::{self, DateColumn};
use crate::models::{Study, StudyStatus};

#[derive(Debug, Default, Clone, Copy)]
pub struct LifecycleReport {
    pub started: usize,
    pub completed: usize,
}

/// Advances every due study by at most one status step. Dates are compared
/// at day granularity, so `now` only contributes its calendar date.
///
/// Idempotent: the status predicates exclude rows already transitioned, so
/// overlapping ticks produce duplicate no-op writes at worst.
pub async fn update_study_statuses(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<LifecycleReport, sqlx::Error> {
    let today = now.date_naive();

    let mut due_start =
        db::fetch_studies_due(pool, StudyStatus::Pending, DateColumn::StartDate, today).await?;
    for study in due_start.iter_mut() {
        advance(study, today);
    }
    db::save_study_statuses(pool, &due_start).await?;

    let mut due_end =
        db::fetch_studies_due(pool, StudyStatus::InProgress, DateColumn::EndDate, today).await?;
    for study in due_end.iter_mut() {
        advance(study, today);
    }
    db::save_study_statuses(pool, &due_end).await?;

    let report = LifecycleReport {
        started: due_start.len(),
        completed: due_end.len(),
    };
    tracing::info!(
        started = report.started,
        completed = report.completed,
        %today,
        "study statuses updated"
    );

    Ok(report)
}

/// Applies a single forward transition if its date guard holds. Returns
/// whether the study changed. Completed and canceled studies never move.
pub fn advance(study: &mut Study, today: NaiveDate) -> bool {
    match study.status {
        StudyStatus::Pending if study.start_date <= today => {
            study.status = StudyStatus::InProgress;
            true
        }
        StudyStatus::InProgress if study.end_date <= today => {
            study.status = StudyStatus::Completed;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn study(status: StudyStatus, start: NaiveDate, end: NaiveDate) -> Study {
        Study {
            id: 1,
            name: "Rust 스터디".to_string(),
            status,
            start_date: start,
            end_date: end,
            start_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            total_participants: 4,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pending_starts_once_start_date_arrives() {
        let today = date(2026, 9, 1);
        let mut due = study(StudyStatus::Pending, date(2026, 9, 1), date(2026, 10, 1));
        assert!(advance(&mut due, today));
        assert_eq!(due.status, StudyStatus::InProgress);

        let mut future = study(StudyStatus::Pending, date(2026, 9, 2), date(2026, 10, 1));
        assert!(!advance(&mut future, today));
        assert_eq!(future.status, StudyStatus::Pending);
    }

    #[test]
    fn in_progress_completes_once_end_date_arrives() {
        let today = date(2026, 10, 1);
        let mut due = study(StudyStatus::InProgress, date(2026, 9, 1), date(2026, 10, 1));
        assert!(advance(&mut due, today));
        assert_eq!(due.status, StudyStatus::Completed);

        let mut running = study(StudyStatus::InProgress, date(2026, 9, 1), date(2026, 10, 2));
        assert!(!advance(&mut running, today));
        assert_eq!(running.status, StudyStatus::InProgress);
    }

    #[test]
    fn advance_moves_one_step_per_tick() {
        // Both dates already passed: one tick starts it, the next completes it.
        let today = date(2026, 11, 1);
        let mut study = study(StudyStatus::Pending, date(2026, 9, 1), date(2026, 10, 1));

        assert!(advance(&mut study, today));
        assert_eq!(study.status, StudyStatus::InProgress);
        assert!(advance(&mut study, today));
        assert_eq!(study.status, StudyStatus::Completed);
    }

    #[test]
    fn completed_is_terminal_and_repeat_ticks_are_noops() {
        let today = date(2026, 11, 1);
        let mut done = study(StudyStatus::Completed, date(2026, 9, 1), date(2026, 10, 1));

        assert!(!advance(&mut done, today));
        assert!(!advance(&mut done, today));
        assert_eq!(done.status, StudyStatus::Completed);
    }

    #[test]
    fn canceled_never_advances() {
        let today = date(2026, 11, 1);
        let mut canceled = study(StudyStatus::Canceled, date(2026, 9, 1), date(2026, 10, 1));

        assert!(!advance(&mut canceled, today));
        assert_eq!(canceled.status, StudyStatus::Canceled);
    }
}
