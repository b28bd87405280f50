use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use crate::models::{Study, StudyStatus, StudyTimeline, TotalStudyTime};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let studies = vec![
        (
            "Rust 스터디",
            StudyStatus::Pending,
            NaiveDate::from_ymd_opt(2026, 9, 1),
            NaiveDate::from_ymd_opt(2026, 10, 31),
        ),
        (
            "알고리즘 스터디",
            StudyStatus::Pending,
            NaiveDate::from_ymd_opt(2026, 8, 24),
            NaiveDate::from_ymd_opt(2026, 9, 30),
        ),
        (
            "CS 면접 스터디",
            StudyStatus::Pending,
            NaiveDate::from_ymd_opt(2026, 8, 10),
            NaiveDate::from_ymd_opt(2026, 8, 28),
        ),
    ];

    for (name, status, start_date, end_date) in studies {
        let start_date = start_date.ok_or_else(|| anyhow::anyhow!("invalid seed date"))?;
        let end_date = end_date.ok_or_else(|| anyhow::anyhow!("invalid seed date"))?;

        let study_id: i64 = sqlx::query(
            r#"
            INSERT INTO study_time.studies
            (name, status, start_date, end_date, start_time, end_time, total_participants)
            VALUES ($1, $2, $3, $4, '20:00', '22:00', 4)
            ON CONFLICT (name) DO UPDATE
            SET start_date = EXCLUDED.start_date, end_date = EXCLUDED.end_date
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(status.as_str())
        .bind(start_date)
        .bind(end_date)
        .fetch_one(pool)
        .await?
        .get("id");

        // Zero-total row initialized at study creation, before any session.
        sqlx::query(
            r#"
            INSERT INTO study_time.total_study_times (study_id, total_seconds)
            VALUES ($1, 0)
            ON CONFLICT (study_id) DO NOTHING
            "#,
        )
        .bind(study_id)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_study(pool: &PgPool, id: i64) -> Result<Option<Study>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, name, status, start_date, end_date, start_time, end_time, \
         total_participants FROM study_time.studies WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| study_from_row(&row)).transpose()
}

/// Which date column a status query filters on.
#[derive(Debug, Clone, Copy)]
pub enum DateColumn {
    StartDate,
    EndDate,
}

/// Studies in `status` whose start or end date has arrived (column `<=`
/// cutoff). Ordered by id so bulk updates are deterministic.
pub async fn fetch_studies_due(
    pool: &PgPool,
    status: StudyStatus,
    column: DateColumn,
    cutoff: NaiveDate,
) -> Result<Vec<Study>, sqlx::Error> {
    let query = match column {
        DateColumn::StartDate => {
            "SELECT id, name, status, start_date, end_date, start_time, end_time, \
             total_participants FROM study_time.studies \
             WHERE status = $1 AND start_date <= $2 ORDER BY id"
        }
        DateColumn::EndDate => {
            "SELECT id, name, status, start_date, end_date, start_time, end_time, \
             total_participants FROM study_time.studies \
             WHERE status = $1 AND end_date <= $2 ORDER BY id"
        }
    };

    let rows = sqlx::query(query)
        .bind(status.as_str())
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

    rows.iter().map(study_from_row).collect()
}

pub async fn save_study_statuses(pool: &PgPool, studies: &[Study]) -> Result<(), sqlx::Error> {
    for study in studies {
        sqlx::query("UPDATE study_time.studies SET status = $1 WHERE id = $2")
            .bind(study.status.as_str())
            .bind(study.id)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Top `limit` totals, largest first; ties broken by study id ascending.
pub async fn fetch_top_totals(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<TotalStudyTime>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT study_id, total_seconds FROM study_time.total_study_times \
         ORDER BY total_seconds DESC, study_id ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| TotalStudyTime {
            study_id: row.get("study_id"),
            total_seconds: row.get("total_seconds"),
        })
        .collect())
}

pub async fn fetch_total(
    pool: &PgPool,
    study_id: i64,
) -> Result<Option<TotalStudyTime>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT study_id, total_seconds FROM study_time.total_study_times WHERE study_id = $1",
    )
    .bind(study_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| TotalStudyTime {
        study_id: row.get("study_id"),
        total_seconds: row.get("total_seconds"),
    }))
}

/// Atomic in-database increment so concurrent sessions for the same study
/// never lose an update. Returns the number of rows touched; zero means
/// the study has no total row.
pub async fn add_study_seconds(
    conn: &mut PgConnection,
    study_id: i64,
    seconds: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE study_time.total_study_times \
         SET total_seconds = total_seconds + $1 WHERE study_id = $2",
    )
    .bind(seconds)
    .bind(study_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn insert_timeline(
    conn: &mut PgConnection,
    study_id: i64,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> Result<StudyTimeline, sqlx::Error> {
    let id: i64 = sqlx::query(
        "INSERT INTO study_time.study_timelines (study_id, started_at, ended_at) \
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(study_id)
    .bind(started_at)
    .bind(ended_at)
    .fetch_one(&mut *conn)
    .await?
    .get("id");

    Ok(StudyTimeline {
        id,
        study_id,
        started_at,
        ended_at,
    })
}

pub async fn fetch_timelines(
    pool: &PgPool,
    study_id: i64,
) -> Result<Vec<StudyTimeline>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, study_id, started_at, ended_at FROM study_time.study_timelines \
         WHERE study_id = $1 ORDER BY started_at, id",
    )
    .bind(study_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| StudyTimeline {
            id: row.get("id"),
            study_id: row.get("study_id"),
            started_at: row.get("started_at"),
            ended_at: row.get("ended_at"),
        })
        .collect())
}

fn study_from_row(row: &PgRow) -> Result<Study, sqlx::Error> {
    let status: String = row.get("status");
    let status = StudyStatus::parse(&status)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown study status {status}").into()))?;

    Ok(Study {
        id: row.get("id"),
        name: row.get("name"),
        status,
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        total_participants: row.get("total_participants"),
    })
}
