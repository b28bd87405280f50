use sqlx::PgPool;

use crate::db;
use crate::error::Error;
use crate::models::{RankEntry, TotalStudyTime};

/// Top `limit` studies by accumulated seconds, with resolved names,
/// formatted durations, and percent of the leader's total.
///
/// Fails outright if any ranked study row is missing: a deleted study
/// whose total row survives breaks the whole leaderboard rather than
/// producing partial results.
pub async fn get_ranking(pool: &PgPool, limit: i64) -> Result<Vec<RankEntry>, Error> {
    let totals = db::fetch_top_totals(pool, limit).await?;

    let mut named = Vec::with_capacity(totals.len());
    for total in totals {
        let study = db::fetch_study(pool, total.study_id)
            .await?
            .ok_or(Error::StudyNotFound(total.study_id))?;
        named.push((total, study.name));
    }

    Ok(build_ranking(named))
}

pub fn build_ranking(rows: Vec<(TotalStudyTime, String)>) -> Vec<RankEntry> {
    let leader_total = rows
        .first()
        .map(|(total, _)| total.total_seconds)
        .unwrap_or(0);

    rows.into_iter()
        .enumerate()
        .map(|(index, (total, study_name))| RankEntry {
            rank: index + 1,
            study_id: total.study_id,
            study_name,
            total_seconds: total.total_seconds,
            formatted: format_duration(total.total_seconds),
            percent: percent_of_leader(total.total_seconds, leader_total),
        })
        .collect()
}

pub fn percent_of_leader(total_seconds: i64, leader_seconds: i64) -> f64 {
    if leader_seconds == 0 {
        return 0.0;
    }
    total_seconds as f64 / leader_seconds as f64 * 100.0
}

/// Decomposes seconds with fixed divisors (360-day years, 30-day months),
/// not calendar arithmetic. Non-zero leading units are emitted, the
/// seconds unit always is, so zero renders as "0초".
pub fn format_duration(total_seconds: i64) -> String {
    const UNITS: [(i64, &str); 5] = [
        (31_104_000, "년"),
        (2_592_000, "달"),
        (86_400, "일"),
        (3_600, "시간"),
        (60, "분"),
    ];

    let mut remaining = total_seconds.max(0);
    let mut parts = Vec::new();

    for (divisor, label) in UNITS {
        let count = remaining / divisor;
        remaining %= divisor;
        if count > 0 {
            parts.push(format!("{count}{label}"));
        }
    }
    parts.push(format!("{remaining}초"));

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(study_id: i64, total_seconds: i64) -> TotalStudyTime {
        TotalStudyTime {
            study_id,
            total_seconds,
        }
    }

    #[test]
    fn formats_hour_minute_second() {
        assert_eq!(format_duration(3661), "1시간 1분 1초");
    }

    #[test]
    fn zero_renders_as_zero_seconds() {
        assert_eq!(format_duration(0), "0초");
    }

    #[test]
    fn whole_units_keep_trailing_seconds() {
        assert_eq!(format_duration(3600), "1시간 0초");
        assert_eq!(format_duration(60), "1분 0초");
    }

    #[test]
    fn large_totals_use_fixed_divisors() {
        // 1 fixed year + 1 fixed month + 1 day + 1 second
        let seconds = 31_104_000 + 2_592_000 + 86_400 + 1;
        assert_eq!(format_duration(seconds), "1년 1달 1일 1초");
    }

    #[test]
    fn ranking_preserves_order_and_assigns_ranks() {
        let entries = build_ranking(vec![
            (total(3, 7200), "알고리즘 스터디".to_string()),
            (total(1, 3600), "Rust 스터디".to_string()),
            (total(2, 0), "CS 면접 스터디".to_string()),
        ]);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].study_id, 3);
        assert_eq!(entries[2].rank, 3);
        assert!(entries
            .windows(2)
            .all(|pair| pair[0].total_seconds >= pair[1].total_seconds));
    }

    #[test]
    fn percent_is_relative_to_leader() {
        let entries = build_ranking(vec![
            (total(1, 7200), "Rust 스터디".to_string()),
            (total(2, 3600), "알고리즘 스터디".to_string()),
            (total(3, 0), "CS 면접 스터디".to_string()),
        ]);

        assert_eq!(entries[0].percent, 100.0);
        assert_eq!(entries[1].percent, 50.0);
        assert_eq!(entries[2].percent, 0.0);
    }

    #[test]
    fn all_zero_leaderboard_does_not_divide_by_zero() {
        let entries = build_ranking(vec![(total(1, 0), "Rust 스터디".to_string())]);
        assert_eq!(entries[0].percent, 0.0);
        assert_eq!(entries[0].formatted, "0초");
    }

    #[test]
    fn empty_ranking_is_empty() {
        assert!(build_ranking(Vec::new()).is_empty());
    }
}
