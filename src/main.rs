use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod db;
mod error;
mod lifecycle;
mod models;
mod ranking;
mod session;

use error::Error;
use models::{TimelineView, TotalView};

#[derive(Parser)]
#[command(name = "study-time-tracker")]
#[command(about = "Study lifecycle and accumulated study-time tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Advance due study statuses (the scheduler's periodic trigger)
    Tick {
        /// Reference time, defaults to now (RFC 3339 or naive UTC)
        #[arg(long, value_parser = parse_utc)]
        now: Option<DateTime<Utc>>,
    },
    /// Record a completed video session for a study
    Record {
        #[arg(long)]
        study_id: i64,
        #[arg(long, value_parser = parse_utc)]
        started_at: DateTime<Utc>,
        #[arg(long, value_parser = parse_utc)]
        ended_at: DateTime<Utc>,
    },
    /// Show the session timeline for a study
    Timeline {
        #[arg(long)]
        study_id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Show the accumulated study time for a study
    Total {
        #[arg(long)]
        study_id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Show the top studies by accumulated study time
    Ranking {
        #[arg(long, default_value_t = 10)]
        limit: i64,
        #[arg(long)]
        json: bool,
    },
}

fn parse_utc(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| value.parse::<NaiveDateTime>().map(|naive| naive.and_utc()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Tick { now } => {
            let now = now.unwrap_or_else(Utc::now);
            let report = lifecycle::update_study_statuses(&pool, now).await?;
            println!(
                "Started {} studies, completed {} studies.",
                report.started, report.completed
            );
        }
        Commands::Record {
            study_id,
            started_at,
            ended_at,
        } => {
            let entry = session::record_session(&pool, study_id, started_at, ended_at).await?;
            let seconds = session::session_seconds(entry.started_at, entry.ended_at)?;
            println!(
                "Recorded session {} for study {}: {} credited.",
                entry.id,
                study_id,
                ranking::format_duration(seconds)
            );
        }
        Commands::Timeline { study_id, json } => {
            let view = timeline_view(&pool, study_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("Timeline for {}:", view.study_name);
                if view.entries.is_empty() {
                    println!("No sessions recorded yet.");
                }
                for entry in &view.entries {
                    println!("- {} → {}", entry.started_at, entry.ended_at);
                }
            }
        }
        Commands::Total { study_id, json } => {
            let view = total_view(&pool, study_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}: {}", view.study_name, view.formatted);
            }
        }
        Commands::Ranking { limit, json } => {
            let entries = ranking::get_ranking(&pool, limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No studies ranked yet.");
            } else {
                println!("Top studies by accumulated study time:");
                for entry in &entries {
                    println!(
                        "{}. {} — {} ({:.1}%)",
                        entry.rank, entry.study_name, entry.formatted, entry.percent
                    );
                }
            }
        }
    }

    Ok(())
}

async fn timeline_view(pool: &PgPool, study_id: i64) -> Result<TimelineView, Error> {
    let study = db::fetch_study(pool, study_id)
        .await?
        .ok_or(Error::StudyNotFound(study_id))?;
    let entries = db::fetch_timelines(pool, study_id).await?;

    Ok(TimelineView {
        study_id,
        study_name: study.name,
        entries,
    })
}

async fn total_view(pool: &PgPool, study_id: i64) -> Result<TotalView, Error> {
    let study = db::fetch_study(pool, study_id)
        .await?
        .ok_or(Error::StudyNotFound(study_id))?;
    let total = db::fetch_total(pool, study_id)
        .await?
        .ok_or(Error::TotalNotFound(study_id))?;

    Ok(TotalView {
        study_id,
        study_name: study.name,
        total_seconds: total.total_seconds,
        formatted: ranking::format_duration(total.total_seconds),
    })
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info")))
        .compact()
        .init();
}
