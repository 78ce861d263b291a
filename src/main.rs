//! Pulsar command line
//!
//! Scores segments and manages the effort leaderboards stored in the local
//! SQLite database.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pulsar::import::import_gpx_file;
use pulsar::leaderboards::export::{export_csv, export_json};
use pulsar::leaderboards::{Effort, LeaderboardService, UserId};
use pulsar::segments::{score_all, score_segment, Segment, SegmentId};
use pulsar::storage::config::{self, AppConfig};
use pulsar::storage::{Database, UserProfile};

#[derive(Parser)]
#[command(name = "pulsar")]
#[command(about = "Segment difficulty scoring and KOM leaderboards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to config.toml in the data directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score segments from a JSON file (one segment or an array) or a GPX track
    Score {
        file: PathBuf,
    },

    /// Import a GPX track as a segment and store it
    ImportGpx {
        file: PathBuf,

        /// Segment id
        #[arg(long)]
        id: i64,

        /// Segment name (defaults to the track name)
        #[arg(long)]
        name: Option<String>,

        /// Free-text category, e.g. "gravel"
        #[arg(long)]
        category: Option<String>,
    },

    /// Create or update a user profile
    AddUser {
        #[arg(long)]
        id: i64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        avatar: Option<String>,
    },

    /// Record an effort and print its rank
    AddEffort {
        #[arg(long)]
        segment: i64,

        #[arg(long)]
        user: i64,

        /// Elapsed time in seconds
        #[arg(long)]
        duration: u32,

        /// Start time (RFC 3339), defaults to now
        #[arg(long)]
        started_at: Option<String>,
    },

    /// Rank a duration against the stored efforts without recording it
    Rank {
        #[arg(long)]
        segment: i64,

        #[arg(long)]
        user: i64,

        #[arg(long)]
        duration: u32,
    },

    /// Print the legends board
    Legends {
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print a user's personal records
    Records {
        #[arg(long)]
        user: i64,
    },

    /// Print the best times on a segment
    Board {
        #[arg(long)]
        segment: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let data_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(config::get_data_dir);
            config::load_config_from(path, data_dir)?
        }
        None => config::load_config()?,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting Pulsar v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Score { file } => score_file(&file),
        Commands::ImportGpx {
            file,
            id,
            name,
            category,
        } => {
            let db = open_database(&config)?;
            let mut segment = import_gpx_file(&file, SegmentId(id), name)?;
            segment.category = category;
            db.upsert_segment(&segment)?;
            print_json(&score_segment(&segment))
        }
        Commands::AddUser { id, name, avatar } => {
            let db = open_database(&config)?;
            let mut profile = UserProfile::new(UserId(id), name);
            profile.avatar_url = avatar;
            db.upsert_user(&profile)?;
            print_json(&profile)
        }
        Commands::AddEffort {
            segment,
            user,
            duration,
            started_at,
        } => {
            if duration == 0 {
                bail!("duration must be positive");
            }
            let started_at = match started_at {
                Some(s) => DateTime::parse_from_rfc3339(&s)
                    .with_context(|| format!("invalid start time: {}", s))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let service = leaderboard_service(&config)?;
            let effort = Effort::new(SegmentId(segment), UserId(user), duration, started_at);
            print_json(&service.record_effort(&effort)?)
        }
        Commands::Rank {
            segment,
            user,
            duration,
        } => {
            let service = leaderboard_service(&config)?;
            print_json(&service.rank_effort(SegmentId(segment), UserId(user), duration)?)
        }
        Commands::Legends { format } => {
            let service = leaderboard_service(&config)?;
            let legends = service.legends()?;
            match format {
                OutputFormat::Json => println!("{}", export_json(&legends)?),
                OutputFormat::Csv => print!("{}", export_csv(&legends)),
            }
            Ok(())
        }
        Commands::Records { user } => {
            let service = leaderboard_service(&config)?;
            print_json(&service.personal_records(UserId(user))?)
        }
        Commands::Board { segment } => {
            let service = leaderboard_service(&config)?;
            print_json(&service.segment_leaderboard(SegmentId(segment))?)
        }
    }
}

fn open_database(config: &AppConfig) -> Result<Database> {
    let path = config.database_path();
    Database::open(&path).with_context(|| format!("opening database {}", path.display()))
}

fn leaderboard_service(config: &AppConfig) -> Result<LeaderboardService> {
    let db = Arc::new(open_database(config)?);
    Ok(LeaderboardService::new(db, config.leaderboard))
}

fn score_file(path: &Path) -> Result<()> {
    let is_gpx = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gpx"))
        .unwrap_or(false);

    if is_gpx {
        let segment = import_gpx_file(path, SegmentId(0), None)?;
        return print_json(&score_segment(&segment));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)?;

    if value.is_array() {
        let segments: Vec<Segment> = serde_json::from_value(value)?;
        print_json(&score_all(&segments))
    } else {
        let segment: Segment = serde_json::from_value(value)?;
        print_json(&score_segment(&segment))
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
