//! LAYOFFS MARKET: office pool where coins ride on who gets cut.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the database and either serves the HTTP API or runs one of the
//! catalog maintenance commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use layoffs_market::config::AppConfig;
use layoffs_market::seed::{self, CandidateImport, RemainingHeadcount};
use layoffs_market::storage::Store;
use layoffs_market::uploads::DiskPhotoStore;
use layoffs_market::web::{self, WebState};

const BANNER: &str = r#"
 _                      __  __
| |    __ _ _   _  ___ / _|/ _|___
| |   / _` | | | |/ _ \ |_| |_/ __|
| |__| (_| | |_| | (_) |  _|  _\__ \
|_____\__,_|\__, |\___/|_| |_| |___/
            |___/        M A R K E T
"#;

/// Layoffs Market - bet play money on who gets cut.
#[derive(Parser, Debug)]
#[command(name = "layoffs-market")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,

    /// Load the built-in department catalog into an empty database
    Seed,

    /// Import candidates from a JSON list of {name, scores}
    ImportCandidates {
        /// JSON file with the team members to import
        #[arg(short, long)]
        file: PathBuf,

        /// Position for new candidates (default: first developer position)
        #[arg(long)]
        position_id: Option<i64>,
    },

    /// Set planned cuts from a JSON map of remaining headcounts
    UpdateCuts {
        /// JSON file: department -> position title -> headcount after
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let config_path = cli.config.to_string_lossy().into_owned();
    let cfg = AppConfig::load(&config_path)?;

    let store = Store::connect(&cfg.database.url, cfg.database.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", cfg.database.url))?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(cfg, store).await,
        Command::Seed => {
            let report = seed::seed_catalog(&store).await?;
            if report.departments == 0 {
                println!("Catalog already present, nothing to do.");
            } else {
                println!(
                    "Seeded {} departments, {} positions, {} employees.",
                    report.departments, report.positions, report.employees
                );
            }
            Ok(())
        }
        Command::ImportCandidates { file, position_id } => {
            let members: Vec<CandidateImport> = read_json(&file)?;
            let report = seed::import_candidates(&store, &members, position_id).await?;
            println!(
                "Added {} candidates, updated {} (position {}).",
                report.added, report.updated, report.position_id
            );
            Ok(())
        }
        Command::UpdateCuts { file } => {
            let remaining: RemainingHeadcount = read_json(&file)?;
            let report = seed::apply_remaining_headcount(&store, &remaining).await?;
            println!(
                "{:<25} {:<40} {:>6} {:>6} {:>5}",
                "Department", "Position", "Before", "After", "Cut"
            );
            for line in &report.lines {
                println!(
                    "{:<25} {:<40} {:>6} {:>6} {:>5}",
                    line.department, line.title, line.before, line.after, line.cuts
                );
            }
            println!(
                "Total before: {}  after: {}  cuts: {}",
                report.total_before, report.total_after, report.total_cuts
            );
            Ok(())
        }
    }
}

async fn run_server(cfg: AppConfig, store: Store) -> Result<()> {
    println!("{BANNER}");

    if cfg.game.seed_on_startup {
        seed::seed_catalog(&store).await?;
    }

    tokio::fs::create_dir_all(&cfg.uploads.dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", cfg.uploads.dir))?;

    let summary = store.catalog_summary().await?;
    info!(
        departments = summary.departments,
        candidates = summary.candidates,
        users = summary.users,
        open_to_cut = summary.total_to_cut,
        "Layoffs market starting up"
    );

    let photos = Arc::new(DiskPhotoStore::new(&cfg.uploads.dir));
    let state = Arc::new(WebState::new(
        store,
        photos,
        cfg.admin_token(),
        &cfg.uploads,
        &cfg.game,
    ));

    web::serve(state, &cfg.bind_addr()).await
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Initialise the tracing subscriber. JSON output when `LAYOFFS_LOG_JSON`
/// is set, human-readable otherwise.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("layoffs_market=info,tower_http=info"));

    let json_logging = std::env::var("LAYOFFS_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
