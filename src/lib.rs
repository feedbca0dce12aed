mod db;
mod settings;
pub mod tracker;
mod utils;

use std::{env, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

pub use db::{
    current_time_millis, validate_quality, Database, NightsSnapshot, NightsSubscription,
    SleepNight, MAX_QUALITY, MIN_QUALITY, UNRATED_QUALITY,
};
pub use settings::{SettingsStore, TrackerSettings, DEFAULT_DATABASE_FILE};
use tracker::{commands::HELP, Command, Shell, SleepTrackerViewModel};

/// Overrides the platform data directory.
pub const DATA_DIR_ENV: &str = "SLEEPTRACKER_DATA_DIR";

/// Everything the front-end needs, wired once at startup.
pub struct AppState {
    pub db: Database,
    pub tracker: SleepTrackerViewModel,
    pub settings: SettingsStore,
}

impl AppState {
    pub async fn open(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let db = Database::new(settings.database_path(&data_dir))?;
        let tracker = SleepTrackerViewModel::new(db.clone()).await?;

        Ok(Self {
            db,
            tracker,
            settings,
        })
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("sleeptracker"))
        .ok_or_else(|| anyhow!("could not determine a data directory; set {DATA_DIR_ENV}"))
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("Sleep tracker starting up...");

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async {
        let state = AppState::open(default_data_dir()?).await?;
        let mut shell = Shell::new(state);

        println!("{HELP}");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }

            match shell.handle(command).await {
                Ok(output) => output.iter().for_each(|line| println!("{line}")),
                Err(err) => log::error!("{command:?} failed: {err:#}"),
            }
        }

        shell.state().tracker.dispose();
        Ok::<(), anyhow::Error>(())
    })
}
