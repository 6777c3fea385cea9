#![forbid(unsafe_code)]

mod config;
mod entry;
mod handlers;
mod support;
mod telemetry;

pub(crate) use support::*;

use clap::Parser;
use config::BoardConfig;
use kb_storage::SqliteStore;
use kb_sync::SyncSession;
use std::path::PathBuf;
use time::UtcOffset;

const SERVER_NAME: &str = "kitchen-board";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(
    name = "kb_board",
    version,
    about = "Kitchen procurement board: newline-delimited JSON commands on stdin, responses on stdout"
)]
struct Cli {
    /// YAML config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Board database directory (overrides config and KB_STORAGE_DIR).
    #[arg(long, value_name = "DIR")]
    storage_dir: Option<PathBuf>,

    /// Nickname recorded on history entries (overrides config and KB_ACTOR).
    #[arg(long, value_name = "NAME")]
    actor: Option<String>,
}

pub(crate) struct Board {
    session: SyncSession<SqliteStore>,
    config: BoardConfig,
    offset: UtcOffset,
}

impl Board {
    fn new(session: SyncSession<SqliteStore>, config: BoardConfig, offset: UtcOffset) -> Self {
        Self {
            session,
            config,
            offset,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    telemetry::init();

    let (mut config, problems) = BoardConfig::load(cli.config.as_deref());
    for problem in &problems {
        tracing::warn!(error = %problem, "config problem; continuing with defaults");
    }
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(actor) = cli.actor.filter(|a| !a.trim().is_empty()) {
        config.actor = actor.trim().to_string();
    }
    // Resolved before any other thread exists; the local offset lookup
    // refuses to run otherwise on some platforms.
    let offset = config.utc_offset();

    tracing::info!(
        name = SERVER_NAME,
        version = SERVER_VERSION,
        storage_dir = %config.storage_dir.display(),
        actor = %config.actor,
        utc_offset = %offset,
        "starting"
    );
    let session =
        SyncSession::open_sqlite(&config.storage_dir, config.sync_settings(), config.actor.clone())?;
    let mut board = Board::new(session, config, offset);
    entry::run_stdio(&mut board)
}
