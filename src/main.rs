use anyhow::{Context, Result};
use clap::Parser;
use shelf::{cli, config, logging, store};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shelf", about = "User accounts for the library desk")]
pub struct Args {
    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "SHELF_DATA_FILE",
        help = "User data file (overrides config)"
    )]
    pub data_file: Option<PathBuf>,

    #[arg(short, long, help = "Debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<cli::Command>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => config::Config::load_from(path)?,
        None => config::Config::load()?,
    };

    if let Some(data_file) = &args.data_file {
        cfg.store.data_file = data_file.clone();
    }

    if let Err(errors) = cfg.validate() {
        for e in &errors {
            eprintln!("Config error {}", e);
        }
        return Err(anyhow::anyhow!("invalid configuration"));
    }

    logging::init(&cfg.logging, args.verbose)?;
    tracing::debug!("Using data file {}", cfg.store.data_file.display());

    // Fail instead of starting empty so a damaged file is never overwritten.
    let store = store::UserStore::try_open(&cfg.store.data_file)
        .with_context(|| format!("loading users from {}", cfg.store.data_file.display()))?;
    let mut session = cli::Session::new(store);

    match args.command {
        Some(command) => cli::run_once(&mut session, command),
        None => cli::run_repl(session),
    }
}
