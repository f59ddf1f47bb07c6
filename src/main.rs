use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tokio::io::{BufReader, stdin, stdout};

use ghazal::settings::DEFAULT_SETTINGS_PATH;
use ghazal::{PoetryPipeline, SessionId, Settings, SqliteConversationStore, cli, logging, server};

#[derive(Parser)]
#[command(name = "ghazal", about = "Bilingual (Urdu + English) poetry assistant")]
struct Cli {
    /// Settings file; defaults are used when it does not exist.
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Chat in the terminal (default).
    Chat {
        /// Continue an earlier session instead of starting a new one.
        #[arg(long)]
        session: Option<String>,
    },
    /// Serve `POST /chat` over HTTP.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Write the effective settings to the settings file.
    InitSettings,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let settings = Settings::load_or_default(&args.settings)
        .wrap_err_with(|| format!("could not read {}", args.settings.display()))?;
    logging::init(&settings.log_dir, settings.log_level())?;
    log::info!("ghazal start: {}", chrono::Local::now());

    let command = args.command.unwrap_or(Command::Chat { session: None });
    if let Command::InitSettings = command {
        settings.save_to_file(&args.settings)?;
        println!("Settings written to {}", args.settings.display());
        return Ok(());
    }

    if !settings.validate_api_key().await {
        log::warn!("API key could not be validated, requests will likely fail");
    }

    let store = SqliteConversationStore::open(&settings.database_path).await?;
    let pipeline = PoetryPipeline::from_settings(&settings, Arc::new(store));

    match command {
        Command::Chat { session } => {
            let session = session.map(SessionId::new).unwrap_or_else(SessionId::random);
            log::info!("Chat session {session}");
            cli::run(&pipeline, &session, BufReader::new(stdin()), stdout()).await?;
        }
        Command::Serve { bind } => {
            let bind_addr = bind.unwrap_or_else(|| settings.bind_addr.clone());
            let state = Arc::new(server::ServerState {
                pipeline,
                default_session: SessionId::new("poetry_agent"),
            });
            server::serve(state, &bind_addr, &settings.allowed_origins).await?;
        }
        Command::InitSettings => {}
    }

    log::info!("ghazal exit: {}", chrono::Local::now());
    Ok(())
}
