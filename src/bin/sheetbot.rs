use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use color_eyre::Result;
use teloxide::prelude::*;
use tracing::info;

use sheetbot::config::Config;
use sheetbot::handlers::{self, AppContext};
use sheetbot::services::{SheetsClient, SheetsService};

/// Telegram front-end for a Google Sheets worksheet
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides embedded defaults)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let level = match args.logging {
        Some(LogLevel::Error) => Some(tracing::Level::ERROR),
        Some(LogLevel::Warn) => Some(tracing::Level::WARN),
        Some(LogLevel::Info) => Some(tracing::Level::INFO),
        Some(LogLevel::Debug) => Some(tracing::Level::DEBUG),
        Some(LogLevel::Trace) => Some(tracing::Level::TRACE),
        None => None,
    };
    sheetbot::logging::init_with(None, level)?;

    let config = Config::from_path(args.config.as_ref())?;
    info!(
        worksheet = config.worksheet_name,
        users = config.allowed_user_ids.len(),
        "starting"
    );

    // Header fetch doubles as a connectivity check; refuse to start blind.
    let client = SheetsClient::new(&config);
    let service = SheetsService::connect(client).await?;
    info!(columns = service.columns().len(), "worksheet reachable");

    let bot = Bot::new(config.bot_token.clone());
    let ctx = Arc::new(AppContext::new(&config, service));

    Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
