use clap::Parser;
use finsheet_sync::args::{Args, Command};
use finsheet_sync::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let config = Config::load(args.common().finsheet_home().path()).await?;

    // This allows for running the program without a spreadsheet backend. When
    // FINSHEET_IN_TEST_MODE is set and non-empty, the mode will be Mode::Test, otherwise it will be
    // Mode::Remote.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Connect(connect_args) => commands::connect(&config, connect_args.link())
            .await?
            .print(),

        Command::Session => commands::show_session(&config).await?.print(),

        Command::Summary(link_args) => commands::summary(config, link_args.link(), mode)
            .await?
            .print(),

        Command::Add(add_args) => commands::add(config, *add_args.clone(), mode)
            .await?
            .print(),

        Command::Watch(link_args) => commands::watch(config, link_args.link(), mode)
            .await?
            .print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for the library and the binary only.
            EnvFilter::new(format!(
                "finsheet_sync={},{}={}",
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
