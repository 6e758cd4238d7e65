//! imdoi - find the DOI of a publisher page from the command line

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{CliError, Context};

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let ctx = Context::load(cli.config.as_deref(), cli.json)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Resolve {
            url,
            file,
            explain,
            source,
        } => {
            let markup = commands::read_markup(file.as_deref())?;
            let found =
                commands::resolve(&ctx, &mut out, &url, markup, explain, source.as_deref())?;
            if !found {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Normalize { input } => commands::normalize(&ctx, &mut out, &input)?,
        Commands::Link { input, source, all } => {
            commands::link(&ctx, &mut out, &input, source.as_deref(), all)?
        }
        Commands::Lookup { input, no_title } => {
            let today = chrono::Local::now().date_naive();
            commands::lookup(&ctx, &mut out, &input, !no_title, today).await?
        }
        Commands::History { clear } => commands::history(&ctx, &mut out, clear)?,
        Commands::Sources => commands::sources(&ctx, &mut out)?,
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}
