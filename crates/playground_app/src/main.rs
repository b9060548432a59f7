//! API Playground
//!
//! Interactive terminal playground for services publishing `/openapi.json`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use playground_app::config::CliArgs as ConfigCliArgs;
use playground_app::prelude::*;
use playground_app::Location;
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// API Playground - explore and invoke the routes of an OpenAPI service
#[derive(Parser, Debug)]
#[command(name = "playground")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root URL of the service
    #[arg(long, value_name = "URL")]
    api_root: Option<String>,

    /// Shared playground link to restore
    #[arg(long, value_name = "URL", conflicts_with = "state")]
    link: Option<String>,

    /// Encoded link state (the part after `#`)
    #[arg(long, value_name = "FRAGMENT")]
    state: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Directory receiving downloads
    #[arg(long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the routes published by the service
    Routes,
    /// Invoke one route and print the result
    Call {
        /// Route path, e.g. /hello
        route: String,
        /// Parameter values as a JSON object
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },
}

impl From<&Args> for ConfigCliArgs {
    fn from(args: &Args) -> Self {
        ConfigCliArgs {
            config_file: args.config.clone(),
            api_root: args.api_root.clone(),
            log_level: args.log_level.clone(),
            download_dir: args.download_dir.clone(),
        }
    }
}

/// Log to `log_file` when given, stderr otherwise
fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = build_config(&ConfigCliArgs::from(&args))?;

    // The terminal UI owns stdout, so it logs to a file
    let log_file = args.command.is_none().then_some(config.log_file.as_path());
    init_tracing(config.log_level.as_filter_str(), log_file)?;

    tracing::info!("API Playground v{}", playground_app::VERSION);
    tracing::info!(
        api_root = %config.api_root,
        log_level = %config.log_level,
        download_dir = %config.download_dir.display(),
        "Playground configuration loaded"
    );

    let mut playground = Playground::new(&config);
    if let Some(link) = &args.link {
        playground.set_hash(Location::from_link(link).hash());
    } else if let Some(state) = &args.state {
        playground.set_hash(state);
    }

    match args.command {
        None => {
            let state = AppState::new(
                playground,
                SplitPane::new(config.split_percent),
                Box::new(SystemClipboard),
            );
            let mut app = TuiApp::new(state)?;
            app.run().await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Routes) => {
            playground.load().await?;
            for route in playground.routes().iter() {
                println!("{:<5} {:<30} {}", route.method.as_str(), route.path, route.summary);
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Call { route, data }) => {
            let data: Map<String, Value> = match data {
                Some(json) => serde_json::from_str(&json).context("--data must be a JSON object")?,
                None => Map::new(),
            };
            playground.load().await?;
            call(&mut playground, &route, &data, &config.download_dir).await
        }
    }
}

async fn call(playground: &mut Playground, route: &str, data: &Map<String, Value>, dir: &Path) -> Result<ExitCode> {
    // Seed the card so omitted inputs keep their defaults
    let params = match playground.card_index(route) {
        Some(index) => {
            let card = playground
                .card_mut(index)
                .context("route card disappeared")?;
            card.set_params(data);
            card.get_params()
        }
        None => Params::from_json(data),
    };

    let rendered = match playground.invoke(route, params).await {
        Ok(rendered) => rendered.clone(),
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    match &rendered {
        Rendered::Markup(text) => println!("{}", text),
        Rendered::Frame { url } => println!("{}", url),
        Rendered::Download { filename, saved_to, .. } => match saved_to {
            Some(path) => println!("{} saved to {}", filename, path.display()),
            None => println!("{}", filename),
        },
        Rendered::Image {
            blob_url,
            content_type,
            size,
        } => {
            let path = playground
                .blobs()
                .export(blob_url, dir)
                .with_context(|| format!("Failed to export {}", blob_url))?;
            println!("{} ({} bytes) saved to {}", content_type, size, path.display());
        }
    }
    println!("{}", playground.link());
    Ok(ExitCode::SUCCESS)
}
