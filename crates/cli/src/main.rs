mod config;
mod logging;
mod render;
mod seed;
mod serve;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use crate::config::ServeConfig;
use crate::logging::LogFormat;

/// Dataset proposal publishing service.
#[derive(Parser)]
#[command(name = "publishing", version, about = "Dataset proposal publishing service")]
struct Cli {
    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the publishing HTTP API server
    Serve(ServeConfig),

    /// Render an email template with the given attributes and print it
    RenderTemplate {
        /// Path to the template file
        file: PathBuf,
        /// Attribute to substitute, as KEY=VALUE (repeatable)
        #[arg(long = "attr", value_parser = render::parse_attribute)]
        attributes: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Serve(config) => {
            if let Err(e) = config.validate() {
                error!("configuration error: {e}");
                std::process::exit(2);
            }
            serve::start_server(config).await
        }
        Commands::RenderTemplate { file, attributes } => {
            render::render_file(&file, attributes).await
        }
    }
}
