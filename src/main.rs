//! explain-viz - Main Entry Point
//!
//! Render explanation charts or host them on a local dashboard.

use clap::Parser;
use explain_viz::cli::{cmd_inspect, cmd_render, cmd_serve, show_help, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "explain_viz=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { files, port, host }) => {
            cmd_serve(&files, &host, port)?;
        }
        Some(Commands::Render { file, key }) => {
            cmd_render(&file, key)?;
        }
        Some(Commands::Inspect { file }) => {
            cmd_inspect(&file)?;
        }
        None => show_help(),
    }

    Ok(())
}
