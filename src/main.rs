mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with stderr output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Commands::Extract {
            input,
            output,
            extraction,
            llm,
        } => commands::extract::run(&input, &output, &extraction, &llm).await?,
        cli::Commands::Canonicalize {
            graph,
            output,
            canonicalization,
            llm,
        } => commands::canonicalize::run(&graph, &output, &canonicalization, &llm).await?,
        cli::Commands::Build {
            input,
            raw_output,
            output,
            extraction,
            canonicalization,
            llm,
        } => {
            commands::build::run(
                &input,
                &raw_output,
                &output,
                &extraction,
                &canonicalization,
                &llm,
            )
            .await?
        }
    }

    Ok(())
}
