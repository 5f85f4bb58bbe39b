//! Predictive maintenance CLI
//!
//! Predicts the condition of a construction material from a single
//! observation and writes the maintenance report PDF.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{predict, report, vocab, ObservationArgs};
use maintenance_lib::explain::DEFAULT_EXPLANATION_TIMEOUT;
use maintenance_lib::{ModelArtifacts, Observation};
use output::OutputFormat;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Predictive maintenance CLI
#[derive(Parser)]
#[command(name = "pdm")]
#[command(author, version, about = "Predictive maintenance reports for construction materials", long_about = None)]
pub struct Cli {
    /// Model artifact directory (can also be set via PDM_ARTIFACTS_DIR env var)
    #[arg(long, env = "PDM_ARTIFACTS_DIR")]
    pub artifacts: Option<PathBuf>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the maintenance condition of a material
    Predict(ObservationArgs),

    /// Predict, explain and write the maintenance report PDF
    Report {
        #[command(flatten)]
        observation: ObservationArgs,

        /// Report file path
        #[arg(long, short, default_value = "Maintenance_Report.pdf")]
        output: PathBuf,

        /// Skip the explanation service and use the placeholder text
        #[arg(long)]
        no_explain: bool,

        /// Groq model used for the explanation
        #[arg(long)]
        groq_model: Option<String>,
    },

    /// List accepted values for each categorical feature
    Vocab,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

#[tokio::main]
async fn main() {
    // Must run before clap reads PDM_ARTIFACTS_DIR
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or_default();

    let artifacts_dir = config.resolve_artifacts_dir(cli.artifacts);
    let artifacts = ModelArtifacts::load_dir(&artifacts_dir).with_context(|| {
        format!("Failed to load model artifacts from {}", artifacts_dir.display())
    })?;

    match cli.command {
        Commands::Vocab => vocab::run(&artifacts.codecs, format)?,
        Commands::Predict(args) => {
            let engine = artifacts.into_engine()?;
            predict::run(&engine, &Observation::from(args), format)?;
        }
        Commands::Report {
            observation,
            output,
            no_explain,
            groq_model,
        } => {
            let engine = artifacts.into_engine()?;
            let options = report::ReportOptions {
                output,
                explain: !no_explain,
                groq_model: groq_model.or_else(|| config.groq_model.clone()),
                timeout: config
                    .explanation_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_EXPLANATION_TIMEOUT),
            };
            report::run(&engine, &Observation::from(observation), &options, format).await?;
        }
    }

    Ok(())
}
