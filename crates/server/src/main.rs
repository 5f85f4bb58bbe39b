//! Predictive maintenance server
//!
//! Loads the frozen model artifacts once and serves predictions and PDF
//! maintenance reports over HTTP.

use anyhow::{Context, Result};
use maintenance_lib::{
    health::{components, HealthRegistry},
    DisabledExplainer, ExplanationProvider, GroqExplainer, ModelArtifacts, StructuredLogger,
};
use maintenance_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting maintenance-server");

    let config = ServerConfig::load().context("invalid configuration")?;
    info!(
        port = config.port,
        artifacts_dir = %config.artifacts_dir.display(),
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::EXPLAINER).await;

    let logger = StructuredLogger::new("server");

    // Missing or malformed artifacts abort startup
    let engine = ModelArtifacts::load_dir(&config.artifacts_dir)
        .and_then(|artifacts| artifacts.into_engine())
        .with_context(|| {
            format!(
                "failed to load model artifacts from {}",
                config.artifacts_dir.display()
            )
        })?
        .with_logger(logger.clone());

    let explainer: Arc<dyn ExplanationProvider> = match config.groq_config() {
        Some(groq) => {
            info!(model = %groq.model, "Explanations enabled");
            Arc::new(GroqExplainer::new(groq).context("failed to build explanation client")?)
        }
        None => {
            warn!("GROQ_API_KEY not set, reports will use the placeholder explanation");
            health_registry
                .set_degraded(components::EXPLAINER, "explanation service not configured")
                .await;
            Arc::new(DisabledExplainer)
        }
    };

    logger.log_startup(SERVER_VERSION, engine.model_version(), engine.model_format());

    let state = Arc::new(
        api::AppState::new(health_registry.clone(), Arc::new(engine), explainer)
            .with_explanation_timeout(config.explanation_timeout()),
    );

    health_registry.set_ready(true).await;

    api::serve(config.port, state).await?;
    logger.log_shutdown("SIGINT received");

    Ok(())
}
