//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use maintenance_lib::{PredictionResult, RiskTier};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Warnings go to stderr so JSON output stays parseable
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a confidence percentage the way reports show it
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}%", confidence)
}

pub fn color_risk_tier(tier: RiskTier) -> String {
    match tier {
        RiskTier::High => tier.as_str().red().bold().to_string(),
        RiskTier::Medium => tier.as_str().yellow().to_string(),
        RiskTier::Low => tier.as_str().green().to_string(),
    }
}

/// Color a condition label by severity
pub fn color_condition(label: &str) -> String {
    match label {
        "Good" => label.green().to_string(),
        "Moderate" => label.yellow().to_string(),
        _ => label.red().to_string(),
    }
}

#[derive(Tabled)]
struct ProbabilityRow {
    #[tabled(rename = "Condition")]
    label: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

/// Print a prediction summary followed by the class distribution
pub fn print_prediction(prediction: &PredictionResult) {
    println!("{}", "Maintenance Prediction".bold());
    println!("{}", "=".repeat(40));
    println!("Predicted Condition: {}", color_condition(&prediction.label));
    println!(
        "Risk Confidence:     {}",
        format_confidence(prediction.confidence)
    );
    println!("Risk Level:          {}", color_risk_tier(prediction.risk_tier));
    println!("Recommendation:      {}", prediction.recommendation);
    println!("Model:               {}", prediction.model_version.dimmed());
    println!();

    let rows: Vec<ProbabilityRow> = prediction
        .probabilities
        .iter()
        .map(|p| ProbabilityRow {
            label: p.label.clone(),
            probability: format_confidence(p.probability * 100.0),
        })
        .collect();
    print_table(&rows);
}
