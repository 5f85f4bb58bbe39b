//! Subcommand implementations

pub mod predict;
pub mod report;
pub mod vocab;

use clap::Args;
use maintenance_lib::Observation;

/// Observation fields shared by `predict` and `report`
#[derive(Debug, Clone, Args)]
pub struct ObservationArgs {
    /// Material type (e.g. Steel, Cement, Brick)
    #[arg(long)]
    pub material_type: String,

    /// Material age in days
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=500))]
    pub material_age_days: u32,

    /// Usage frequency (Low, Medium, High)
    #[arg(long)]
    pub usage_frequency: String,

    /// Humidity exposure (Low, Medium, High)
    #[arg(long)]
    pub humidity_exposure: String,

    /// Load stress level (Low, Medium, High)
    #[arg(long)]
    pub load_stress_level: String,

    /// Whether cracks are visible (No, Yes)
    #[arg(long)]
    pub cracks_visible: String,

    /// Days since the last maintenance
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=300))]
    pub last_maintenance_days: u32,
}

impl From<ObservationArgs> for Observation {
    fn from(args: ObservationArgs) -> Self {
        Observation {
            material_type: args.material_type,
            material_age_days: args.material_age_days,
            usage_frequency: args.usage_frequency,
            humidity_exposure: args.humidity_exposure,
            load_stress_level: args.load_stress_level,
            cracks_visible: args.cracks_visible,
            last_maintenance_days: args.last_maintenance_days,
        }
    }
}
