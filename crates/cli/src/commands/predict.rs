//! `pdm predict`

use anyhow::Result;
use maintenance_lib::{Observation, PredictionEngine};

use crate::output::{print_json, print_prediction, OutputFormat};

pub fn run(engine: &PredictionEngine, observation: &Observation, format: OutputFormat) -> Result<()> {
    let prediction = engine.predict(observation)?;

    match format {
        OutputFormat::Json => print_json(&prediction)?,
        OutputFormat::Table => print_prediction(&prediction),
    }

    Ok(())
}
