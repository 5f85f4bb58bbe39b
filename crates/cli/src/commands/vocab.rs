//! `pdm vocab`: accepted values of each categorical feature

use anyhow::Result;
use colored::Colorize;
use maintenance_lib::{CodecSet, Feature};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

use crate::output::{print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct VocabRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Flag")]
    flag: String,
    #[tabled(rename = "Accepted values")]
    values: String,
}

#[derive(Serialize)]
struct Vocabulary<'a> {
    features: BTreeMap<&'static str, &'a [String]>,
    labels: &'a [String],
}

pub fn run(codecs: &CodecSet, format: OutputFormat) -> Result<()> {
    let features: BTreeMap<&'static str, &[String]> = Feature::CATEGORICAL
        .iter()
        .filter_map(|f| codecs.feature(*f).map(|c| (f.column_name(), c.classes())))
        .collect();

    match format {
        OutputFormat::Json => print_json(&Vocabulary {
            features,
            labels: codecs.target().classes(),
        })?,
        OutputFormat::Table => {
            let rows: Vec<VocabRow> = Feature::CATEGORICAL
                .iter()
                .filter_map(|f| {
                    let codec = codecs.feature(*f)?;
                    Some(VocabRow {
                        feature: f.display_label().to_string(),
                        flag: format!("--{}", f.column_name().replace('_', "-")),
                        values: codec.classes().join(", "),
                    })
                })
                .collect();
            print_table(&rows);
            println!(
                "\n{} {}",
                "Condition labels:".bold(),
                codecs.target().classes().join(", ")
            );
        }
    }

    Ok(())
}
