use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use device_pattern::domain::DataSetStats;
use device_pattern::infrastructure::format::{DataSetReader, SectionStats};
use device_pattern::infrastructure::{BytesSource, FileSource};
use device_pattern::ports::DataSetSource;
use device_pattern::DataSetLoader;

/// Validate a dataset file and print its layout and table sizes
#[derive(Parser)]
struct Cli {
    /// Dataset file (defaults to DATASET_PATH)
    #[arg(long)]
    data: Option<PathBuf>,

    /// List every property with its owning component
    #[arg(long)]
    properties: bool,
}

#[derive(Serialize)]
struct Report {
    path: String,
    version: u32,
    checksum: String,
    layout: SectionStats,
    tables: DataSetStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<PropertyReport>,
}

#[derive(Serialize)]
struct PropertyReport {
    name: String,
    component: String,
    default_value: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let path = cli
        .data
        .or_else(|| std::env::var("DATASET_PATH").ok().map(PathBuf::from))
        .context("DATASET_PATH must be set or passed with --data")?;

    let data = FileSource::new(&path).read()?;
    let layout = DataSetReader::from_slice(&data)?.stats();
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    let dataset = DataSetLoader::new()
        .load_from_source(&BytesSource::new(name, data.clone()))
        .with_context(|| format!("loading {}", path.display()))?;

    let properties = if cli.properties {
        dataset
            .properties()
            .iter()
            .map(|property| PropertyReport {
                name: dataset.string(property.name()).to_string(),
                component: dataset.component_name(property.component()).to_string(),
                default_value: property
                    .default_value()
                    .map(|v| dataset.value_name(v).to_string()),
            })
            .collect()
    } else {
        Vec::new()
    };

    let report = Report {
        path: path.display().to_string(),
        version: dataset.version(),
        checksum: dataset.checksum().to_hex(),
        layout,
        tables: dataset.stats(),
        properties,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
