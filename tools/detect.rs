use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use device_pattern::{
    infrastructure::FileSource, required_from_str, Config, DataSetLoader, DataSetProvider,
    DetectDeviceUseCase,
};

/// Detect devices from User-Agent strings and print one JSON line per input
#[derive(Parser)]
struct Cli {
    /// Dataset file (defaults to DATASET_PATH)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Comma separated properties to project (defaults to REQUIRED_PROPERTIES)
    #[arg(long)]
    properties: Option<String>,

    /// Input bytes considered per match (defaults to MAX_SCAN_LENGTH)
    #[arg(long)]
    max_scan_length: Option<usize>,

    /// Pretty-print each result
    #[arg(long)]
    pretty: bool,

    /// User-Agent strings; read from stdin, one per line, when omitted
    user_agents: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(data) = cli.data {
        config.dataset_path = data;
    }
    if let Some(properties) = cli.properties.as_deref() {
        config.required_properties = required_from_str(properties);
    }
    if let Some(max_scan_length) = cli.max_scan_length {
        config.max_scan_length = max_scan_length;
    }
    config.validate()?;

    init_tracing(config.log_json);

    let source = Arc::new(FileSource::new(config.dataset_path.clone()));
    let provider = DataSetProvider::new(DataSetLoader::from_config(&config), source)
        .with_context(|| format!("loading {}", config.dataset_path.display()))?;
    let use_case = DetectDeviceUseCase::new(Arc::new(provider));
    info!(path = %config.dataset_path.display(), "ready");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.user_agents.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line.context("reading stdin")?;
            print_result(&mut out, &use_case, &line, cli.pretty)?;
        }
    } else {
        for user_agent in &cli.user_agents {
            print_result(&mut out, &use_case, user_agent, cli.pretty)?;
        }
    }

    Ok(())
}

fn print_result(
    out: &mut impl Write,
    use_case: &DetectDeviceUseCase,
    user_agent: &str,
    pretty: bool,
) -> anyhow::Result<()> {
    let result = use_case.execute(user_agent);
    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    writeln!(out, "{}", json)?;
    Ok(())
}

fn init_tracing(json: bool) {
    // Logs go to stderr so stdout stays machine readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
