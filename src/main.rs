//! CO2 Analyser - command line front end
//!
//! Prints the mean, peak rolling deviation and plot summary of a sensor export.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use co2_analyser::charts::DEFAULT_CURVE_POINTS;
use co2_analyser::config::DEFAULT_WINDOW;
use co2_analyser::{Analysis, AnalysisOptions, DataLoader, LayoutSchema};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "co2-analyser", version, about)]
struct Args {
    /// Sensor export to analyse
    csv: PathBuf,

    /// TOML file overriding the header row and location columns
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Rolling standard deviation window
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    window: usize,

    /// Points sampled along each distribution curve
    #[arg(long = "curve-points", default_value_t = DEFAULT_CURVE_POINTS)]
    curve_points: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let schema = match &args.schema {
        Some(path) => LayoutSchema::from_toml_file(path)
            .with_context(|| format!("loading schema {}", path.display()))?,
        None => LayoutSchema::default(),
    };
    info!(csv = %args.csv.display(), window = args.window, "starting analysis");

    let mut loader = DataLoader::new(schema);
    let (first, second) = loader
        .load(&args.csv)
        .with_context(|| format!("reading {}", args.csv.display()))?;

    let options = AnalysisOptions {
        window: args.window,
        curve_points: args.curve_points,
    };
    let report = Analysis::run(first, second, &options).context("analysing readings")?;

    match args.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}
