mod extract;
mod geocode;
mod matcher;
mod network;
mod pipeline;
mod slicer;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use matcher::DistanceMetric;

/// Recovers the road geometry covered by highway construction projects from
/// a reference network of route LineStrings.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Match projects against the reference network and attach sliced
    /// geometries.
    Process(ProcessArgs),
    /// Parse a raw project-listing text dump into project records.
    Parse(ParseArgs),
}

#[derive(clap::Args)]
struct ProcessArgs {
    /// Reference network JSON: an array of {ref, name, geometry} records.
    #[arg(long)]
    network: PathBuf,
    /// Project records JSON, as produced by the parse subcommand.
    #[arg(long)]
    projects: PathBuf,
    /// Output path for the enriched project collection.
    #[arg(long)]
    output: PathBuf,
    /// Nominatim-compatible search endpoint.
    #[arg(long, default_value = "https://nominatim.openstreetmap.org/search")]
    geocoder_url: String,
    /// Region qualifier appended to every geocoding query.
    #[arg(long, default_value = "India")]
    region: String,
    /// Per-request geocoding timeout in seconds.
    #[arg(long, default_value_t = 10)]
    geocode_timeout: u64,
    /// Distance metric for candidate scoring.
    #[arg(long, value_enum, default_value = "planar")]
    metric: DistanceMetric,
    /// Only process the first N projects (geocoder throttling aid).
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Text dump of the award listing.
    #[arg(long)]
    input: PathBuf,
    /// Output path for the parsed project records.
    #[arg(long)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Process(args) => process(args).await,
        Command::Parse(args) => parse(args),
    }
}

async fn process(args: ProcessArgs) -> Result<()> {
    let network = network::load_network(&args.network)?;
    let projects = pipeline::load_projects(&args.projects)?;

    let mut geocoder = geocode::NominatimGeocoder::new(
        args.geocoder_url,
        args.region,
        Duration::from_secs(args.geocode_timeout),
    )?;

    let enriched = pipeline::run(projects, &network, &mut geocoder, args.metric, args.limit).await;

    write_json(&args.output, &enriched)?;
    info!(
        "Saved {} projects to {}",
        enriched.len(),
        args.output.display()
    );
    Ok(())
}

fn parse(args: ParseArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read listing {}", args.input.display()))?;
    let projects = extract::parse_listing(&text)?;

    write_json(&args.output, &projects)?;
    info!(
        "Saved {} projects to {}",
        projects.len(),
        args.output.display()
    );
    Ok(())
}

fn write_json(path: &Path, records: &[pipeline::ProjectRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    serde_json::to_writer_pretty(file, records)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
