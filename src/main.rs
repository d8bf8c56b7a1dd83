//! CLI entry point for the case growth pipeline.
//!
//! Provides subcommands for generating the cases dataset, the new-case
//! dataset, running the full pipeline (optionally on a schedule and with S3
//! upload), and building the FIPS reference lookup.

use anyhow::{Context, Result};
use case_growth::fetch::{BasicClient, NYT_COUNTIES_URL, NYT_STATES_URL, fetch_bytes};
use case_growth::fips::read_census;
use case_growth::growth::types::{DEFAULT_GROWTH_METRIC_DAYS, MIN_CASE_COUNT};
use case_growth::growth::{
    Axis, CaseRow, GrowthConfig, SourceKind, generate_case_data, generate_new_case_json,
};
use case_growth::output::{
    Artifact, CASE_DATA_FILE, FIPS_DATA_FILE, NEW_CASE_DATA_FILE, write_artifact,
};
use case_growth::parser::parse_case_csv;
use case_growth::publish::upload_artifact;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "case_growth")]
#[command(about = "Builds COVID-19 case growth datasets from NYT case counts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// State-level case CSV (file path or URL)
    #[arg(long, value_name = "FILE_OR_URL", default_value = NYT_STATES_URL)]
    states: String,

    /// County-level case CSV (file path or URL)
    #[arg(long, value_name = "FILE_OR_URL", default_value = NYT_COUNTIES_URL)]
    counties: String,

    /// Directory to write generated JSON into
    #[arg(short, long, default_value = "data")]
    output_dir: PathBuf,

    /// Gzip compress generated JSON
    #[arg(long, default_value_t = false)]
    gzip: bool,
}

#[derive(Args, Clone)]
struct GrowthArgs {
    /// Trailing days used to estimate growth factor and doubling time
    #[arg(short = 'n', long, default_value_t = DEFAULT_GROWTH_METRIC_DAYS)]
    growth_metric_days: usize,

    /// Minimum cumulative cases before growth is estimated
    #[arg(short, long, default_value_t = MIN_CASE_COUNT)]
    min_cases: u64,

    /// Key the cases dataset by FIPS code first instead of by date
    #[arg(long, default_value_t = false)]
    fips_first: bool,
}

impl GrowthArgs {
    fn config(&self) -> GrowthConfig {
        GrowthConfig {
            growth_metric_days: self.growth_metric_days,
            min_case_count: self.min_cases,
            axis: if self.fips_first {
                Axis::FipsFirst
            } else {
                Axis::DateFirst
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the per-date, per-region cases dataset with growth metrics
    Cases {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        growth: GrowthArgs,
    },
    /// Generate the per-region smoothed daily new-case dataset
    NewCases {
        #[command(flatten)]
        source: SourceArgs,

        /// Minimum cumulative cases before new cases are recorded
        #[arg(short, long, default_value_t = MIN_CASE_COUNT)]
        min_cases: u64,
    },
    /// Generate both datasets, optionally upload them, optionally repeat
    Run {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        growth: GrowthArgs,

        /// Optional: S3 bucket to upload generated JSON to (e.g., "my-bucket")
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Key prefix for uploaded objects
        #[arg(long, default_value = "data")]
        s3_prefix: String,

        /// Hours to wait between runs
        #[arg(short = 'i', long, default_value_t = 6)]
        interval_hours: u64,

        /// Number of runs to perform (0 = infinite)
        #[arg(short = 'r', long, default_value_t = 1)]
        num_runs: usize,
    },
    /// Build the FIPS reference lookup from census population estimates
    Fips {
        /// Census county population CSV
        #[arg(long, default_value = "raw_county_census_data.csv")]
        input: PathBuf,

        /// Directory to write fips_data.json into
        #[arg(short, long, default_value = "data")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Cases { source, growth } => {
            let (states, counties) = load_sources(&source).await?;
            let artifact = case_artifact(&states, &counties, &growth.config(), source.gzip)?;
            write_artifact(&source.output_dir, &artifact)?;
        }
        Commands::NewCases { source, min_cases } => {
            let (states, counties) = load_sources(&source).await?;
            let artifact = new_case_artifact(&states, &counties, min_cases, source.gzip)?;
            write_artifact(&source.output_dir, &artifact)?;
        }
        Commands::Run {
            source,
            growth,
            s3_bucket,
            s3_prefix,
            interval_hours,
            num_runs,
        } => {
            run_pipeline(&source, &growth, s3_bucket, &s3_prefix, interval_hours, num_runs).await?;
        }
        Commands::Fips { input, output_dir } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let lookup = read_census(&bytes)?;
            let artifact = Artifact::from_json(FIPS_DATA_FILE, &lookup, false)?;
            write_artifact(&output_dir, &artifact)?;
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/case_growth.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("case_growth.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Loads a source from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn fetcher(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, source).await?.to_vec()
    } else {
        std::fs::read(source).with_context(|| format!("failed to read {source}"))?
    };
    Ok(bytes)
}

/// Fetches and parses the state and county files.
async fn load_sources(source: &SourceArgs) -> Result<(Vec<CaseRow>, Vec<CaseRow>)> {
    let state_bytes = fetcher(&source.states).await?;
    let states = parse_case_csv(&state_bytes, SourceKind::State)
        .with_context(|| format!("failed to parse state file {}", source.states))?;

    let county_bytes = fetcher(&source.counties).await?;
    let counties = parse_case_csv(&county_bytes, SourceKind::County)
        .with_context(|| format!("failed to parse county file {}", source.counties))?;

    info!(
        state_rows = states.len(),
        county_rows = counties.len(),
        "Sources loaded"
    );
    Ok((states, counties))
}

fn case_artifact(
    states: &[CaseRow],
    counties: &[CaseRow],
    config: &GrowthConfig,
    gzip: bool,
) -> Result<Artifact> {
    let data = generate_case_data(states, counties, config)?;
    Artifact::from_json(CASE_DATA_FILE, &data, gzip)
}

fn new_case_artifact(
    states: &[CaseRow],
    counties: &[CaseRow],
    min_cases: u64,
    gzip: bool,
) -> Result<Artifact> {
    let data = generate_new_case_json(states, counties, min_cases)?;
    Artifact::from_json(NEW_CASE_DATA_FILE, &data, gzip)
}

/// One full round: fetch, build both datasets, write them, upload them.
///
/// Nothing is written or uploaded unless both datasets were built.
async fn run_once(
    source: &SourceArgs,
    growth: &GrowthArgs,
    s3: Option<(&aws_sdk_s3::Client, &str)>,
    s3_prefix: &str,
) -> Result<()> {
    let (states, counties) = load_sources(source).await?;

    let artifacts = [
        case_artifact(&states, &counties, &growth.config(), source.gzip)?,
        new_case_artifact(&states, &counties, growth.min_cases, source.gzip)?,
    ];

    for artifact in &artifacts {
        write_artifact(&source.output_dir, artifact)?;
    }

    if let Some((client, bucket)) = s3 {
        for artifact in &artifacts {
            upload_artifact(client, bucket, s3_prefix, artifact).await?;
        }
    }

    Ok(())
}

/// Runs the pipeline `num_runs` times (0 = forever), waiting
/// `interval_hours` between rounds. A failed round is logged and the
/// schedule continues; a single run propagates its error.
#[tracing::instrument(skip(source, growth, s3_bucket), fields(interval_hours, num_runs))]
async fn run_pipeline(
    source: &SourceArgs,
    growth: &GrowthArgs,
    s3_bucket: Option<String>,
    s3_prefix: &str,
    interval_hours: u64,
    num_runs: usize,
) -> Result<()> {
    // Initialize S3 client if bucket is provided
    let s3_client = if s3_bucket.is_some() {
        let config = aws_config::load_from_env().await;
        Some(aws_sdk_s3::Client::new(&config))
    } else {
        None
    };

    if let Some(ref bucket) = s3_bucket {
        info!(bucket = %bucket, prefix = s3_prefix, gzip = source.gzip, "S3 upload enabled");
    }

    let s3 = s3_client.as_ref().zip(s3_bucket.as_deref());

    if num_runs == 1 {
        return run_once(source, growth, s3, s3_prefix).await;
    }

    if num_runs == 0 {
        info!(interval_hours, "Running indefinitely. Press Ctrl+C to stop.");
    }

    let mut run_count = 0;

    loop {
        // Check if we've reached the run limit (0 = infinite)
        if num_runs > 0 && run_count >= num_runs {
            break;
        }

        run_count += 1;

        info!(
            run = run_count,
            total = if num_runs == 0 { None } else { Some(num_runs) },
            "Starting run"
        );

        match run_once(source, growth, s3, s3_prefix).await {
            Ok(()) => info!(run = run_count, "Run complete"),
            Err(e) => error!(run = run_count, error = %format!("{e:#}"), "Run failed"),
        }

        // If not the last run, wait before next iteration
        if num_runs == 0 || run_count < num_runs {
            info!(interval_hours, "Waiting before next run");
            tokio::time::sleep(tokio::time::Duration::from_secs(interval_hours * 3600)).await;
        }
    }

    info!(runs = run_count, "Finished scheduled runs");
    Ok(())
}
