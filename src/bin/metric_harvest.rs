use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use fair_metric_harvest::app::{CancelToken, Harvester, ProgressSink, RunSummary};
use fair_metric_harvest::config::{ConfigLoader, ConfigOverrides, HarvestConfig};
use fair_metric_harvest::domain::{MetricRecordId, RdfDocument};
use fair_metric_harvest::error::{HarvestError, LookupError};
use fair_metric_harvest::fairsharing::{FairsharingHttpClient, MetricClient, lookup};
use fair_metric_harvest::fetch::{DocumentClient, HttpDocumentClient};
use fair_metric_harvest::output::{JsonOutput, OutputMode, StderrProgress, export_csv};
use fair_metric_harvest::rdf::{PatternRdfExtractor, RdfExtractor};
use fair_metric_harvest::record::extract_record_id;
use fair_metric_harvest::sheet::Workbook;
use fair_metric_harvest::url_resolver;

#[derive(Parser)]
#[command(name = "metric-harvest")]
#[command(about = "Compile FAIRsharing metric names and test descriptions into a report sheet")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Process the worklist and rewrite the target sheet")]
    Run(RunArgs),
    #[command(about = "List worklist rows and their resolved URLs (no network)")]
    Scan(ScanArgs),
    #[command(about = "Extract metric URL and description from a local RDF file")]
    Extract(ExtractArgs),
    #[command(about = "Look up one FAIRsharing record by id")]
    Lookup(LookupArgs),
}

#[derive(Args, Clone, Default)]
struct OverrideArgs {
    #[arg(long)]
    source_sheet: Option<String>,

    #[arg(long)]
    target_sheet: Option<String>,

    #[arg(long)]
    column: Option<String>,

    #[arg(long)]
    metric_path: Option<String>,

    #[arg(long)]
    delay_ms: Option<u64>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        ConfigOverrides {
            source_sheet: args.source_sheet,
            target_sheet: args.target_sheet,
            source_column: args.column,
            metric_name_path: args.metric_path,
            request_delay_ms: args.delay_ms,
        }
    }
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    workbook: Utf8PathBuf,

    #[arg(long)]
    csv: Option<Utf8PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args)]
struct ScanArgs {
    #[arg(long)]
    workbook: Utf8PathBuf,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args)]
struct ExtractArgs {
    file: Utf8PathBuf,
}

#[derive(Args)]
struct LookupArgs {
    record_id: String,

    #[arg(long)]
    metric_path: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<HarvestError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarvestError) -> u8 {
    match error {
        HarvestError::ConfigRead(_)
        | HarvestError::ConfigParse(_)
        | HarvestError::InvalidConfig { .. }
        | HarvestError::InvalidColumn(_)
        | HarvestError::WorkbookRead(_)
        | HarvestError::WorkbookParse(_)
        | HarvestError::MissingSheet(_)
        | HarvestError::StartMarkerNotFound { .. } => 2,
        HarvestError::HttpClient(_)
        | HarvestError::DocumentStatus { .. }
        | HarvestError::DocumentHttp { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run(args) => {
            let config = ConfigLoader::resolve(config_path, &args.overrides.clone().into())?;
            run_harvest(args, config, output_mode)
        }
        Commands::Scan(args) => {
            let config = ConfigLoader::resolve(config_path, &args.overrides.clone().into())?;
            run_scan(args, config, output_mode)
        }
        Commands::Extract(args) => run_extract(args, output_mode),
        Commands::Lookup(args) => {
            let overrides = ConfigOverrides {
                metric_name_path: args.metric_path.clone(),
                ..ConfigOverrides::default()
            };
            let config = ConfigLoader::resolve(config_path, &overrides)?;
            run_lookup(args, config, output_mode)
        }
    }
}

fn run_harvest(args: RunArgs, config: HarvestConfig, output_mode: OutputMode) -> miette::Result<()> {
    let mut workbook = Workbook::load(&args.workbook)?;
    let documents = HttpDocumentClient::new(config.http_timeout)?;
    let metrics = FairsharingHttpClient::new(&config.fairsharing_base, config.http_timeout)?;
    let harvester = Harvester::new(config, documents, metrics);

    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Interactive => &StderrProgress,
        OutputMode::NonInteractive => &JsonOutput,
    };
    let result = harvester.run(&mut workbook, &CancelToken::new(), sink)?;
    workbook.save(&args.workbook)?;
    if let Some(path) = &args.csv {
        export_csv(path, &result.rows)?;
    }

    let summary = RunSummary::new(&result, &harvester.config().target_sheet);
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_summary(&summary).into_diagnostic()?,
        OutputMode::Interactive => {
            println!(
                "Compiled {} entries into {} ({} skipped, {} errors)",
                summary.entries, summary.target_sheet, summary.skipped, summary.errors
            );
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ScanEntry {
    row: usize,
    display_value: String,
    url: Option<String>,
}

fn run_scan(args: ScanArgs, config: HarvestConfig, output_mode: OutputMode) -> miette::Result<()> {
    let workbook = Workbook::load(&args.workbook)?;
    let harvester = Harvester::new(config, NopDocuments, NopMetrics);
    let entries = harvester
        .worklist(&workbook)?
        .into_iter()
        .map(|row| ScanEntry {
            row: row.row_index,
            url: url_resolver::resolve(&row).map(|resolved| resolved.url),
            display_value: row.display_value,
        })
        .collect::<Vec<_>>();

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_json(&entries).into_diagnostic()?,
        OutputMode::Interactive => {
            for entry in &entries {
                let url = entry.url.as_deref().unwrap_or("(no URL)");
                println!("{:>5}  {}  {}", entry.row, url, entry.display_value);
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ExtractEntry {
    metric_url: Option<String>,
    record_id: Option<String>,
    description: Option<String>,
}

fn run_extract(args: ExtractArgs, output_mode: OutputMode) -> miette::Result<()> {
    let text = std::fs::read_to_string(args.file.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    let document = RdfDocument {
        source_url: args.file.to_string(),
        text,
    };
    let extracted = PatternRdfExtractor.extract(&document);
    let entry = ExtractEntry {
        record_id: extracted
            .metric_url
            .as_deref()
            .and_then(extract_record_id)
            .map(|id| id.as_str().to_string()),
        metric_url: extracted.metric_url,
        description: extracted.test_description,
    };

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_json(&entry).into_diagnostic()?,
        OutputMode::Interactive => {
            println!("metric URL:  {}", entry.metric_url.as_deref().unwrap_or("-"));
            println!("record id:   {}", entry.record_id.as_deref().unwrap_or("-"));
            println!("description: {}", entry.description.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}

fn run_lookup(args: LookupArgs, config: HarvestConfig, output_mode: OutputMode) -> miette::Result<()> {
    let client = FairsharingHttpClient::new(&config.fairsharing_base, config.http_timeout)?;
    let token = args
        .record_id
        .trim()
        .trim_start_matches("FAIRsharing.")
        .to_string();
    let id = MetricRecordId::new(token);
    let name = lookup(&client, &id, &config.metric_name_path).render();

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_json(&serde_json::json!({
            "record_id": id.as_str(),
            "url": client.record_url(&id),
            "metric_name": name,
        }))
        .into_diagnostic()?,
        OutputMode::Interactive => println!("{id}: {name}"),
    }
    Ok(())
}

struct NopDocuments;
struct NopMetrics;

impl DocumentClient for NopDocuments {
    fn fetch_text(&self, url: &str) -> Result<RdfDocument, HarvestError> {
        Err(HarvestError::DocumentHttp {
            url: url.to_string(),
            message: "document client not configured".to_string(),
        })
    }
}

impl MetricClient for NopMetrics {
    fn fetch_record(&self, _id: &MetricRecordId) -> Result<serde_json::Value, LookupError> {
        Err(LookupError::Transport(
            "metric client not configured".to_string(),
        ))
    }
}
