mod pipeline;
mod registry;
mod workspace;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use empirica_core::Error as CoreError;
use empirica_generate::{GenerationError, Variant};
use empirica_report::{PlotError, ReportError};
use empirica_stats::StatsError;
use registry::{LogVerbosity, init_logging};
use thiserror::Error;
use workspace::{AnalysisConfig, DEFAULT_CONFIG_FILE, RunManifest, load_config};

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("workspace error: {0}")]
    Workspace(#[from] workspace::WorkspaceError),
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("statistics error: {0}")]
    Stats(#[from] StatsError),
    #[error("report error: {0}")]
    Report(#[from] ReportError),
    #[error("figure error: {0}")]
    Plot(#[from] PlotError),
}

#[derive(Parser, Debug)]
#[command(
    name = "empirica",
    version,
    about = "Reproducible research analysis: synthetic data, statistics, LaTeX tables and figures"
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Increase log detail on stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log warnings and errors on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full analysis: statistics, figures and LaTeX tables.
    Analyze(AnalyzeArgs),
    /// Load (or generate) data, validate it and write derived variables.
    Process(ProcessArgs),
    /// Write a seeded synthetic dataset to CSV.
    Generate(GenerateArgs),
    /// Write the default configuration file.
    InitConfig(InitConfigArgs),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Analyze(_) => "analyze",
            Command::Process(_) => "process",
            Command::Generate(_) => "generate",
            Command::InitConfig(_) => "init-config",
        }
    }
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Input CSV (defaults to paths.raw_data).
    #[arg(long, value_name = "CSV")]
    data: Option<PathBuf>,
    /// Directory for LaTeX tables.
    #[arg(long)]
    tables_dir: Option<PathBuf>,
    /// Directory for figures.
    #[arg(long)]
    figures_dir: Option<PathBuf>,
    /// Skip figure rendering.
    #[arg(long, default_value_t = false)]
    no_figures: bool,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input CSV (defaults to paths.raw_data).
    #[arg(long, value_name = "CSV")]
    data: Option<PathBuf>,
    /// Directory for processed_data.csv.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Number of rows.
    #[arg(long)]
    rows: Option<usize>,
    /// Random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Dataset layout: sample or fake.
    #[arg(long)]
    variant: Option<Variant>,
    /// Output CSV (defaults to paths.raw_data).
    #[arg(long, value_name = "CSV")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InitConfigArgs {
    /// Replace an existing file.
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = match cli.command {
        Command::InitConfig(_) => AnalysisConfig::default(),
        _ => load_config(&config_path)?,
    };

    init_logging(
        LogVerbosity::from_flags(cli.verbose, cli.quiet),
        Some(&config.paths.logs_dir),
    )?;

    let mut manifest = RunManifest::start(cli.command.name(), &config_path);
    tracing::info!(
        event = "run_started",
        run_id = %manifest.run_id,
        command = cli.command.name(),
        config = %config_path.display()
    );

    let result = dispatch(cli.command, config.clone(), &config_path, &mut manifest);

    manifest.finish(result.as_ref().err().map(ToString::to_string));
    match (manifest.write(&config.paths.logs_dir), result) {
        (Ok(path), result) => {
            tracing::info!(
                event = "run_finished",
                status = ?manifest.status,
                manifest = %path.display()
            );
            result
        }
        (Err(err), Ok(())) => Err(err.into()),
        (Err(err), Err(original)) => {
            tracing::warn!(error = %err, "failed to write run manifest");
            Err(original)
        }
    }
}

fn dispatch(
    command: Command,
    mut config: AnalysisConfig,
    config_path: &std::path::Path,
    manifest: &mut RunManifest,
) -> Result<(), CliError> {
    match command {
        Command::Analyze(args) => {
            if let Some(data) = args.data {
                config.paths.raw_data = data;
            }
            if let Some(dir) = args.tables_dir {
                config.paths.tables_dir = dir;
            }
            if let Some(dir) = args.figures_dir {
                config.paths.figures_dir = dir;
            }
            if args.no_figures {
                config.figures.enabled = false;
            }
            pipeline::analyze(&config, manifest)
        }
        Command::Process(args) => {
            if let Some(data) = args.data {
                config.paths.raw_data = data;
            }
            if let Some(dir) = args.out_dir {
                config.paths.processed_dir = dir;
            }
            pipeline::process(&config, manifest)
        }
        Command::Generate(args) => {
            if let Some(rows) = args.rows {
                config.generate.rows = rows;
            }
            if let Some(seed) = args.seed {
                config.generate.seed = seed;
            }
            if let Some(variant) = args.variant {
                config.generate.variant = variant;
            }
            let out = args.out.unwrap_or_else(|| config.paths.raw_data.clone());
            pipeline::generate(&config, &out, manifest)
        }
        Command::InitConfig(args) => pipeline::init_config(config_path, args.force, manifest),
    }
}
