//! Process command - extract a draft transaction from a single receipt.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use recibo_core::{Category, DraftOverrides, ExtractionResult};

use super::output::{format_report, DraftReport, OutputFormat};
use super::{build_ingestor, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Abort if processing takes longer than this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(flatten)]
    overrides: OverrideArgs,

    /// Split the confirmed draft into this many monthly installments
    #[arg(long)]
    installments: Option<u32>,
}

/// User values that replace extracted ones.
#[derive(Args, Default)]
pub struct OverrideArgs {
    /// Description override
    #[arg(long)]
    description: Option<String>,

    /// Amount override, e.g. "1.234,56"
    #[arg(long)]
    amount: Option<String>,

    /// Date override (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Category override (Portuguese label or English name)
    #[arg(long)]
    category: Option<Category>,
}

impl From<OverrideArgs> for DraftOverrides {
    fn from(args: OverrideArgs) -> Self {
        DraftOverrides {
            description: args.description,
            amount: args.amount,
            date: args.date,
            category: args.category,
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Reading {}", args.input.display()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let input = args.input.clone();
    let model_dir = args.model_dir.clone();
    let task = tokio::task::spawn_blocking(move || -> anyhow::Result<ExtractionResult> {
        let ingestor = build_ingestor(config, model_dir.as_deref())?;
        Ok(recibo_core::process_file(&ingestor, &input)?)
    });

    let joined = match args.timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), task).await {
            Ok(joined) => joined,
            Err(_) => {
                pb.finish_and_clear();
                anyhow::bail!("Processing timed out after {}s", secs);
            }
        },
        None => task.await,
    };
    pb.finish_and_clear();
    let result = joined??;

    let report = DraftReport::new(Some(args.input.display().to_string()), result)
        .with_overrides(args.overrides.into())?
        .with_installments(args.installments)?;

    for warning in &report.warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }

    let output = format_report(&report, args.format)?;

    // Write output
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
