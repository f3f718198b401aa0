//! Text command - extract a draft from text that is already available.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;

use recibo_core::ReceiptParser;

use super::load_config;
use super::output::{format_report, DraftReport, OutputFormat};
use super::process::OverrideArgs;

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Text file to read (default: stdin)
    input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    overrides: OverrideArgs,

    /// Split the confirmed draft into this many monthly installments
    #[arg(long)]
    installments: Option<u32>,
}

pub async fn run(args: TextArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let result = ReceiptParser::from_config(&config.extraction).parse(&text);
    let report = DraftReport::new(
        args.input.as_ref().map(|p| p.display().to_string()),
        result,
    )
    .with_overrides(args.overrides.into())?
    .with_installments(args.installments)?;

    println!("{}", format_report(&report, args.format)?);
    Ok(())
}
