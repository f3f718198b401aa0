//! Parse-amount command - check how a Brazilian amount is read.

use clap::Args;

use recibo_core::receipt::parse_locale_amount;

/// Arguments for the parse-amount command.
#[derive(Args)]
pub struct ParseAmountArgs {
    /// Amount as typed, e.g. "R$ 1.234,56"
    value: String,

    /// Print in Brazilian format instead of plain decimal
    #[arg(long)]
    display: bool,
}

pub async fn run(args: ParseAmountArgs) -> anyhow::Result<()> {
    let amount = parse_locale_amount(&args.value)?;

    if args.display {
        println!("{}", amount);
    } else {
        println!("{}", amount.value());
    }

    Ok(())
}
