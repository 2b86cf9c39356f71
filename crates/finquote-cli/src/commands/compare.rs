use clap::Args;
use serde_json::Value;

use finquote_core::offer::{self, ComparisonInput};

use crate::input;

/// Arguments for multi-lender offer comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file with the lender catalog, loan request,
    /// per-lender overrides, and optional lender-id subset
    #[arg(long)]
    pub input: Option<String>,

    /// Drop the per-row schedules from the output (summary metrics only)
    #[arg(long)]
    pub summary: bool,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison: ComparisonInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for offer comparison".into());
    };

    let mut result = offer::compare_offers(&comparison)?;
    if args.summary {
        for ranked in &mut result.result.offers {
            ranked.schedule.clear();
        }
    }
    Ok(serde_json::to_value(result)?)
}
