use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use finquote_core::normalize::{self, RawLoanInput};
use finquote_core::offer::RateOverride;
use finquote_core::types::Lender;
use finquote_core::validation;

use crate::input;

/// Arguments for input normalization and validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON input file with raw field values, the lender catalog,
    /// and per-lender overrides
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct ValidateRequest {
    raw: RawLoanInput,
    #[serde(default)]
    lenders: Vec<Lender>,
    #[serde(default)]
    overrides: Vec<Option<RateOverride>>,
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ValidateRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for validation".into());
    };

    if !request.overrides.is_empty() && request.overrides.len() != request.lenders.len() {
        return Err(format!(
            "expected one override slot per lender ({}), got {}",
            request.lenders.len(),
            request.overrides.len()
        )
        .into());
    }

    let normalized = normalize::normalize(&request.raw);
    let outcome = validation::validate(&normalized, &request.lenders, &request.overrides);

    let (status, error) = match outcome {
        Ok(()) => ("ok".to_string(), Value::Null),
        Err(e) => ("error".to_string(), Value::String(e.to_string())),
    };

    Ok(serde_json::json!({
        "status": status,
        "error": error,
        "request": normalized,
    }))
}
