pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Extract the row array worth tabulating from a command's output: the
/// ranked offers of a comparison, or the schedule rows of a single loan.
pub(crate) fn primary_rows(value: &Value) -> Option<&Vec<Value>> {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(Value::Array(offers)) = map.get("offers") {
                return Some(offers);
            }
            if let Some(Value::Array(rows)) = map.get("schedule") {
                return Some(rows);
            }
            None
        }
        Value::Array(arr) => Some(arr),
        _ => None,
    }
}
