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

/// Fields that render as `n/a` rather than `null` when undefined.
pub const UNDEFINED_AS_NA: &[&str] = &["irr"];

/// First array-of-objects field in a result, used as the detail rows of
/// table and CSV output.
pub fn detail_rows(map: &serde_json::Map<String, Value>) -> Option<(&str, &[Value])> {
    map.iter().find_map(|(key, val)| match val {
        Value::Array(arr) if arr.first().is_some_and(Value::is_object) => {
            Some((key.as_str(), arr.as_slice()))
        }
        _ => None,
    })
}
