pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Statement line items in display order.
pub const STATEMENT_COLUMNS: [&str; 10] = [
    "month",
    "sales",
    "cost_of_sales",
    "gross_profit",
    "operating_expense",
    "ebit",
    "financial_expense",
    "pre_tax_profit",
    "taxes",
    "net_profit",
];

pub const SCENARIOS: [&str; 3] = ["optimistic", "realistic", "pessimistic"];

/// Render a cell. Decimals arrive as strings and are shown to two places;
/// `rounded` is false for exact output such as CSV.
pub fn format_cell(value: &Value, rounded: bool) -> String {
    match value {
        Value::String(s) if rounded => match Decimal::from_str(s) {
            Ok(d) => d.round_dp(2).to_string(),
            Err(_) => s.clone(),
        },
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr
            .iter()
            .map(|v| format_cell(v, rounded))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_strings_round_for_display() {
        assert_eq!(format_cell(&json!("51500.0000"), true), "51500.00");
        assert_eq!(format_cell(&json!("0.123456"), true), "0.12");
        assert_eq!(format_cell(&json!("0.123456"), false), "0.123456");
    }

    #[test]
    fn test_labels_and_nulls() {
        assert_eq!(format_cell(&json!("Ene"), true), "Ene");
        assert_eq!(format_cell(&Value::Null, true), "");
        assert_eq!(format_cell(&json!(true), false), "true");
    }
}
