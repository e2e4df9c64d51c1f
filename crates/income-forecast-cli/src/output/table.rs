use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_cell, SCENARIOS, STATEMENT_COLUMNS};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                print_result(result);
                print_notes(map);
            }
            _ => print_field_table(map),
        },
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>) {
    if let (Some(projection), Some(Value::Object(summary))) =
        (result.get("projection"), result.get("summary"))
    {
        print_rows(projection.get("rows"), &STATEMENT_COLUMNS);
        println!();
        print_field_table(summary);
    } else if let (Some(scenarios), Some(sensitivity)) =
        (result.get("scenarios"), result.get("sensitivity"))
    {
        print_scenarios(scenarios, sensitivity);
    } else if let Some(variances) = result.get("variances") {
        print_rows(result.get("actuals"), &STATEMENT_COLUMNS);
        println!();
        print_rows(
            Some(variances),
            &[
                "month",
                "projected_sales",
                "actual_sales",
                "sales_variance",
                "projected_net_profit",
                "actual_net_profit",
                "net_profit_variance",
                "favorable",
                "projected_net_margin",
                "actual_net_margin",
            ],
        );
        if let Some(Value::Object(totals)) = result.get("totals") {
            println!();
            print_field_table(totals);
        }
    } else {
        print_field_table(result);
    }
}

fn print_scenarios(scenarios: &Value, sensitivity: &Value) {
    for name in SCENARIOS {
        let Some(projection) = scenarios.get(name) else {
            continue;
        };
        let rate = projection
            .get("effective_growth_rate")
            .map(|r| format_cell(r, false))
            .unwrap_or_default();
        println!("{} (growth {})", capitalize(name), rate);
        print_rows(projection.get("rows"), &STATEMENT_COLUMNS);
        println!();
    }

    let mut builder = Builder::default();
    builder.push_record([
        "Scenario",
        "Growth",
        "Total sales",
        "Total net profit",
        "Net margin",
        "Best month",
        "Worst month",
    ]);
    for name in SCENARIOS {
        if let Some(m) = sensitivity.get(name) {
            builder.push_record([
                capitalize(name),
                cell(m, "effective_growth_rate"),
                cell(m, "total_sales"),
                cell(m, "total_net_profit"),
                cell(m, "net_margin"),
                extreme(m.get("best_month")),
                extreme(m.get("worst_month")),
            ]);
        }
    }
    println!("{}", Table::from(builder));

    if let Some(Value::Object(range)) = sensitivity.get("annual_range") {
        println!();
        print_field_table(range);
    }
    println!();
    print_rows(
        sensitivity.get("monthly_spread"),
        &["month", "pessimistic", "realistic", "optimistic", "spread"],
    );
}

/// Table of the listed columns over an array of objects.
fn print_rows(rows: Option<&Value>, columns: &[&str]) {
    let Some(Value::Array(rows)) = rows else {
        println!("(empty)");
        return;
    };
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().copied());
    for row in rows {
        builder.push_record(columns.iter().map(|c| cell(row, c)));
    }
    println!("{}", Table::from(builder));
}

fn print_field_table(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        let shown = match val {
            Value::Object(_) if val.get("month").is_some() => extreme(Some(val)),
            _ => format_cell(val, true),
        };
        builder.push_record([key.clone(), shown]);
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn cell(row: &Value, column: &str) -> String {
    row.get(column)
        .map(|v| format_cell(v, true))
        .unwrap_or_default()
}

/// "Dic (12345.67)" for a best/worst month object.
fn extreme(value: Option<&Value>) -> String {
    match value {
        Some(v) => format!("{} ({})", cell(v, "month"), cell(v, "net_profit")),
        None => String::new(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extreme_cell() {
        let v = json!({ "month": "Dic", "net_profit": "1234.5678", "is_loss": false });
        assert_eq!(extreme(Some(&v)), "Dic (1234.57)");
        assert_eq!(extreme(None), "");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("pessimistic"), "Pessimistic");
        assert_eq!(capitalize(""), "");
    }
}
