use serde_json::Value;
use std::io;

use super::{format_cell, SCENARIOS, STATEMENT_COLUMNS};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Projections and actuals come out as one record per month; scenario runs
/// prefix each record with the scenario name. Values are exact.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value.get("result").unwrap_or(value);

    if let Some(rows) = result.pointer("/projection/rows") {
        write_rows(&mut wtr, None, rows, &STATEMENT_COLUMNS, true);
    } else if let Some(scenarios) = result.get("scenarios") {
        let mut header = vec!["scenario"];
        header.extend(STATEMENT_COLUMNS);
        let _ = wtr.write_record(&header);
        for name in SCENARIOS {
            if let Some(rows) = scenarios.pointer(&format!("/{name}/rows")) {
                write_rows(&mut wtr, Some(name), rows, &STATEMENT_COLUMNS, false);
            }
        }
    } else if let Some(variances) = result.get("variances") {
        write_rows(
            &mut wtr,
            None,
            variances,
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
            true,
        );
    } else if let Value::Object(map) = result {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in map {
            let _ = wtr.write_record([key.as_str(), &format_cell(val, false)]);
        }
    } else {
        let _ = wtr.write_record([&format_cell(result, false)]);
    }

    let _ = wtr.flush();
}

fn write_rows(
    wtr: &mut StdoutWriter<'_>,
    scenario: Option<&str>,
    rows: &Value,
    columns: &[&str],
    with_header: bool,
) {
    let Value::Array(rows) = rows else {
        return;
    };
    if with_header {
        let _ = wtr.write_record(columns);
    }
    for row in rows {
        let mut record: Vec<String> = Vec::with_capacity(columns.len() + 1);
        if let Some(name) = scenario {
            record.push(name.to_string());
        }
        record.extend(
            columns
                .iter()
                .map(|c| row.get(*c).map(|v| format_cell(v, false)).unwrap_or_default()),
        );
        let _ = wtr.write_record(&record);
    }
}
