use serde_json::{Map, Value};
use std::fs::File;
use std::io::Read;
use tracing::debug;

use super::file::resolve_path;

/// Read an actuals CSV file into one JSON object per row, keyed by header.
///
/// Every cell is kept as a string; the engine decides what is numeric.
pub fn read_actuals_csv(path: &str) -> Result<Vec<Map<String, Value>>, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let file = File::open(&resolved)
        .map_err(|e| format!("Failed to open '{}': {}", resolved.display(), e))?;
    let rows = read_actuals(file)
        .map_err(|e| format!("Failed to parse '{}': {}", resolved.display(), e))?;
    debug!(path = %resolved.display(), rows = rows.len(), "read actuals file");
    Ok(rows)
}

fn read_actuals<R: Read>(source: R) -> Result<Vec<Map<String, Value>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Map<String, Value> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let cell = record.get(i).unwrap_or_default();
                (header.to_string(), Value::String(cell.to_string()))
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
