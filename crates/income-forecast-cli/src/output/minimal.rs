use serde_json::Value;

use super::format_cell;

/// Headline figures, printed in this order when present.
const KEY_FIGURES: [(&str, &str); 4] = [
    ("/summary/total_net_profit", "total_net_profit"),
    ("/sensitivity/realistic/total_net_profit", "total_net_profit"),
    ("/sensitivity/annual_range/range", "range"),
    ("/totals/net_profit", "net_profit"),
];

/// Print just the headline figures from the output.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);

    let mut printed = false;
    for (pointer, label) in KEY_FIGURES {
        if let Some(val) = result.pointer(pointer) {
            if !val.is_null() {
                println!("{}: {}", label, format_cell(val, true));
                printed = true;
            }
        }
    }
    if printed {
        return;
    }

    // Fall back to the first field
    if let Some((key, val)) = result.as_object().and_then(|m| m.iter().next()) {
        println!("{}: {}", key, format_cell(val, true));
        return;
    }
    println!("{}", format_cell(result, true));
}
