use serde_json::Value;
use std::io::{self, Read};

/// Assumptions document piped on stdin, or `None` when stdin is a terminal
/// or carries nothing but whitespace.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| format!("Failed to read stdin: {e}"))?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(trimmed).map_err(|e| format!("stdin is not valid JSON: {e}"))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_means_no_document() {
        assert!(parse_piped("").unwrap().is_none());
        assert!(parse_piped(" \n\t").unwrap().is_none());
    }

    #[test]
    fn test_piped_document_is_parsed() {
        let value = parse_piped("\n{\"tax_rate\": \"0.25\"}\n").unwrap().unwrap();
        assert_eq!(value["tax_rate"], "0.25");
    }

    #[test]
    fn test_malformed_document_is_reported() {
        let err = parse_piped("initial_sales=100").unwrap_err();
        assert!(err.to_string().starts_with("stdin is not valid JSON"));
    }
}
