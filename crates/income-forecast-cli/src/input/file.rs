use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Read an assumptions document from a JSON file.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("'{}' is not valid JSON: {}", resolved.display(), e))?;
    debug!(path = %resolved.display(), "read assumptions file");
    Ok(value)
}

/// Canonicalize the path so `..` segments and symlinks are resolved before
/// anything is opened, preventing directory traversal from hiding behind a
/// relative path. Errors and logs name the real file.
pub fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let resolved = fs::canonicalize(path).map_err(|e| format!("File not found: {path} ({e})"))?;
    if !resolved.is_file() {
        return Err(format!("Not a file: {}", resolved.display()).into());
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("ifc-input-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_dot_segments_are_resolved() {
        let path = scratch_file("assumptions.json", r#"{"initial_sales": "100"}"#);
        let dir = path.parent().unwrap();
        let dotted = dir.join("..").join(dir.file_name().unwrap()).join("assumptions.json");

        let resolved = resolve_path(dotted.to_str().unwrap()).unwrap();
        assert!(!resolved.components().any(|c| c.as_os_str() == ".."));
        assert_eq!(resolved, fs::canonicalize(&path).unwrap());
    }

    #[test]
    fn test_missing_file_and_directory_rejected() {
        let err = resolve_path("does/not/exist.json").unwrap_err();
        assert!(err.to_string().starts_with("File not found"));

        let dir = env::temp_dir();
        let err = resolve_path(dir.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().starts_with("Not a file"));
    }

    #[test]
    fn test_invalid_json_names_the_file() {
        let path = scratch_file("broken.json", "{ not json");
        let err = read_json_value(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
        assert!(err.to_string().contains("not valid JSON"));
    }
}
