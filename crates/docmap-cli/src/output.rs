//! JSON output for `docmap read` and `docmap search`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write `value` as four-space indented JSON to `output`, or stdout when `None`.
pub fn emit<T: Serialize + ?Sized>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = docmap_core::entry::to_pretty_json(value).context("Failed to serialize output")?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create '{}'", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write '{}'", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("Failed to write to stdout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_emit_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/docmap.json");
        emit(&json!({ "map": {} }), Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n    \"map\": {}\n}");
    }
}
