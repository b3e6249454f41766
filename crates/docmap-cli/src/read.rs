//! Aggregation for `docmap read`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use docmap_core::{Docmap, DocmapConfig, ReadParams};

use crate::output::emit;

/// Options for `docmap read`, layered over the configuration.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Root docmap.json, relative to the working directory.
    pub input: Option<PathBuf>,

    /// Skip dependencies.
    pub no_dependencies: bool,

    /// Shallow sort paths; replace the configured ones when non-empty.
    pub sort: Vec<String>,

    /// Deep sort paths; replace the configured ones when non-empty.
    pub sort_deep: Vec<String>,

    /// Output file.
    pub output: Option<PathBuf>,
}

impl ReadOptions {
    /// Override `params` with the flags that were given.
    pub fn apply(&self, params: &mut ReadParams, cwd: &Path) {
        if let Some(input) = &self.input {
            params.input = cwd.join(input);
        }
        if self.no_dependencies {
            params.dependencies = false;
        }
        if !self.sort.is_empty() {
            params.sort.clone_from(&self.sort);
        }
        if !self.sort_deep.is_empty() {
            params.sort_deep.clone_from(&self.sort_deep);
        }
    }
}

/// Aggregate and print the docmap.
pub fn read_docmap(mut config: DocmapConfig, cwd: &Path, options: ReadOptions) -> Result<()> {
    options.apply(&mut config.read, cwd);

    let docmap = Docmap::from_config(config)
        .context("Invalid docmap settings")?
        .with_cwd(cwd);
    let index = docmap.read().context("Failed to read docmap")?;

    let output = options.output.map(|p| cwd.join(p));
    emit(&*index, output.as_deref())?;

    info!(
        entries = index.map.len(),
        packages = index.menu.as_ref().map_or(0, |m| m.packages.len()),
        "read complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_apply_overrides_only_given_flags() {
        let mut params = ReadParams::default();
        ReadOptions::default().apply(&mut params, Path::new("/work"));
        assert_eq!(params, ReadParams::default());

        let options = ReadOptions {
            input: Some(PathBuf::from("docs/docmap.json")),
            no_dependencies: true,
            sort_deep: vec!["menu".to_string()],
            ..ReadOptions::default()
        };
        options.apply(&mut params, Path::new("/work"));
        assert_eq!(params.input, PathBuf::from("/work/docs/docmap.json"));
        assert!(!params.dependencies);
        assert_eq!(params.sort, vec!["menu.packages"]);
        assert_eq!(params.sort_deep, vec!["menu"]);
    }

    #[test]
    fn test_read_writes_output_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"name":"site"}"#).unwrap();
        fs::write(
            tmp.path().join("docmap.json"),
            r#"{"map":{"site.a":{"name":"a","namespace":"site"}}}"#,
        )
        .unwrap();

        let config = DocmapConfig::load(tmp.path()).unwrap();
        let options = ReadOptions {
            output: Some(PathBuf::from("out.json")),
            ..ReadOptions::default()
        };
        read_docmap(config, tmp.path(), options).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join("out.json")).unwrap()).unwrap();
        assert_eq!(written["map"]["site.a"]["id"], "site.a");
        assert_eq!(written["map"]["site.a"]["package"]["name"], "site");
    }
}
