//! Entry search for `docmap search`.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use docmap_core::{Docmap, DocmapConfig, SearchQuery};

use crate::output::emit;
use crate::read::ReadOptions;

/// Options for `docmap search`.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub kind: Option<String>,
    pub id: Option<String>,
    pub slug: Option<String>,
    pub namespace: Option<String>,
    pub read: ReadOptions,
}

impl SearchOptions {
    fn query(&self) -> SearchQuery {
        SearchQuery {
            kind: self.kind.clone(),
            id: self.id.clone(),
            slug: self.slug.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// Search the aggregated docmap and print the matches.
pub fn search_docmap(mut config: DocmapConfig, cwd: &Path, options: SearchOptions) -> Result<()> {
    options.read.apply(&mut config.read, cwd);

    let docmap = Docmap::from_config(config)
        .context("Invalid docmap settings")?
        .with_cwd(cwd);
    let result = docmap.search(&options.query()).context("Search failed")?;

    let output = options.read.output.as_ref().map(|p| cwd.join(p));
    emit(&result, output.as_deref())?;

    info!(matches = result.items.len(), "search complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_search_filters_entries() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"name":"site"}"#).unwrap();
        fs::write(
            tmp.path().join("docmap.json"),
            r#"{"map":{
                "site.a":{"name":"a","namespace":"site","type":"Function"},
                "site.b":{"name":"b","namespace":"site","type":"Object"}
            }}"#,
        )
        .unwrap();

        let options = SearchOptions {
            kind: Some("func*".to_string()),
            read: ReadOptions {
                output: Some(PathBuf::from("result.json")),
                ..ReadOptions::default()
            },
            ..SearchOptions::default()
        };
        search_docmap(DocmapConfig::load(tmp.path()).unwrap(), tmp.path(), options).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join("result.json")).unwrap()).unwrap();
        assert_eq!(written["search"]["type"], "func*");
        let items = written["items"].as_object().unwrap();
        assert_eq!(items.keys().collect::<Vec<_>>(), vec!["site.a"]);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("docmap.json"), r#"{"map":{}}"#).unwrap();
        let options = SearchOptions {
            id: Some("/(/".to_string()),
            ..SearchOptions::default()
        };
        assert!(search_docmap(DocmapConfig::load(tmp.path()).unwrap(), tmp.path(), options).is_err());
    }
}
