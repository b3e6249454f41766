//! Loading one package's `docmap.json` into a merged entry table.

use docmap_pkg::{normalize_path, Ecosystem, PackageMeta};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::entry::{DocmapFile, EntryMap};
use crate::error::DocmapError;

/// Outcome of loading one `docmap.json`.
#[derive(Debug, Clone)]
pub struct LoadedPackage {
    /// Descriptor stamped on every entry of the file.
    pub meta: PackageMeta,
    /// Ids newly inserted into the table.
    pub inserted: usize,
    /// Ids skipped because an earlier package already provided them.
    pub shadowed: usize,
}

/// Load the `docmap.json` at `path` and merge its entries into `table`.
///
/// A missing file contributes nothing and returns `Ok(None)`. A dependency whose
/// manifest cannot be read is named after its directory. Entries whose id
/// is already present in `table` are discarded: the first package to provide
/// an id keeps it.
pub fn load_into(
    path: &Path,
    ecosystem: Ecosystem,
    is_dependency: bool,
    table: &mut EntryMap,
) -> Result<Option<LoadedPackage>, DocmapError> {
    if !path.is_file() {
        debug!(path = %path.display(), "docmap not found");
        return Ok(None);
    }

    let mut file = DocmapFile::from_path(path)?;
    file.fold_generated();

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let meta = match PackageMeta::load(dir, ecosystem) {
        Ok(Some(meta)) => meta,
        Ok(None) => PackageMeta::from_dir_name(dir),
        Err(err) if is_dependency => {
            warn!(error = %err, "unreadable dependency descriptor, naming package after its directory");
            PackageMeta::from_dir_name(dir)
        }
        Err(err) => return Err(err.into()),
    };

    let mut loaded = LoadedPackage {
        meta,
        inserted: 0,
        shadowed: 0,
    };

    for (id, mut entry) in file.map {
        if table.contains_key(&id) {
            debug!(id = %id, package = %loaded.meta.name, "entry already provided, skipping");
            loaded.shadowed += 1;
            continue;
        }

        entry.package = Some(loaded.meta.clone());
        entry.is_dependency = is_dependency;
        if let Some(rel) = &entry.rel_path {
            entry.path = Some(resolve_source_path(&normalize_path(&dir.join(rel))));
        }
        entry.id.clone_from(&id);

        table.insert(id, entry);
        loaded.inserted += 1;
    }

    debug!(
        path = %path.display(),
        package = %loaded.meta.name,
        inserted = loaded.inserted,
        shadowed = loaded.shadowed,
        "loaded docmap"
    );

    Ok(Some(loaded))
}

/// Prefer `<stem>.dev.<ext>`, then the path itself; keep the path when neither exists.
fn resolve_source_path(path: &Path) -> PathBuf {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let dev = path.with_extension(format!("dev.{ext}"));
        if dev.is_file() {
            return dev;
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn missing_file_contributes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut table = EntryMap::new();
        let loaded = load_into(&tmp.path().join("docmap.json"), Ecosystem::Npm, false, &mut table).unwrap();
        assert!(loaded.is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn stamps_package_and_resolves_paths() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(&root.join("package.json"), r#"{"name":"@acme/ui","version":"1.2.0"}"#);
        write(&root.join("src/button.ts"), "");
        write(&root.join("src/button.dev.ts"), "");
        write(&root.join("src/card.ts"), "");
        write(
            &root.join("docmap.json"),
            r#"{"map":{
                "ui.button": {"name":"button","relPath":"src/button.ts"},
                "ui.card": {"name":"card","relPath":"./src/../src/card.ts"},
                "ui.gone": {"name":"gone","relPath":"src/gone.ts"}
            }}"#,
        );

        let mut table = EntryMap::new();
        let loaded = load_into(&root.join("docmap.json"), Ecosystem::Npm, true, &mut table)
            .unwrap()
            .unwrap();

        assert_eq!(loaded.meta.name, "@acme/ui");
        assert_eq!(loaded.inserted, 3);
        let button = &table["ui.button"];
        assert_eq!(button.id, "ui.button");
        assert!(button.is_dependency);
        assert_eq!(button.package_name(), Some("@acme/ui"));
        assert_eq!(button.path.as_deref(), Some(root.join("src/button.dev.ts").as_path()));
        assert_eq!(table["ui.card"].path.as_deref(), Some(root.join("src/card.ts").as_path()));
        assert_eq!(table["ui.gone"].path.as_deref(), Some(root.join("src/gone.ts").as_path()));
    }

    #[test]
    fn first_writer_wins() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a/docmap.json");
        let b = tmp.path().join("b/docmap.json");
        write(&a, r#"{"map":{"x.y":{"name":"y","description":"from a"}}}"#);
        write(&b, r#"{"map":{"x.y":{"name":"y","description":"from b"},"x.z":{"name":"z"}}}"#);

        let mut table = EntryMap::new();
        load_into(&a, Ecosystem::Npm, false, &mut table).unwrap();
        let second = load_into(&b, Ecosystem::Npm, true, &mut table).unwrap().unwrap();

        assert_eq!(second.shadowed, 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table["x.y"].field("description").unwrap(), "from a");
        assert_eq!(table["x.y"].package_name(), Some("a"));
        assert!(!table["x.y"].is_dependency);
        assert!(table["x.z"].is_dependency);
    }

    #[test]
    fn generated_map_folds_over_committed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docmap.json");
        write(
            &path,
            r#"{"map":{"x.y":{"name":"old"}},"generated":{"map":{"x.y":{"name":"new"}}}}"#,
        );
        let mut table = EntryMap::new();
        load_into(&path, Ecosystem::Npm, false, &mut table).unwrap();
        assert_eq!(table["x.y"].name.as_deref(), Some("new"));
    }

    #[test]
    fn malformed_file_names_the_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docmap.json");
        write(&path, "{ not json");
        let err = load_into(&path, Ecosystem::Npm, false, &mut EntryMap::new()).unwrap_err();
        assert!(matches!(&err, DocmapError::Parse { path: p, .. } if p == &path));
    }

    #[test]
    fn composer_descriptor_for_composer_dependency() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(&root.join("package.json"), r#"{"name":"core-js-build"}"#);
        write(&root.join("composer.json"), r#"{"name":"acme/core"}"#);
        write(&root.join("docmap.json"), r#"{"map":{"a.b":{}}}"#);

        let mut table = EntryMap::new();
        let loaded = load_into(&root.join("docmap.json"), Ecosystem::Composer, true, &mut table)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.meta.name, "acme/core");
        assert_eq!(loaded.meta.ecosystem, Some(Ecosystem::Composer));
    }

    #[test]
    fn unreadable_dependency_descriptor_falls_back_to_dir_name() {
        let tmp = TempDir::new().unwrap();
        let dep = tmp.path().join("node_modules/broken-lib");
        write(&dep.join("package.json"), r#"{"name":"broken-lib","version":{"major":1}}"#);
        write(&dep.join("docmap.json"), r#"{"map":{"broken.a":{"name":"a"}}}"#);

        let mut table = EntryMap::new();
        let loaded = load_into(&dep.join("docmap.json"), Ecosystem::Npm, true, &mut table)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.meta.name, "broken-lib");
        assert!(loaded.meta.version.is_none());
        assert!(table["broken.a"].is_dependency);

        let err = load_into(&dep.join("docmap.json"), Ecosystem::Npm, false, &mut EntryMap::new())
            .unwrap_err();
        assert!(matches!(err, DocmapError::Manifest(_)));
    }
}
