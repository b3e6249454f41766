//! Documentation entries and the persisted `docmap.json` format.

use docmap_pkg::PackageMeta;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::docblock::{Docblock, DocblockError, DocblockParser};
use crate::error::DocmapError;

/// Ordered id → entry table. Insertion order is processing order.
pub type EntryMap = IndexMap<String, Entry>;

/// Placement of an entry in the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuAnnotation {
    /// Display segments, outermost first.
    #[serde(default)]
    pub tree: Vec<String>,
    /// Routable identifier, normally starting with `/`.
    #[serde(default)]
    pub slug: String,
}

/// One documented unit: a function, class, setting, ...
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    /// Stable identifier, the key this entry is stored under.
    #[serde(default)]
    pub id: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Dotted namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Alternative display name.
    #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Source path relative to the owning `docmap.json` directory.
    #[serde(default, rename = "relPath", skip_serializing_if = "Option::is_none")]
    pub rel_path: Option<String>,

    /// Resolved absolute source path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Menu placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<MenuAnnotation>,

    /// Descriptor of the package that contributed this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageMeta>,

    /// True when contributed by a dependency rather than the root package.
    #[serde(default, rename = "isDependency")]
    pub is_dependency: bool,

    /// Every other documentation field (`type`, `param`, `example`, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,

    #[serde(skip)]
    source: Option<SourceReparse>,
}

impl Entry {
    /// The name shown in menus: the display name, falling back to the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// The name of the owning package, if stamped.
    #[must_use]
    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }

    /// A documentation field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The string value of a queryable field.
    ///
    /// `type` unwraps a `{ "raw": ... }` wrapper; `slug` falls back to the menu
    /// slug when the entry carries no top-level slug.
    #[must_use]
    pub fn query_value(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "id" => Some(Cow::Borrowed(self.id.as_str())),
            "name" => self.name.as_deref().map(Cow::Borrowed),
            "namespace" => self.namespace.as_deref().map(Cow::Borrowed),
            "type" => self.fields.get("type").and_then(|v| match v {
                Value::Object(obj) => obj.get("raw").and_then(Value::as_str).map(Cow::Borrowed),
                other => scalar_text(other),
            }),
            "slug" => self
                .fields
                .get("slug")
                .and_then(scalar_text)
                .or_else(|| self.menu.as_ref().map(|m| Cow::Borrowed(m.slug.as_str()))),
            other => self.fields.get(other).and_then(scalar_text),
        }
    }

    /// Bind the deferred reparse capability to this entry's resolved path.
    pub(crate) fn attach_source(&mut self, parser: Arc<dyn DocblockParser>) {
        if let Some(path) = &self.path {
            self.source = Some(SourceReparse {
                path: path.clone(),
                parser,
            });
        }
    }

    /// The deferred reparse capability, present once the entry is aggregated.
    #[must_use]
    pub fn source(&self) -> Option<&SourceReparse> {
        self.source.as_ref()
    }

    /// Re-parse the docblocks of this entry's source file.
    pub fn parse_docblocks_from_source(&self) -> Result<Vec<Docblock>, DocmapError> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| DocmapError::NoSourcePath(self.id.clone()))?;
        Ok(source.parse()?)
    }
}

fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// On-demand parse of one entry's source file.
#[derive(Clone)]
pub struct SourceReparse {
    path: PathBuf,
    parser: Arc<dyn DocblockParser>,
}

impl SourceReparse {
    /// The file that will be parsed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the docblock parser over the source file.
    pub fn parse(&self) -> Result<Vec<Docblock>, DocblockError> {
        self.parser.parse_file(&self.path)
    }
}

impl fmt::Debug for SourceReparse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceReparse")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// The `generated` section of a `docmap.json` produced by an uncommitted build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedSection {
    /// Freshly generated entries.
    #[serde(default)]
    pub map: EntryMap,
}

/// The persisted `docmap.json` of one package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocmapFile {
    /// Committed entries.
    #[serde(default)]
    pub map: EntryMap,

    /// Entries generated by a build pass and not yet committed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<GeneratedSection>,
}

impl DocmapFile {
    /// Read and parse a `docmap.json`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocmapError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DocmapError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| DocmapError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fold generated entries over committed ones and drop the generated section.
    ///
    /// Generated entries win on key collision; a new key keeps its generated
    /// position after the committed keys.
    pub fn fold_generated(&mut self) {
        if let Some(generated) = self.generated.take() {
            for (id, entry) in generated.map {
                self.map.insert(id, entry);
            }
        }
    }

    /// Serialize with four-space indentation.
    pub fn to_json_string(&self) -> Result<String, DocmapError> {
        to_pretty_json(self)
    }

    /// Write to `path`, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), DocmapError> {
        write_pretty_json(path.as_ref(), self)
    }
}

/// Serialize any value with four-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DocmapError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).map_err(DocmapError::Serialize)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub(crate) fn write_pretty_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), DocmapError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocmapError::write(parent, e))?;
    }
    let json = to_pretty_json(value)?;
    std::fs::write(path, json).map_err(|e| DocmapError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_keeps_unknown_fields() {
        let entry: Entry = serde_json::from_value(json!({
            "name": "button",
            "namespace": "ui.components",
            "relPath": "src/button.ts",
            "type": { "raw": "Function" },
            "status": "stable",
            "menu": { "tree": ["Components", "Button"], "slug": "/components/button" }
        }))
        .unwrap();

        assert_eq!(entry.name.as_deref(), Some("button"));
        assert_eq!(entry.rel_path.as_deref(), Some("src/button.ts"));
        assert_eq!(entry.field("status"), Some(&json!("stable")));
        assert_eq!(entry.query_value("type").as_deref(), Some("Function"));
        assert_eq!(entry.query_value("slug").as_deref(), Some("/components/button"));
        assert!(!entry.is_dependency);
    }

    #[test]
    fn query_value_plain_type_and_missing_fields() {
        let entry: Entry = serde_json::from_value(json!({ "type": "Class" })).unwrap();
        assert_eq!(entry.query_value("type").as_deref(), Some("Class"));
        assert!(entry.query_value("namespace").is_none());
        assert!(entry.query_value("slug").is_none());
    }

    #[test]
    fn fold_generated_prefers_generated_entries() {
        let mut file: DocmapFile = serde_json::from_value(json!({
            "map": {
                "x.y": { "name": "y", "description": "stale" },
                "x.z": { "name": "z" }
            },
            "generated": {
                "map": {
                    "x.y": { "name": "y", "description": "fresh" },
                    "x.w": { "name": "w" }
                }
            }
        }))
        .unwrap();

        file.fold_generated();

        assert!(file.generated.is_none());
        let keys: Vec<_> = file.map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["x.y", "x.z", "x.w"]);
        assert_eq!(file.map["x.y"].field("description"), Some(&json!("fresh")));
    }

    #[test]
    fn pretty_json_uses_four_spaces() {
        let file = DocmapFile::default();
        let json = file.to_json_string().unwrap();
        assert_eq!(json, "{\n    \"map\": {}\n}");
    }

    #[test]
    fn reparse_without_path_is_an_error() {
        let entry = Entry {
            id: "x.y".to_string(),
            ..Entry::default()
        };
        let err = entry.parse_docblocks_from_source().unwrap_err();
        assert!(matches!(err, DocmapError::NoSourcePath(id) if id == "x.y"));
    }
}
