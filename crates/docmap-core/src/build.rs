//! The build pass: scan a package's sources for docblocks and produce its `docmap.json`.

use fancy_regex::Regex as TagRegex;
use indexmap::IndexSet;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::BuildParams;
use crate::docblock::{Docblock, DocblockParser};
use crate::entry::{write_pretty_json, DocmapFile, Entry, EntryMap, GeneratedSection};
use crate::error::DocmapError;
use crate::mdx::to_mdx;
use crate::tags::TagRegistry;

/// Result of a build pass.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// The committed map plus the freshly generated one.
    pub file: DocmapFile,
    /// Number of source files parsed.
    pub files_parsed: usize,
    /// Files written to disk.
    pub written: Vec<PathBuf>,
}

/// Replace characters not allowed in an id and collapse repeated dots.
#[must_use]
pub fn namespace_compliant(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '/' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    replaced
        .split('.')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Scans one package root.
pub struct Builder<'a> {
    root: &'a Path,
    params: &'a BuildParams,
    parser: &'a dyn DocblockParser,
    tags: &'a TagRegistry,
    exclude: Vec<glob::Pattern>,
    tag_filters: Vec<(String, Vec<TagRegex>)>,
}

impl<'a> Builder<'a> {
    pub fn new(
        root: &'a Path,
        params: &'a BuildParams,
        parser: &'a dyn DocblockParser,
        tags: &'a TagRegistry,
    ) -> Result<Self, DocmapError> {
        let exclude = params
            .exclude
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| DocmapError::Glob {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;

        let mut tag_filters = Vec::new();
        for (tag, patterns) in &params.exclude_by_tags {
            let compiled = patterns
                .iter()
                .map(|pattern| {
                    TagRegex::new(pattern).map_err(|source| DocmapError::TagFilter {
                        tag: tag.clone(),
                        pattern: pattern.clone(),
                        source: Box::new(source),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            tag_filters.push((tag.clone(), compiled));
        }

        Ok(Self {
            root,
            params,
            parser,
            tags,
            exclude,
            tag_filters,
        })
    }

    /// Run the pass, writing outputs when `save` is set.
    pub fn run(&self) -> Result<BuildReport, DocmapError> {
        let existing = self.root.join(docmap_pkg::DOCMAP_FILE);
        let mut file = if existing.is_file() {
            DocmapFile::from_path(&existing)?
        } else {
            DocmapFile::default()
        };

        let out_path = self
            .params
            .out_path
            .clone()
            .unwrap_or_else(|| existing.clone());

        if self.params.clear {
            if let Some(dir) = &self.params.out_dir {
                remove_if_exists(dir, true)?;
            }
            remove_if_exists(&out_path, false)?;
        }

        let files = self.collect_files()?;
        info!(count = files.len(), root = %self.root.display(), "found files to parse");

        let mut entries = EntryMap::new();
        for path in &files {
            self.process_file(path, &mut entries)?;
        }
        info!(count = entries.len(), "entries gathered");

        file.generated = Some(GeneratedSection { map: entries });

        let mut written = Vec::new();
        if self.params.save {
            if let (Some(out_dir), Some(generated)) = (&self.params.out_dir, &file.generated) {
                for entry in generated.map.values() {
                    written.extend(self.save_entry(out_dir, entry)?);
                }
            }
            file.write(&out_path)?;
            info!(path = %out_path.display(), "docmap saved");
            written.push(out_path);
        }

        Ok(BuildReport {
            file,
            files_parsed: files.len(),
            written,
        })
    }

    /// Expand the globs under the root, drop excluded paths and duplicates.
    fn collect_files(&self) -> Result<Vec<PathBuf>, DocmapError> {
        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let root = glob::Pattern::escape(&self.root.to_string_lossy());

        let mut files = IndexSet::new();
        for pattern in &self.params.globs {
            let full = format!("{root}/{pattern}");
            let paths = glob::glob_with(&full, options).map_err(|source| DocmapError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            for path in paths.filter_map(Result::ok).filter(|p| p.is_file()) {
                let Ok(rel) = path.strip_prefix(self.root) else {
                    continue;
                };
                if self.exclude.iter().any(|p| p.matches_path_with(rel, options)) {
                    debug!(path = %rel.display(), "excluded");
                    continue;
                }
                files.insert(path);
            }
        }
        Ok(files.into_iter().collect())
    }

    fn process_file(&self, path: &Path, entries: &mut EntryMap) -> Result<(), DocmapError> {
        let rel = path.strip_prefix(self.root).unwrap_or(path);
        debug!(path = %rel.display(), "parsing");

        let blocks = match self.parser.parse_file(path) {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!(path = %rel.display(), error = %e, "skipping unparsable file");
                return Ok(());
            }
        };

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut file_entry: Option<String> = None;
        let mut children = Map::new();

        for block in &blocks {
            if self.excluded_by_tags(block) {
                continue;
            }
            let name = block.name();
            if name.is_some_and(|n| n.starts_with('_')) || block.is_private() {
                continue;
            }

            let fields = self.allowed_fields(block);

            match (block.namespace(), name) {
                (Some(namespace), _)
                    if !entries.contains_key(&id_for(namespace, name.unwrap_or_default())) =>
                {
                    let id = id_for(namespace, name.unwrap_or_default());
                    let mut object = fields;
                    object.insert("filename".to_string(), Value::String(filename.clone()));
                    object.insert("extension".to_string(), Value::String(extension.clone()));
                    object.insert(
                        "relPath".to_string(),
                        Value::String(rel.to_string_lossy().replace('\\', "/")),
                    );
                    let mut entry: Entry = serde_json::from_value(Value::Object(object))
                        .map_err(|source| DocmapError::InvalidEntry {
                            id: id.clone(),
                            source,
                        })?;
                    entry.id.clone_from(&id);
                    entries.insert(id.clone(), entry);
                    file_entry = Some(id);
                }
                (_, Some(name)) => {
                    children.insert(name.to_lowercase(), Value::Object(fields));
                }
                (_, None) => {}
            }
        }

        if children.is_empty() {
            return Ok(());
        }
        let parent = match &file_entry {
            Some(id) => entries.get_mut(id),
            None => None,
        };
        match parent {
            Some(entry) => {
                entry
                    .fields
                    .insert("children".to_string(), Value::Object(children));
            }
            None => debug!(path = %rel.display(), "children without a parent entry dropped"),
        }
        Ok(())
    }

    /// True when any configured pattern matches the string value of its tag.
    fn excluded_by_tags(&self, block: &Docblock) -> bool {
        self.tag_filters.iter().any(|(tag, patterns)| {
            let Some(value) = block.get(tag).and_then(filter_text) else {
                return false;
            };
            patterns
                .iter()
                .any(|re| matches!(re.is_match(&value), Ok(true)))
        })
    }

    /// The allow-listed tags of a block, each passed through its proxy.
    fn allowed_fields(&self, block: &Docblock) -> Map<String, Value> {
        self.params
            .tags
            .iter()
            .filter_map(|tag| {
                block
                    .get(tag)
                    .map(|value| (tag.clone(), self.tags.apply(tag, value.clone())))
            })
            .collect()
    }

    fn save_entry(&self, out_dir: &Path, entry: &Entry) -> Result<Vec<PathBuf>, DocmapError> {
        let base = out_dir.join(entry.id.replace('.', "/"));
        let mut written = Vec::new();

        if self.params.json {
            let path = base.with_extension("json");
            write_pretty_json(&path, entry)?;
            written.push(path);
        }
        if self.params.mdx {
            let path = base.with_extension("mdx");
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| DocmapError::write(parent, e))?;
            }
            std::fs::write(&path, to_mdx(entry)).map_err(|e| DocmapError::write(&path, e))?;
            written.push(path);
        }
        Ok(written)
    }
}

fn id_for(namespace: &str, name: &str) -> String {
    namespace_compliant(&format!("{namespace}.{name}"))
}

/// The text an exclude-by-tags pattern is matched against.
fn filter_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(obj) => obj.get("raw").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn remove_if_exists(path: &Path, dir: bool) -> Result<(), DocmapError> {
    let result = if dir {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(DocmapError::write(path, e)),
        _ => Ok(()),
    }
}
