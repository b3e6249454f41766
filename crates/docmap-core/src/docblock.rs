//! Docblock parsing.
//!
//! A docblock is one `/** ... */` comment split into tags. Each tag's raw text
//! is shaped into a JSON value according to its [`TagKind`] in the
//! [`TagRegistry`]:
//!
//! ```text
//! /**
//!  * Create a button element.
//!  *
//!  * @name        button
//!  * @namespace   ui.components
//!  * @type        Function
//!  * @param       {String}   [label='Ok']   The button label
//!  * @menu        Components / Button   /components/button
//!  * @example     js
//!  * button('Save');
//!  */
//! ```

use docmap_pkg::Author;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tags::{TagKind, TagRegistry};

/// Errors raised while parsing docblocks.
#[derive(Error, Debug)]
pub enum DocblockError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unterminated docblock in '{}' starting at line {line}", .path.display())]
    Unterminated { path: PathBuf, line: usize },
}

/// Produces docblocks from a source file.
pub trait DocblockParser: Send + Sync {
    /// Parse every docblock of the file at `path`, in source order.
    fn parse_file(&self, path: &Path) -> Result<Vec<Docblock>, DocblockError>;
}

/// One parsed docblock: tag name → shaped value, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Docblock {
    pub tags: IndexMap<String, Value>,
}

impl Docblock {
    /// A tag value.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Value> {
        self.tags.get(tag)
    }

    /// A tag value as a string, when it is one.
    #[must_use]
    pub fn get_str(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).and_then(Value::as_str)
    }

    /// The `@name` tag.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    /// The `@namespace` tag.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.get_str("namespace")
    }

    /// Returns true if the block is marked `@private`.
    #[must_use]
    pub fn is_private(&self) -> bool {
        matches!(self.tags.get("private"), Some(Value::Bool(true)))
    }
}

/// Text following the first `/**` that opens a docblock on `line`.
///
/// The opener must be followed by whitespace or end the line, so `/***` rulers
/// and globs such as `src/**/*.ts` are skipped.
fn block_opening(line: &str) -> Option<&str> {
    line.match_indices("/**").find_map(|(start, _)| {
        let after = &line[start + 3..];
        (after.is_empty() || after.starts_with(char::is_whitespace)).then_some(after)
    })
}

/// Parser for `/** ... */` comment blocks, available for any text file.
#[derive(Debug, Clone, Default)]
pub struct CommentParser {
    registry: TagRegistry,
}

impl CommentParser {
    /// Create a parser shaping tags with `registry`.
    #[must_use]
    pub fn new(registry: TagRegistry) -> Self {
        Self { registry }
    }

    /// Parse the docblocks of `source`. `origin` only names the file in errors.
    pub fn parse_source(&self, source: &str, origin: &Path) -> Result<Vec<Docblock>, DocblockError> {
        let mut blocks = Vec::new();
        let mut current: Option<(usize, Vec<String>)> = None;

        for (idx, line) in source.lines().enumerate() {
            match current.as_mut() {
                None => {
                    let Some(after) = block_opening(line) else {
                        continue;
                    };
                    if let Some(end) = after.find("*/") {
                        blocks.push(self.shape(&[strip_comment_prefix(&after[..end])]));
                    } else {
                        let mut lines = Vec::new();
                        let first = strip_comment_prefix(after);
                        if !first.trim().is_empty() {
                            lines.push(first);
                        }
                        current = Some((idx + 1, lines));
                    }
                }
                Some((_, lines)) => {
                    if let Some(end) = line.find("*/") {
                        let last = strip_comment_prefix(&line[..end]);
                        if !last.trim().is_empty() {
                            lines.push(last);
                        }
                        blocks.push(self.shape(lines));
                        current = None;
                    } else {
                        lines.push(strip_comment_prefix(line));
                    }
                }
            }
        }

        if let Some((line, _)) = current {
            return Err(DocblockError::Unterminated {
                path: origin.to_path_buf(),
                line,
            });
        }

        Ok(blocks)
    }

    fn shape(&self, lines: &[String]) -> Docblock {
        let mut block = Docblock::default();
        let mut description: Vec<&str> = Vec::new();
        let mut open: Option<(String, String, Vec<&str>)> = None;

        for line in lines {
            let trimmed = line.trim();
            if let Some(tag_line) = trimmed.strip_prefix('@') {
                if let Some((tag, head, body)) = open.take() {
                    self.apply(&mut block, &tag, &head, &body);
                }
                let (tag, head) = tag_line
                    .split_once(char::is_whitespace)
                    .unwrap_or((tag_line, ""));
                open = Some((tag.to_string(), head.trim().to_string(), Vec::new()));
            } else if let Some((_, _, body)) = open.as_mut() {
                body.push(line.as_str());
            } else {
                description.push(trimmed);
            }
        }
        if let Some((tag, head, body)) = open.take() {
            self.apply(&mut block, &tag, &head, &body);
        }

        let text = description.join("\n").trim().to_string();
        if !text.is_empty() && !block.tags.contains_key("description") {
            block
                .tags
                .shift_insert(0, "description".to_string(), Value::String(text));
        }

        block
    }

    fn apply(&self, block: &mut Docblock, tag: &str, head: &str, body: &[&str]) {
        let text = join_text(head, body);

        match self.registry.kind_of(tag) {
            TagKind::Text => {
                block.tags.insert(tag.to_string(), Value::String(text));
            }
            TagKind::Flag => {
                block
                    .tags
                    .insert(tag.to_string(), Value::Bool(text != "false"));
            }
            TagKind::Typed => {
                let (ty, _) = split_type(&text);
                let raw = ty.unwrap_or(text.as_str());
                block.tags.insert(tag.to_string(), json!({ "raw": raw }));
            }
            TagKind::Params => {
                let param = parse_param(&text);
                let name = param
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                insert_into_object(block, tag, name, Value::Object(param));
            }
            TagKind::Return => {
                let (ty, rest) = split_type(&text);
                let mut value = Map::new();
                if let Some(ty) = ty {
                    value.insert("type".to_string(), json!({ "raw": ty }));
                }
                value.insert("description".to_string(), Value::String(rest.to_string()));
                block.tags.insert(tag.to_string(), Value::Object(value));
            }
            TagKind::Examples => {
                let language = head.split_whitespace().next().unwrap_or_default();
                let code = dedent(body);
                push_to_list(block, tag, json!({ "language": language, "code": code }));
            }
            TagKind::Author => {
                block
                    .tags
                    .insert(tag.to_string(), author_value(&Author::parse(&text)));
            }
            TagKind::People => {
                push_to_list(block, tag, author_value(&Author::parse(&text)));
            }
            TagKind::NamedList => {
                let (name, description) = text
                    .split_once(char::is_whitespace)
                    .map_or((text.as_str(), ""), |(n, d)| (n, d.trim()));
                push_to_list(block, tag, json!({ "name": name, "description": description }));
            }
            TagKind::Notes => {
                push_to_list(block, tag, json!({ "description": text }));
            }
            TagKind::Menu => {
                let (tree, slug) = parse_menu(&text);
                block
                    .tags
                    .insert(tag.to_string(), json!({ "tree": tree, "slug": slug }));
            }
        }
    }
}

impl DocblockParser for CommentParser {
    fn parse_file(&self, path: &Path) -> Result<Vec<Docblock>, DocblockError> {
        let source = std::fs::read_to_string(path).map_err(|source| DocblockError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_source(&source, path)
    }
}

/// Strip the ` * ` gutter of a comment line, keeping indentation after it.
fn strip_comment_prefix(line: &str) -> String {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('*') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest).trim_end().to_string(),
        None => trimmed.trim_end().to_string(),
    }
}

fn join_text(head: &str, body: &[&str]) -> String {
    std::iter::once(head)
        .chain(body.iter().map(|l| l.trim()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Remove the common leading indentation and surrounding blank lines.
fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

/// Split a leading `{Type}` annotation from the rest of the text.
fn split_type(text: &str) -> (Option<&str>, &str) {
    let trimmed = text.trim_start();
    if let Some(inner) = trimmed.strip_prefix('{') {
        if let Some(end) = inner.find('}') {
            return (Some(inner[..end].trim()), inner[end + 1..].trim());
        }
    }
    (None, trimmed)
}

/// `{Type} [name=default] description` or `{Type} name description`.
fn parse_param(text: &str) -> Map<String, Value> {
    let (ty, rest) = split_type(text);
    let mut param = Map::new();

    let (spec, description) = if let Some(inner) = rest.strip_prefix('[') {
        match inner.find(']') {
            Some(end) => (&inner[..end], inner[end + 1..].trim()),
            None => (inner, ""),
        }
    } else {
        rest.split_once(char::is_whitespace)
            .map_or((rest, ""), |(n, d)| (n, d.trim()))
    };
    let optional = rest.starts_with('[');

    let (name, default) = match spec.split_once('=') {
        Some((name, default)) => (name.trim(), Some(default.trim())),
        None => (spec.trim(), None),
    };

    param.insert("name".to_string(), Value::String(name.to_string()));
    if let Some(ty) = ty {
        param.insert("type".to_string(), json!({ "raw": ty }));
    }
    param.insert(
        "description".to_string(),
        Value::String(description.to_string()),
    );
    if let Some(default) = default {
        param.insert("default".to_string(), parse_default(default));
    }
    if optional {
        param.insert("optional".to_string(), Value::Bool(true));
    }
    param
}

/// Defaults are JSON literals when they parse as such; quoted strings lose their quotes.
fn parse_default(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value;
    }
    let unquoted = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);
    Value::String(unquoted.to_string())
}

/// `Segment / Segment   /slug`: the last token starting with `/` is the slug.
fn parse_menu(text: &str) -> (Vec<String>, String) {
    let slug = text
        .split_whitespace()
        .last()
        .filter(|t| t.len() > 1 && t.starts_with('/'))
        .unwrap_or_default();
    let tree_text = if slug.is_empty() {
        text
    } else {
        text.rfind(slug).map_or(text, |idx| &text[..idx])
    };
    let tree = tree_text
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (tree, slug.to_string())
}

fn author_value(author: &Author) -> Value {
    serde_json::to_value(author).unwrap_or(Value::Null)
}

fn insert_into_object(block: &mut Docblock, tag: &str, key: String, value: Value) {
    let slot = block
        .tags
        .entry(tag.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    match slot {
        Value::Object(map) => {
            map.insert(key, value);
        }
        other => *other = Value::Object(Map::from_iter([(key, value)])),
    }
}

fn push_to_list(block: &mut Docblock, tag: &str, value: Value) {
    let slot = block
        .tags
        .entry(tag.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    match slot {
        Value::Array(list) => list.push(value),
        other => *other = Value::Array(vec![value]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Docblock> {
        CommentParser::default()
            .parse_source(source, Path::new("test.ts"))
            .unwrap()
    }

    #[test]
    fn parse_full_block() {
        let blocks = parse(
            r"
/**
 * Create a button element.
 *
 * @name        button
 * @namespace   ui.components
 * @type        Function
 * @param       {String}   [label='Ok']   The button label
 * @param       {Boolean}  disabled       Whether the button is disabled
 * @return      {HTMLElement}             The element
 * @menu        Components / Button   /components/button
 * @status      beta
 * @example     js
 * const el = button('Save');
 *   el.focus();
 * @author      Jane Doe <jane@acme.dev>
 */
export function button() {}
",
        );

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.get_str("description"), Some("Create a button element."));
        assert_eq!(block.name(), Some("button"));
        assert_eq!(block.namespace(), Some("ui.components"));
        assert_eq!(block.get("type"), Some(&json!({ "raw": "Function" })));
        assert_eq!(
            block.get("param").unwrap()["label"],
            json!({
                "name": "label",
                "type": { "raw": "String" },
                "description": "The button label",
                "default": "Ok",
                "optional": true
            })
        );
        assert_eq!(
            block.get("param").unwrap()["disabled"]["description"],
            json!("Whether the button is disabled")
        );
        assert_eq!(
            block.get("return"),
            Some(&json!({ "type": { "raw": "HTMLElement" }, "description": "The element" }))
        );
        assert_eq!(
            block.get("menu"),
            Some(&json!({ "tree": ["Components", "Button"], "slug": "/components/button" }))
        );
        assert_eq!(
            block.get("example"),
            Some(&json!([{ "language": "js", "code": "const el = button('Save');\n  el.focus();" }]))
        );
        assert_eq!(
            block.get("author"),
            Some(&json!({ "name": "Jane Doe", "email": "jane@acme.dev" }))
        );
    }

    #[test]
    fn several_blocks_in_order() {
        let blocks = parse(
            "/** @name a */\nconst a = 1;\n/**\n * @name b\n * @private\n */\nconst b = 2;\n",
        );
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name(), Some("a"));
        assert_eq!(blocks[1].name(), Some("b"));
        assert!(blocks[1].is_private());
        assert!(!blocks[0].is_private());
    }

    #[test]
    fn plain_comments_are_ignored() {
        let blocks = parse("/* not a docblock */\n/*******/\n// @name nope\n");
        assert!(blocks.is_empty());
    }

    #[test]
    fn glob_strings_do_not_open_blocks() {
        let blocks = parse(
            "const globs = ['src/**/*.ts'];\nconst b = 2;\n/**\n * Sum two numbers.\n * @name sum\n */\nconst sum = 3; // done */\n",
        );
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), Some("sum"));
        assert_eq!(blocks[0].get_str("description"), Some("Sum two numbers."));
    }

    #[test]
    fn named_lists_and_notes_accumulate() {
        let blocks = parse(
            "/**\n * @platform js  Browser build\n * @platform node\n * @todo  Handle RTL\n * @todo  Add icons\n */",
        );
        let block = &blocks[0];
        assert_eq!(
            block.get("platform"),
            Some(&json!([
                { "name": "js", "description": "Browser build" },
                { "name": "node", "description": "" }
            ]))
        );
        assert_eq!(block.get("todo").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = CommentParser::default()
            .parse_source("/**\n * @name a\n", Path::new("broken.ts"))
            .unwrap_err();
        assert!(matches!(err, DocblockError::Unterminated { line: 1, .. }));
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mod.ts");
        std::fs::write(&path, "/** @name x\n @namespace a.b */").unwrap();
        let blocks = CommentParser::default().parse_file(&path).unwrap();
        assert_eq!(blocks[0].name(), Some("x"));
        assert_eq!(blocks[0].namespace(), Some("a.b"));

        let missing = CommentParser::default().parse_file(&tmp.path().join("nope.ts"));
        assert!(matches!(missing, Err(DocblockError::Io { .. })));
    }

    #[test]
    fn menu_without_slug() {
        assert_eq!(
            parse_menu("Guides / Getting Started"),
            (vec!["Guides".to_string(), "Getting Started".to_string()], String::new())
        );
    }
}
