//! MDX rendering of a single entry.

use serde_json::{Map, Value};

use crate::entry::Entry;
use crate::sort::locale_compare;

/// Render an entry as an MDX document: YAML front matter then an HTML/Markdown body.
#[must_use]
pub fn to_mdx(entry: &Entry) -> String {
    let mut out = MdxWriter::default();
    out.front_matter(entry);

    out.line("<div class=\"docmap-mdx\">");
    out.line(format!("# {}", entry.display_name()));

    out.metas(entry);
    out.line(format!(
        "<div class=\"_namespace\">{}</div>",
        entry.namespace.as_deref().unwrap_or_default()
    ));

    if let Some(description) = text(entry.field("description")) {
        out.line("<div class=\"_description\">");
        out.line(description);
        out.line("</div>");
    }

    if let Some(params) = entry.field("param").and_then(Value::as_object) {
        out.line("<div class=\"_params\">");
        out.line("## Params");
        out.line("<ol class=\"_list\">");
        for param in params.values().filter_map(Value::as_object) {
            out.line("<li class=\"_item\">");
            out.line(param_line(param));
            out.line(format!(
                "<p class=\"_description\">{}</p>",
                str_field(param, "description")
            ));
            out.line("</li>");
        }
        out.line("</ol>");
        out.line("</div>");
    }

    if let Some(ret) = entry.field("return").and_then(Value::as_object) {
        out.line("<div class=\"_return\">");
        out.line("## Return");
        out.line("<ol class=\"_list\">");
        out.line("<li class=\"_item\">");
        out.line(format!(
            "<span class=\"_description\">{}</span><span class=\"_default\">{}</span><span class=\"_type\">{}</span>",
            str_field(ret, "description"),
            ret.get("default").map(display).unwrap_or_default(),
            type_text(ret.get("type")).unwrap_or_default(),
        ));
        out.line("</li>");
        out.line("</ol>");
        out.line("</div>");
    }

    if let Some(examples) = non_empty_list(entry.field("example")) {
        out.line("<div class=\"_examples\">");
        out.line(format!("## {}", plural("Example", examples.len())));
        for example in examples.iter().filter_map(Value::as_object) {
            out.line(format!("```{}", str_field(example, "language")));
            out.line(str_field(example, "code"));
            out.line("```");
        }
        out.line("</div>");
    }

    if let Some(settings) = entry.field("setting").and_then(Value::as_object) {
        out.line("<div class=\"_settings\">");
        out.line("## Settings");
        for (i, setting) in settings.values().filter_map(Value::as_object).enumerate() {
            out.line(format!("{}. {}", i + 1, param_line(setting)));
        }
        out.line("</div>");
    }

    if let Some(todos) = non_empty_list(entry.field("todo")) {
        out.line("<div class=\"_todo\">");
        out.line("## Todo");
        out.line("<ul class=\"_list\">");
        for todo in todos.iter().filter_map(Value::as_object) {
            out.line("<li class=\"_item\">");
            out.line(format!(
                "<span class=\"_description\">{}</span>",
                str_field(todo, "description")
            ));
            if let Some(priority) = todo.get("priority").and_then(Value::as_str) {
                out.line(format!(
                    "<span class=\"_priority -{priority}\">{priority}</span>"
                ));
            }
            out.line("</li>");
        }
        out.line("</ul>");
        out.line("</div>");
    }

    if let Some(author) = entry.field("author").and_then(Value::as_object) {
        out.line("<div class=\"_author\">");
        out.line("## Author");
        out.line("<ul class=\"_list\">");
        out.person(author);
        out.line("</ul>");
        out.line("</div>");
    }

    if let Some(contributors) = non_empty_list(entry.field("contributor")) {
        out.line("<div class=\"_contributors\">");
        out.line(format!("## {}", plural("Contributor", contributors.len())));
        out.line("<ul class=\"_list\">");
        for person in contributors.iter().filter_map(Value::as_object) {
            out.person(person);
        }
        out.line("</ul>");
        out.line("</div>");
    }

    out.line("</div>");
    out.finish()
}

#[derive(Default)]
struct MdxWriter {
    lines: Vec<String>,
}

impl MdxWriter {
    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }

    fn front_matter(&mut self, entry: &Entry) {
        self.line("---");
        self.line(format!("title: '{}'", entry.display_name()));
        self.line(format!(
            "namespace: '{}'",
            entry.namespace.as_deref().unwrap_or_default()
        ));
        if let Some(description) = text(entry.field("description")) {
            self.line(format!("description: '{}'", description.trim().replace('\'', "''")));
        }
        if let Some(ty) = type_text(entry.field("type")) {
            self.line(format!("type: '{ty}'"));
        }
        for key in ["status", "since"] {
            if let Some(value) = text(entry.field(key)) {
                self.line(format!("{key}: '{value}'"));
            }
        }
        for key in ["platform", "support"] {
            if let Some(list) = non_empty_list(entry.field(key)) {
                let mut sorted = list.clone();
                sorted.sort_by(|a, b| locale_compare(&name_of(a), &name_of(b)));
                self.line(format!("{key}: '{}'", Value::Array(sorted)));
            }
        }
        if let Some(author) = entry.field("author") {
            self.line(format!("author: '{author}'"));
        }
        self.line("---");
    }

    fn metas(&mut self, entry: &Entry) {
        let status = text(entry.field("status"));
        let since = text(entry.field("since"));
        let platforms = non_empty_list(entry.field("platform"));
        let has_metas = status.is_some() || since.is_some() || platforms.is_some();

        if has_metas {
            self.line("<div class=\"_metas\">");
        }
        if let Some(ty) = type_text(entry.field("type")) {
            self.line(format!(
                "<div class=\"_type\"><span class=\"_type-label\">Type:</span><span class=\"_type-value\">{ty}</span></div>"
            ));
        }
        if let Some(status) = status {
            self.line(format!(
                "<div class=\"_status\"><span class=\"_status-label\">Status:</span><span class=\"_status-value -{status}\">{status}</span></div>"
            ));
        }
        if let Some(since) = since {
            self.line(format!(
                "<div class=\"_since\"><span class=\"_since-label\">Since:</span><span class=\"_since-value\">{since}</span></div>"
            ));
        }
        if let Some(platforms) = platforms {
            let values: String = platforms
                .iter()
                .map(|p| format!("<span class=\"_platform-value\">{}</span>", name_of(p)))
                .collect();
            self.line(format!(
                "<div class=\"_platform\"><span class=\"_platform-label\">Platform:</span>{values}</div>"
            ));
        }
        if has_metas {
            self.line("</div>");
        }
    }

    fn person(&mut self, person: &Map<String, Value>) {
        self.line("<li class=\"_item\">");
        self.line(format!("<span class=\"_name\">{}</span>", str_field(person, "name")));
        if let Some(email) = person.get("email").and_then(Value::as_str) {
            self.line(format!("<span class=\"_email\">{email}</span>"));
        }
        if let Some(url) = person.get("url").and_then(Value::as_str) {
            self.line(format!(
                "<a href=\"{url}\" target=\"_blank\" class=\"_url\">{url}</a>"
            ));
        }
        self.line("</li>");
    }
}

/// Name, required marker, default and type of a parameter or setting.
fn param_line(param: &Map<String, Value>) -> String {
    let required = if param.contains_key("default") {
        ""
    } else {
        "<span class=\"_required\">*</span>"
    };
    format!(
        "<span class=\"_name\">{}{required}</span><span class=\"_default\">{}</span> <span class=\"_type\">{}</span>",
        str_field(param, "name"),
        param.get("default").map(display).unwrap_or_default(),
        type_text(param.get("type")).unwrap_or_default(),
    )
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        other => Some(display(other)),
    }
}

/// `{ "raw": T }` or a plain string.
fn type_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(obj) => obj.get("raw").and_then(Value::as_str).map(str::to_string),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn name_of(value: &Value) -> String {
    value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn non_empty_list(value: Option<&Value>) -> Option<&Vec<Value>> {
    value
        .and_then(Value::as_array)
        .filter(|list| !list.is_empty())
}

fn plural(word: &str, count: usize) -> String {
    if count > 1 {
        format!("{word}s")
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: Value) -> Entry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn front_matter_and_sections() {
        let mdx = to_mdx(&entry(json!({
            "name": "button",
            "namespace": "ui.components",
            "description": "Create a button",
            "type": { "raw": "Function" },
            "status": "beta",
            "since": "2.0.0",
            "platform": [{ "name": "node" }, { "name": "js" }],
            "param": {
                "label": { "name": "label", "type": { "raw": "String" }, "description": "Label", "default": "Ok" },
                "size": { "name": "size", "type": { "raw": "Number" }, "description": "Size" }
            },
            "return": { "type": { "raw": "HTMLElement" }, "description": "The element" },
            "example": [{ "language": "js", "code": "button('Save');" }],
            "author": { "name": "Jane Doe", "email": "jane@acme.dev" }
        })));

        assert!(mdx.starts_with("---\ntitle: 'button'\nnamespace: 'ui.components'\n"));
        assert!(mdx.contains("description: 'Create a button'"));
        assert!(mdx.contains("type: 'Function'"));
        assert!(mdx.contains(r#"platform: '[{"name":"js"},{"name":"node"}]'"#));
        assert!(mdx.contains("# button"));
        assert!(mdx.contains("<span class=\"_status-value -beta\">beta</span>"));
        assert!(mdx.contains(
            "<span class=\"_name\">label</span><span class=\"_default\">Ok</span> <span class=\"_type\">String</span>"
        ));
        assert!(mdx.contains("<span class=\"_name\">size<span class=\"_required\">*</span></span>"));
        assert!(mdx.contains("## Example\n```js\nbutton('Save');\n```"));
        assert!(mdx.contains("<span class=\"_email\">jane@acme.dev</span>"));
        assert!(mdx.ends_with("</div>"));
    }

    #[test]
    fn minimal_entry_has_no_optional_sections() {
        let mdx = to_mdx(&entry(json!({ "name": "x", "namespace": "a" })));
        assert!(!mdx.contains("_metas"));
        assert!(!mdx.contains("## Params"));
        assert!(!mdx.contains("## Author"));
        assert!(mdx.contains("<div class=\"_namespace\">a</div>"));
    }

    #[test]
    fn plural_headings() {
        let mdx = to_mdx(&entry(json!({
            "name": "x",
            "example": [{ "language": "js", "code": "a" }, { "language": "ts", "code": "b" }],
            "contributor": [{ "name": "A" }, { "name": "B" }]
        })));
        assert!(mdx.contains("## Examples"));
        assert!(mdx.contains("## Contributors"));
    }
}
