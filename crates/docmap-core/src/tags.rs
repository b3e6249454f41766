//! Registry of recognized docblock tags.
//!
//! Every tag maps to a [`TagDescriptor`] telling the docblock parser how to
//! shape the tag's raw text, plus an optional proxy that transforms the shaped
//! value when entries are produced by a build pass.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A transform applied to a tag value during the build pass.
pub type TagProxy = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// How a tag's raw text is shaped into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Free text, last occurrence wins.
    Text,
    /// Presence flag (`true`).
    Flag,
    /// `{Type}` annotation, stored as `{ "raw": "Type" }`.
    Typed,
    /// `{Type} [name=default] description`, accumulated into a map keyed by name.
    Params,
    /// `{Type} description`.
    Return,
    /// `language` on the tag line followed by code lines; accumulated into a list.
    Examples,
    /// `Name <email> (url)`.
    Author,
    /// Several authors, accumulated into a list.
    People,
    /// `name description`, accumulated into a list.
    NamedList,
    /// Free text notes, accumulated into a list of `{ "description" }`.
    Notes,
    /// `Segment / Segment   /slug`.
    Menu,
}

/// A registered tag.
#[derive(Clone)]
pub struct TagDescriptor {
    /// Value shape.
    pub kind: TagKind,
    proxy: Option<TagProxy>,
}

impl TagDescriptor {
    /// Create a descriptor without a proxy.
    #[must_use]
    pub fn new(kind: TagKind) -> Self {
        Self { kind, proxy: None }
    }

    /// Returns true if a proxy is registered for this tag.
    #[must_use]
    pub fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }
}

impl fmt::Debug for TagDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagDescriptor")
            .field("kind", &self.kind)
            .field("proxy", &self.proxy.is_some())
            .finish()
    }
}

/// Tags included in built entries when no allow-list is configured.
pub const DEFAULT_TAGS: &[&str] = &[
    "id",
    "name",
    "as",
    "type",
    "param",
    "return",
    "setting",
    "menu",
    "default",
    "platform",
    "description",
    "namespace",
    "status",
    "snippet",
    "example",
    "install",
    "interface",
    "async",
    "static",
    "since",
    "author",
];

/// Name → descriptor table.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    tags: IndexMap<String, TagDescriptor>,
}

impl TagRegistry {
    /// An empty registry; every tag is treated as [`TagKind::Text`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            tags: IndexMap::new(),
        }
    }

    /// The registry of tags the built-in parser understands.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, kind) in [
            ("id", TagKind::Text),
            ("name", TagKind::Text),
            ("as", TagKind::Text),
            ("namespace", TagKind::Text),
            ("type", TagKind::Typed),
            ("param", TagKind::Params),
            ("setting", TagKind::Params),
            ("return", TagKind::Return),
            ("menu", TagKind::Menu),
            ("default", TagKind::Text),
            ("platform", TagKind::NamedList),
            ("support", TagKind::NamedList),
            ("description", TagKind::Text),
            ("status", TagKind::Text),
            ("snippet", TagKind::Text),
            ("example", TagKind::Examples),
            ("install", TagKind::Examples),
            ("interface", TagKind::Text),
            ("async", TagKind::Flag),
            ("static", TagKind::Flag),
            ("private", TagKind::Flag),
            ("since", TagKind::Text),
            ("author", TagKind::Author),
            ("contributor", TagKind::People),
            ("todo", TagKind::Notes),
        ] {
            registry.register(name, kind);
        }
        registry
    }

    /// Register or re-shape a tag, keeping any proxy already attached.
    pub fn register(&mut self, name: impl Into<String>, kind: TagKind) -> &mut Self {
        self.tags
            .entry(name.into())
            .and_modify(|d| d.kind = kind)
            .or_insert_with(|| TagDescriptor::new(kind));
        self
    }

    /// Attach a proxy to a tag. Unknown tags are registered as [`TagKind::Text`].
    pub fn set_proxy<F>(&mut self, name: impl Into<String>, proxy: F) -> &mut Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.tags
            .entry(name.into())
            .or_insert_with(|| TagDescriptor::new(TagKind::Text))
            .proxy = Some(Arc::new(proxy));
        self
    }

    /// Look up a tag.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TagDescriptor> {
        self.tags.get(name)
    }

    /// The shape of a tag, [`TagKind::Text`] when unregistered.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> TagKind {
        self.tags.get(name).map_or(TagKind::Text, |d| d.kind)
    }

    /// Pass a value through the tag's proxy, if any.
    #[must_use]
    pub fn apply(&self, name: &str, value: Value) -> Value {
        match self.tags.get(name).and_then(|d| d.proxy.as_ref()) {
            Some(proxy) => proxy(value),
            None => value,
        }
    }

    /// Iterate over registered tag names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
