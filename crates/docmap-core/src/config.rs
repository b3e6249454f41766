//! `docmap.toml` configuration and code-level settings.
//!
//! Values are layered: built-in defaults, then the configuration file, then
//! whatever the caller overrides. Tables merge key by key, so a file setting
//! only `build.exclude-by-tags.status` keeps the default `type` filter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::menu::{CustomMenus, FilterDecision, FilterItem, KeyFilter, MenuError};
use crate::merge::deep_merge;
use crate::search::SearchQuery;
use crate::tags::{TagRegistry, DEFAULT_TAGS};

/// Configuration file name looked up in the working directory.
pub const CONFIG_FILE: &str = "docmap.toml";

/// Text file extensions scanned by the default build globs.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "css", "scss", "sass", "less", "php", "twig", "html",
    "vue", "svelte", "md", "mdx", "json", "yaml", "yml", "txt",
];

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration in '{}': {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parameters of [`crate::Docmap::read`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReadParams {
    /// Root `docmap.json`.
    pub input: PathBuf,
    /// Whether declared dependencies are aggregated.
    pub dependencies: bool,
    /// Dotted paths sorted shallowly after aggregation.
    pub sort: Vec<String>,
    /// Dotted paths sorted deeply after aggregation.
    pub sort_deep: Vec<String>,
    /// Globs of dependency names never loaded.
    pub exclude_packages: Vec<String>,
}

impl Default for ReadParams {
    fn default() -> Self {
        Self {
            input: PathBuf::from("docmap.json"),
            dependencies: true,
            sort: vec!["menu.packages".to_string()],
            sort_deep: vec![
                "menu.custom.styleguide".to_string(),
                "menu.custom.specs".to_string(),
            ],
            exclude_packages: ["@website/*", "@example/*", "@tests/*", "@app/*"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Parameters of [`crate::Docmap::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildParams {
    /// Files to scan, relative to the package root.
    pub globs: Vec<String>,
    /// Files to skip, relative to the package root.
    pub exclude: Vec<String>,
    /// Tag → patterns; a block whose tag value matches any pattern is skipped.
    pub exclude_by_tags: IndexMap<String, Vec<String>>,
    /// Tags copied into built entries.
    pub tags: Vec<String>,
    /// Whether results are written to disk.
    pub save: bool,
    /// Output `docmap.json`; defaults to the one in the package root.
    pub out_path: Option<PathBuf>,
    /// Directory receiving one file per entry.
    pub out_dir: Option<PathBuf>,
    /// Write per-entry JSON files.
    pub json: bool,
    /// Write per-entry MDX files.
    pub mdx: bool,
    /// Remove `out-dir` and `out-path` before building.
    pub clear: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        let mut globs = vec!["*".to_string()];
        globs.extend(TEXT_EXTENSIONS.iter().map(|ext| format!("src/**/*.{ext}")));
        globs.push("dist/css/*".to_string());

        Self {
            globs,
            exclude: vec![
                "**/__tests__/**/*".to_string(),
                "**/__tests__.wip/**/*".to_string(),
                "**/__wip__/**/*".to_string(),
                "src/css/**/*".to_string(),
            ],
            exclude_by_tags: IndexMap::from([
                ("status".to_string(), vec!["^(?!stable)([a-z0-9]+)$".to_string()]),
                ("type".to_string(), vec!["^CssClass$".to_string()]),
            ]),
            tags: DEFAULT_TAGS.iter().map(|t| (*t).to_string()).collect(),
            save: true,
            out_path: None,
            out_dir: None,
            json: true,
            mdx: false,
            clear: false,
        }
    }
}

/// A custom menu declared in configuration: keep the `key` group and slugs matching `slug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMenuConfig {
    pub key: String,
    pub slug: String,
}

/// Contents of `docmap.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DocmapConfig {
    pub read: ReadParams,
    pub search: SearchQuery,
    pub build: BuildParams,
    pub custom_menu: IndexMap<String, CustomMenuConfig>,
}

impl DocmapConfig {
    /// Load `docmap.toml` from `dir` when present, defaults otherwise.
    ///
    /// Relative paths are resolved against `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            return Self::from_path(&path);
        }
        let mut config = Self::default();
        config.resolve_paths(dir);
        Ok(config)
    }

    /// Load a configuration file. Relative paths resolve against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, path)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    /// Parse TOML over the defaults. `origin` only names the file in errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let invalid = |source| ConfigError::Invalid {
            path: origin.to_path_buf(),
            source,
        };

        let file: toml::Value = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        let mut merged = serde_json::to_value(Self::default()).map_err(invalid)?;
        deep_merge(&mut merged, serde_json::to_value(file).map_err(invalid)?);
        serde_json::from_value::<Self>(merged).map_err(invalid)
    }

    /// Make `read.input`, `build.out-path` and `build.out-dir` absolute.
    pub fn resolve_paths(&mut self, base: &Path) {
        self.read.input = base.join(&self.read.input);
        if let Some(out) = self.build.out_path.as_mut() {
            *out = base.join(&*out);
        }
        if let Some(out) = self.build.out_dir.as_mut() {
            *out = base.join(&*out);
        }
    }
}

/// Code-level extension points: custom menu predicates and tag shapes/proxies.
#[derive(Debug, Clone, Default)]
pub struct DocmapSettings {
    pub custom_menus: CustomMenus,
    pub tags: TagRegistry,
}

impl DocmapSettings {
    /// Defaults plus the custom menus declared in `config`.
    pub fn from_config(config: &DocmapConfig) -> Result<Self, MenuError> {
        let mut settings = Self::default();
        for (name, menu) in &config.custom_menu {
            let filter = KeyFilter::new(name, menu.key.clone(), &menu.slug)?;
            settings.custom_menus.insert(name.clone(), filter.into_filter());
        }
        Ok(settings)
    }

    /// Register or replace a custom menu predicate.
    pub fn register_custom_menu<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&FilterItem<'_>) -> FilterDecision + Send + Sync + 'static,
    {
        self.custom_menus.register(name, filter);
        self
    }

    /// Transform a tag's value during the build pass.
    pub fn register_tag_proxy<F>(&mut self, tag: impl Into<String>, proxy: F) -> &mut Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.tags.set_proxy(tag, proxy);
        self
    }
}
