//! The aggregation facade: read, search and build.

use docmap_pkg::{direct_dependencies, find_root, DocmapResolver, Ecosystem, PackageMeta};
use globset::GlobBuilder;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::build::{BuildReport, Builder};
use crate::cache::{DocmapCache, CURRENT_VERSION};
use crate::config::{BuildParams, DocmapConfig, DocmapSettings, ReadParams};
use crate::docblock::{CommentParser, DocblockParser};
use crate::entry::EntryMap;
use crate::error::DocmapError;
use crate::loader::load_into;
use crate::menu::{build_menu, MenuView};
use crate::search::{search, SearchQuery, SearchResult};
use crate::sort::{sort_path, SortMode};

/// An aggregated documentation map: the merged entry table and its menu.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocmapIndex {
    pub map: EntryMap,
    /// Absent when nothing was read; serialized as `{}` then.
    #[serde(serialize_with = "serialize_menu")]
    pub menu: Option<MenuView>,
}

#[allow(clippy::ref_option)]
fn serialize_menu<S: Serializer>(menu: &Option<MenuView>, serializer: S) -> Result<S::Ok, S::Error> {
    match menu {
        Some(view) => view.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

/// Reads, searches and builds documentation maps.
///
/// Aggregation results are cached by version label in a [`DocmapCache`] that
/// may be shared between instances.
pub struct Docmap {
    config: DocmapConfig,
    settings: DocmapSettings,
    cache: Arc<DocmapCache>,
    parser: Arc<dyn DocblockParser>,
    cwd: PathBuf,
}

impl Docmap {
    /// Create a facade with its own cache and the built-in comment parser.
    ///
    /// The working directory anchors path-style dependency names, the
    /// monorepo lookup and the build pass.
    pub fn new(config: DocmapConfig, settings: DocmapSettings) -> Self {
        let parser = Arc::new(CommentParser::new(settings.tags.clone()));
        Self {
            config,
            settings,
            cache: Arc::new(DocmapCache::new()),
            parser,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Create a facade whose settings include the custom menus of `config`.
    pub fn from_config(config: DocmapConfig) -> Result<Self, DocmapError> {
        let settings = DocmapSettings::from_config(&config)?;
        Ok(Self::new(config, settings))
    }

    /// Share a cache with other instances.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DocmapCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the docblock parser used by the build pass and entry reparsing.
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn DocblockParser>) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    #[must_use]
    pub fn config(&self) -> &DocmapConfig {
        &self.config
    }

    #[must_use]
    pub fn settings(&self) -> &DocmapSettings {
        &self.settings
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<DocmapCache> {
        &self.cache
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Aggregate with the configured read parameters.
    pub fn read(&self) -> Result<Arc<DocmapIndex>, DocmapError> {
        self.read_with(&self.config.read)
    }

    /// Aggregate the root `docmap.json` and those of its declared dependencies.
    ///
    /// A cached result is returned untouched, whatever `params` says. A missing
    /// root file yields an empty index that is not cached.
    pub fn read_with(&self, params: &ReadParams) -> Result<Arc<DocmapIndex>, DocmapError> {
        if let Some(index) = self.cache.get(CURRENT_VERSION) {
            debug!(version = CURRENT_VERSION, "docmap served from cache");
            return Ok(index);
        }

        if !params.input.is_file() {
            info!(input = %params.input.display(), "no docmap to read");
            return Ok(Arc::new(DocmapIndex::default()));
        }

        let root_dir = params.input.parent().unwrap_or_else(|| Path::new(""));
        let mut map = EntryMap::new();

        let root_package = match load_into(&params.input, Ecosystem::Npm, false, &mut map)? {
            Some(loaded) => loaded.meta.name,
            None => PackageMeta::from_dir_name(root_dir).name,
        };

        let mut dependencies = 0;
        if params.dependencies {
            dependencies = self.load_dependencies(root_dir, params, &mut map)?;
        }

        for entry in map.values_mut() {
            entry.attach_source(Arc::clone(&self.parser));
        }

        let menu = build_menu(&map, &root_package, &self.settings.custom_menus)?;
        let mut index = DocmapIndex {
            map,
            menu: Some(menu),
        };

        for path in &params.sort {
            sort_path(&mut index, path, SortMode::Shallow);
        }
        for path in &params.sort_deep {
            sort_path(&mut index, path, SortMode::Deep);
        }

        info!(
            package = %root_package,
            entries = index.map.len(),
            dependencies,
            "docmap read"
        );

        let index = Arc::new(index);
        self.cache.insert(CURRENT_VERSION, Arc::clone(&index));
        Ok(index)
    }

    /// Load every resolvable, non-excluded dependency docmap in declaration order.
    fn load_dependencies(
        &self,
        root_dir: &Path,
        params: &ReadParams,
        map: &mut EntryMap,
    ) -> Result<usize, DocmapError> {
        let excluded = params
            .exclude_packages
            .iter()
            .map(|pattern| {
                GlobBuilder::new(pattern)
                    .literal_separator(true)
                    .build()
                    .map(|glob| glob.compile_matcher())
                    .map_err(|source| DocmapError::PackagePattern {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let resolver = DocmapResolver::new(root_dir, &self.cwd);
        let mut loaded = 0;

        for dependency in direct_dependencies(root_dir)? {
            if excluded.iter().any(|p| p.is_match(&dependency.name)) {
                debug!(dependency = %dependency.name, "excluded package");
                continue;
            }
            let Some(path) = resolver.resolve(&dependency.name, dependency.ecosystem) else {
                continue;
            };
            if load_into(&path, dependency.ecosystem, true, map)?.is_some() {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Search the aggregated map. Predicates set in `query` override the configured ones.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResult, DocmapError> {
        let index = self.read()?;
        let mut merged = self.config.search.clone();
        merged.merge(query.clone());
        let result = search(&index.map, &merged)?;
        info!(items = result.items.len(), "search done");
        Ok(result)
    }

    /// Build with the configured build parameters.
    pub fn build(&self) -> Result<BuildReport, DocmapError> {
        self.build_with(&self.config.build)
    }

    /// Scan the package containing the working directory and regenerate its map.
    ///
    /// A saving build invalidates the read cache.
    pub fn build_with(&self, params: &BuildParams) -> Result<BuildReport, DocmapError> {
        let root = find_root(&self.cwd).ok_or_else(|| DocmapError::NoPackageRoot(self.cwd.clone()))?;
        let report = Builder::new(&root, params, self.parser.as_ref(), &self.settings.tags)?.run()?;
        if params.save {
            self.cache.clear();
        }
        Ok(report)
    }
}

impl std::fmt::Debug for Docmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Docmap")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}
