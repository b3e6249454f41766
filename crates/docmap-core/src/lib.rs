//! Docmap Core - documentation map aggregation
//!
//! This crate provides the core functionality:
//! - Entries and the persisted `docmap.json` format
//! - Loader: merging one package's map into an entry table
//! - Aggregator: root package plus declared dependencies, cached
//! - Menu: tree, slug index, package menus and custom menus
//! - Search: glob and regex filtering of entries
//! - Sort: alphabetical reordering addressed by dotted path
//! - Build: docblock scanning that produces a package's map

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build pass - scan sources and write `docmap.json`
pub mod build;

/// Aggregation cache keyed by version label
pub mod cache;

/// `docmap.toml` configuration and code-level settings
pub mod config;

/// Docblock parsing
pub mod docblock;

/// Aggregation facade
pub mod docmap;

/// Entries and the persisted file format
pub mod entry;

/// Error types
pub mod error;

/// Loading of a single `docmap.json`
pub mod loader;

/// MDX rendering of entries
pub mod mdx;

/// Menu derivation
pub mod menu;

/// JSON value merging
pub mod merge;

/// Entry search
pub mod search;

/// Dotted-path sorting
pub mod sort;

/// Tag registry
pub mod tags;

pub use build::BuildReport;
pub use cache::{DocmapCache, CURRENT_VERSION};
pub use config::{BuildParams, DocmapConfig, DocmapSettings, ReadParams};
pub use docblock::{CommentParser, Docblock, DocblockParser};
pub use docmap::{Docmap, DocmapIndex};
pub use entry::{DocmapFile, Entry, EntryMap};
pub use error::DocmapError;
pub use menu::{build_menu, FilterDecision, FilterItem, MenuView};
pub use search::{SearchQuery, SearchResult};
pub use sort::SortMode;
pub use tags::{TagKind, TagRegistry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
