//! Error types for docmap operations.

use docmap_pkg::ManifestError;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::docblock::DocblockError;
use crate::menu::MenuError;
use crate::search::SearchError;

/// Errors raised while reading, building or querying a docmap.
#[derive(Error, Debug)]
pub enum DocmapError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed docmap '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize docmap: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Menu(#[from] MenuError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Docblock(#[from] DocblockError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("invalid package pattern '{pattern}': {source}")]
    PackagePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid exclude-by-tags pattern '{pattern}' for tag '{tag}': {source}")]
    TagFilter {
        tag: String,
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("docblock for '{id}' does not form a valid entry: {source}")]
    InvalidEntry {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no package root found above '{}'", .0.display())]
    NoPackageRoot(PathBuf),

    #[error("entry '{0}' has no resolved source path")]
    NoSourcePath(String),
}

impl DocmapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
