//! Package ecosystems and package-root discovery.
//!
//! A package root is any directory carrying a manifest of a supported
//! ecosystem. Each ecosystem installs its dependencies in its own directory:
//! ```text
//! my-package/
//! ├── package.json          # npm manifest
//! ├── composer.json         # composer manifest
//! ├── docmap.json           # aggregated documentation of this package
//! ├── node_modules/<dep>/docmap.json
//! └── vendor/<vendor>/<dep>/docmap.json
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The aggregated documentation filename.
pub const DOCMAP_FILE: &str = "docmap.json";

/// The npm manifest filename.
pub const PACKAGE_JSON: &str = "package.json";

/// The composer manifest filename.
pub const COMPOSER_JSON: &str = "composer.json";

/// A supported package ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// npm / `package.json` / `node_modules`.
    #[default]
    Npm,
    /// composer / `composer.json` / `vendor`.
    Composer,
}

impl Ecosystem {
    /// All ecosystems, in the order their dependencies are processed.
    pub const ALL: [Self; 2] = [Self::Npm, Self::Composer];

    /// Returns the ecosystem name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Composer => "composer",
        }
    }

    /// The manifest filename for this ecosystem.
    #[must_use]
    pub fn manifest_file(&self) -> &'static str {
        match self {
            Self::Npm => PACKAGE_JSON,
            Self::Composer => COMPOSER_JSON,
        }
    }

    /// The directory dependencies are installed into.
    #[must_use]
    pub fn install_dir(&self) -> &'static str {
        match self {
            Self::Npm => "node_modules",
            Self::Composer => "vendor",
        }
    }

    /// This ecosystem first, then the others.
    #[must_use]
    pub fn search_order(self) -> Vec<Self> {
        let mut order = vec![self];
        order.extend(Self::ALL.into_iter().filter(|e| *e != self));
        order
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check whether a directory carries a manifest of any supported ecosystem.
#[must_use]
pub fn is_package_root(dir: &Path) -> bool {
    Ecosystem::ALL
        .iter()
        .any(|e| dir.join(e.manifest_file()).is_file())
}

/// Find the nearest package root by searching upward from `start`.
#[must_use]
pub fn find_root(start: impl AsRef<Path>) -> Option<PathBuf> {
    start
        .as_ref()
        .ancestors()
        .find(|dir| is_package_root(dir))
        .map(Path::to_path_buf)
}

/// Find the highest package root above `start` (the monorepo root).
#[must_use]
pub fn find_highest_root(start: impl AsRef<Path>) -> Option<PathBuf> {
    start
        .as_ref()
        .ancestors()
        .filter(|dir| is_package_root(dir))
        .last()
        .map(Path::to_path_buf)
}

/// Lexically normalize a path: fold `.` and `..` without touching the filesystem.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
