//! Dependency enumeration and `docmap.json` resolution.
//!
//! This module provides:
//! - The direct dependencies a package declares, across ecosystems
//! - Location of each dependency's own aggregated documentation file

use crate::manifest::{ComposerManifest, ManifestError, NpmManifest};
use crate::package::{find_highest_root, Ecosystem, DOCMAP_FILE};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which section a dependency came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencySection {
    /// Regular runtime dependencies.
    Dependencies,
    /// Development-only dependencies.
    Dev,
}

impl std::fmt::Display for DependencySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dependencies => write!(f, "dependencies"),
            Self::Dev => write!(f, "dev-dependencies"),
        }
    }
}

/// A dependency declared in a package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    /// The package name (or a path, for path-style declarations).
    pub name: String,
    /// The raw version requirement as written in the manifest.
    pub requirement: String,
    /// The ecosystem whose manifest declared it.
    pub ecosystem: Ecosystem,
    /// Which section this came from.
    pub section: DependencySection,
}

/// List the direct dependencies declared by the package at `root`.
///
/// npm dependencies come first, then composer ones. Within an ecosystem the
/// runtime section precedes the dev section and a dev entry already declared
/// as runtime is ignored. Missing manifests contribute nothing.
pub fn direct_dependencies(root: impl AsRef<Path>) -> Result<Vec<DeclaredDependency>, ManifestError> {
    let root = root.as_ref();
    let mut declared = Vec::new();

    for ecosystem in Ecosystem::ALL {
        let manifest_path = root.join(ecosystem.manifest_file());
        if !manifest_path.is_file() {
            continue;
        }

        let deps = match ecosystem {
            Ecosystem::Npm => NpmManifest::from_path(&manifest_path)?.direct_dependencies(),
            Ecosystem::Composer => {
                ComposerManifest::from_path(&manifest_path)?.direct_dependencies()
            }
        };

        declared.extend(deps.into_iter().map(|(name, requirement, is_dev)| {
            DeclaredDependency {
                name,
                requirement,
                ecosystem,
                section: if is_dev {
                    DependencySection::Dev
                } else {
                    DependencySection::Dependencies
                },
            }
        }));
    }

    Ok(declared)
}

/// Locates the `docmap.json` of dependencies of one package.
#[derive(Debug, Clone)]
pub struct DocmapResolver {
    package_root: PathBuf,
    cwd: PathBuf,
    monorepo_root: Option<PathBuf>,
}

impl DocmapResolver {
    /// Create a resolver for the package at `package_root`.
    ///
    /// `cwd` anchors path-style dependency names and the monorepo lookup.
    pub fn new(package_root: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let monorepo_root = find_highest_root(&cwd);
        Self {
            package_root: package_root.into(),
            cwd,
            monorepo_root,
        }
    }

    /// The detected monorepo root, if any.
    #[must_use]
    pub fn monorepo_root(&self) -> Option<&Path> {
        self.monorepo_root.as_deref()
    }

    /// Resolve the documentation file of a dependency.
    ///
    /// Lookup order, first existing file wins:
    /// 1. `<package root>/<install dir>/<name>/docmap.json`
    /// 2. `<name>/docmap.json`, with `name` taken as a path
    /// 3. `<monorepo root>/<install dir>/<name>/docmap.json`
    #[must_use]
    pub fn resolve(&self, name: &str, ecosystem: Ecosystem) -> Option<PathBuf> {
        let candidates = [
            Some(
                self.package_root
                    .join(ecosystem.install_dir())
                    .join(name)
                    .join(DOCMAP_FILE),
            ),
            Some(self.cwd.join(name).join(DOCMAP_FILE)),
            self.monorepo_root
                .as_ref()
                .map(|root| root.join(ecosystem.install_dir()).join(name).join(DOCMAP_FILE)),
        ];

        let found = candidates.into_iter().flatten().find(|p| p.is_file());
        match &found {
            Some(path) => debug!(dependency = name, path = %path.display(), "resolved docmap"),
            None => debug!(dependency = name, %ecosystem, "no docmap found"),
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{COMPOSER_JSON, PACKAGE_JSON};
    use std::fs;
    use tempfile::TempDir;

    fn write_docmap(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(DOCMAP_FILE), r#"{"map":{}}"#).unwrap();
    }

    #[test]
    fn enumerate_dependencies_across_ecosystems() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(PACKAGE_JSON),
            r#"{"name":"site","dependencies":{"b-lib":"1"},"devDependencies":{"a-lib":"2"}}"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join(COMPOSER_JSON),
            r#"{"name":"acme/site","require":{"acme/core":"^1"}}"#,
        )
        .unwrap();

        let deps = direct_dependencies(tmp.path()).unwrap();
        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["b-lib", "a-lib", "acme/core"]);
        assert_eq!(deps[1].section, DependencySection::Dev);
        assert_eq!(deps[2].ecosystem, Ecosystem::Composer);
    }

    #[test]
    fn no_manifest_means_no_dependencies() {
        let tmp = TempDir::new().unwrap();
        assert!(direct_dependencies(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn resolve_from_install_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("site");
        write_docmap(&root.join("node_modules/@acme/ui"));
        write_docmap(&root.join("vendor/acme/core"));

        let resolver = DocmapResolver::new(&root, &root);
        assert_eq!(
            resolver.resolve("@acme/ui", Ecosystem::Npm).unwrap(),
            root.join("node_modules/@acme/ui/docmap.json")
        );
        assert_eq!(
            resolver.resolve("acme/core", Ecosystem::Composer).unwrap(),
            root.join("vendor/acme/core/docmap.json")
        );
        assert!(resolver.resolve("acme/core", Ecosystem::Npm).is_none());
    }

    #[test]
    fn resolve_name_as_path() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("site");
        fs::create_dir_all(&root).unwrap();
        write_docmap(&tmp.path().join("libs/local"));

        let resolver = DocmapResolver::new(&root, tmp.path());
        assert_eq!(
            resolver.resolve("libs/local", Ecosystem::Npm).unwrap(),
            tmp.path().join("libs/local/docmap.json")
        );
    }

    #[test]
    fn resolve_from_monorepo_root() {
        let tmp = TempDir::new().unwrap();
        let mono = tmp.path().join("mono");
        let member = mono.join("packages/site");
        fs::create_dir_all(&member).unwrap();
        fs::write(mono.join(PACKAGE_JSON), r#"{"name":"mono"}"#).unwrap();
        fs::write(member.join(PACKAGE_JSON), r#"{"name":"site"}"#).unwrap();
        write_docmap(&mono.join("node_modules/hoisted"));

        let resolver = DocmapResolver::new(&member, &member);
        assert_eq!(resolver.monorepo_root(), Some(mono.as_path()));
        assert_eq!(
            resolver.resolve("hoisted", Ecosystem::Npm).unwrap(),
            mono.join("node_modules/hoisted/docmap.json")
        );
    }

    #[test]
    fn package_install_dir_wins_over_monorepo() {
        let tmp = TempDir::new().unwrap();
        let mono = tmp.path().join("mono");
        let member = mono.join("packages/site");
        fs::create_dir_all(&member).unwrap();
        fs::write(mono.join(PACKAGE_JSON), r#"{"name":"mono"}"#).unwrap();
        write_docmap(&mono.join("node_modules/shared"));
        write_docmap(&member.join("node_modules/shared"));

        let resolver = DocmapResolver::new(&member, &member);
        assert_eq!(
            resolver.resolve("shared", Ecosystem::Npm).unwrap(),
            member.join("node_modules/shared/docmap.json")
        );
    }
}
