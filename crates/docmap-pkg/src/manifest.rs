//! Package manifest (`package.json`, `composer.json`) parsing.

use crate::package::Ecosystem;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when working with manifests.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An npm `package.json` manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpmManifest {
    /// Package name.
    #[serde(default)]
    pub name: Option<String>,

    /// Package version.
    #[serde(default)]
    pub version: Option<String>,

    /// Short description.
    #[serde(default)]
    pub description: Option<String>,

    /// License: an SPDX identifier, or the legacy `{type, url}` object.
    #[serde(default)]
    pub license: Option<License>,

    /// Package author.
    #[serde(default)]
    pub author: Option<Person>,

    /// Homepage URL.
    #[serde(default)]
    pub homepage: Option<String>,

    /// Runtime dependencies.
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    /// Development-only dependencies.
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: IndexMap<String, String>,
}

/// A composer `composer.json` manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposerManifest {
    /// Package name (`vendor/name`).
    #[serde(default)]
    pub name: Option<String>,

    /// Package version.
    #[serde(default)]
    pub version: Option<String>,

    /// Short description.
    #[serde(default)]
    pub description: Option<String>,

    /// License, either a single identifier or a list.
    #[serde(default)]
    pub license: Option<License>,

    /// Package authors.
    #[serde(default)]
    pub authors: Vec<Person>,

    /// Homepage URL.
    #[serde(default)]
    pub homepage: Option<String>,

    /// Runtime requirements.
    #[serde(default)]
    pub require: IndexMap<String, String>,

    /// Development-only requirements.
    #[serde(default, rename = "require-dev")]
    pub require_dev: IndexMap<String, String>,
}

/// License field in any of the shapes found in published manifests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum License {
    /// `"MIT"`
    Single(String),
    /// `{"type": "MIT", "url": "..."}`
    Detailed(LicenseObject),
    /// `["MIT", "GPL-3.0"]`, possibly mixing both forms.
    Many(Vec<License>),
    /// Anything else; ignored.
    Other(serde_json::Value),
}

/// Legacy object form of a license.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicenseObject {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub url: Option<String>,
}

impl License {
    /// Render as a single SPDX expression, `None` when no identifier is present.
    #[must_use]
    pub fn to_expression(&self) -> Option<String> {
        match self {
            Self::Single(s) => Some(s.clone()).filter(|s| !s.is_empty()),
            Self::Detailed(obj) => obj.kind.clone().filter(|s| !s.is_empty()),
            Self::Many(list) => {
                let ids: Vec<String> = list.iter().filter_map(Self::to_expression).collect();
                (!ids.is_empty()).then(|| ids.join(" OR "))
            }
            Self::Other(_) => None,
        }
    }
}

/// A person field: either `"Name <email> (url)"` or a detailed object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Person {
    /// Compact string form.
    Text(String),
    /// Object form.
    Detailed(Author),
}

impl Person {
    /// Normalize into an [`Author`].
    #[must_use]
    pub fn to_author(&self) -> Author {
        match self {
            Self::Text(s) => Author::parse(s),
            Self::Detailed(a) => a.clone(),
        }
    }
}

/// Normalized author record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Personal or company URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Author {
    /// Parse the compact `Name <email> (url)` form. Email and url are optional.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut rest = text.trim().to_string();

        let url = take_delimited(&mut rest, '(', ')');
        let email = take_delimited(&mut rest, '<', '>');

        Self {
            name: rest.trim().to_string(),
            email,
            url,
        }
    }
}

/// Remove the first `open…close` span from `text`, returning its trimmed interior.
fn take_delimited(text: &mut String, open: char, close: char) -> Option<String> {
    let start = text.find(open)?;
    let end = start + text[start..].find(close)?;
    let inner = text[start + open.len_utf8()..end].trim().to_string();
    text.replace_range(start..=end, "");
    (!inner.is_empty()).then_some(inner)
}

impl NpmManifest {
    /// Load a manifest from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        read_json(path.as_ref())
    }

    /// Direct dependencies: runtime first, then dev entries not already declared.
    pub fn direct_dependencies(&self) -> Vec<(String, String, bool)> {
        merge_sections(&self.dependencies, &self.dev_dependencies)
    }
}

impl ComposerManifest {
    /// Load a manifest from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        read_json(path.as_ref())
    }

    /// Direct requirements: `require` first, then `require-dev` entries not already declared.
    pub fn direct_dependencies(&self) -> Vec<(String, String, bool)> {
        merge_sections(&self.require, &self.require_dev)
    }
}

/// Merge a runtime and a dev section. Each item is `(name, requirement, is_dev)`.
fn merge_sections(
    regular: &IndexMap<String, String>,
    dev: &IndexMap<String, String>,
) -> Vec<(String, String, bool)> {
    let mut merged: IndexMap<&str, (&str, bool)> = IndexMap::new();
    for (name, req) in regular {
        merged.entry(name.as_str()).or_insert((req.as_str(), false));
    }
    for (name, req) in dev {
        merged.entry(name.as_str()).or_insert((req.as_str(), true));
    }
    merged
        .into_iter()
        .map(|(name, (req, is_dev))| (name.to_string(), req.to_string(), is_dev))
        .collect()
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Descriptor of the package owning a docmap, stamped on every entry it contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMeta {
    /// Package name.
    pub name: String,

    /// Package version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// License expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Primary author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,

    /// Homepage URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Ecosystem the descriptor was read from.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ecosystem: Option<Ecosystem>,
}

impl PackageMeta {
    /// Read the package descriptor of `root`.
    ///
    /// The `preferred` ecosystem's manifest is tried first, then the others.
    /// Returns `Ok(None)` when the directory carries no manifest at all.
    pub fn load(root: impl AsRef<Path>, preferred: Ecosystem) -> Result<Option<Self>, ManifestError> {
        let root = root.as_ref();

        for ecosystem in preferred.search_order() {
            let path = root.join(ecosystem.manifest_file());
            if !path.is_file() {
                continue;
            }
            let meta = match ecosystem {
                Ecosystem::Npm => Self::from_npm(&NpmManifest::from_path(&path)?),
                Ecosystem::Composer => Self::from_composer(&ComposerManifest::from_path(&path)?),
            };
            if let Some(meta) = meta {
                return Ok(Some(meta));
            }
        }

        Ok(None)
    }

    /// Descriptor named after the directory, for packages without a manifest.
    #[must_use]
    pub fn from_dir_name(root: &Path) -> Self {
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            ..Self::default()
        }
    }

    fn from_npm(manifest: &NpmManifest) -> Option<Self> {
        Some(Self {
            name: manifest.name.clone()?,
            version: manifest.version.clone(),
            description: manifest.description.clone(),
            license: manifest.license.as_ref().and_then(License::to_expression),
            author: manifest.author.as_ref().map(Person::to_author),
            homepage: manifest.homepage.clone(),
            ecosystem: Some(Ecosystem::Npm),
        })
    }

    fn from_composer(manifest: &ComposerManifest) -> Option<Self> {
        Some(Self {
            name: manifest.name.clone()?,
            version: manifest.version.clone(),
            description: manifest.description.clone(),
            license: manifest.license.as_ref().and_then(License::to_expression),
            author: manifest.authors.first().map(Person::to_author),
            homepage: manifest.homepage.clone(),
            ecosystem: Some(Ecosystem::Composer),
        })
    }
}
