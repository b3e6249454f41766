//! Package management for docmap.
//!
//! This crate provides:
//! - Parsing of npm (`package.json`) and composer (`composer.json`) manifests
//! - Package descriptors stamped on documentation entries
//! - Package-root and monorepo-root discovery
//! - Direct dependency enumeration and `docmap.json` resolution

mod manifest;
mod package;
mod resolve;

pub use manifest::{
    Author, ComposerManifest, License, LicenseObject, ManifestError, NpmManifest, PackageMeta,
    Person,
};
pub use package::{
    find_highest_root, find_root, is_package_root, normalize_path, Ecosystem, COMPOSER_JSON,
    DOCMAP_FILE, PACKAGE_JSON,
};
pub use resolve::{direct_dependencies, DeclaredDependency, DependencySection, DocmapResolver};
