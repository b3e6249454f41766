//! Navigation menu derived from entry `menu` annotations.
//!
//! Every entry with a `menu: { tree, slug }` annotation becomes a leaf placed
//! under its lower-cased tree segments and indexed by slug. Entries of the root
//! package feed the top-level view; each other package gets its own view with
//! slugs scoped under `/package/<name>`. Custom menus are filtered projections
//! of all of them.

mod custom;
mod tree;

pub use custom::{
    filter_slugs, filter_tree, CustomMenus, FilterDecision, FilterItem, FilterValue, KeyFilter,
    MenuFilter,
};
pub use tree::{MenuGroup, MenuLeaf, MenuNode, MenuTree};

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::entry::{Entry, EntryMap};
use crate::sort::locale_compare;

/// Slug → leaf carrying the full entry.
pub type SlugIndex = IndexMap<String, MenuLeaf>;

/// Errors raised while deriving the menu.
#[derive(Error, Debug)]
pub enum MenuError {
    #[error("menu slug '{slug}' of package '{package}' must start with '/'")]
    MalformedSlug { package: String, slug: String },

    #[error("invalid slug pattern '{pattern}' for custom menu '{menu}': {source}")]
    InvalidFilter {
        menu: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Menu of one non-root package.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageMenu {
    pub name: String,
    pub tree: MenuTree,
    pub slug: SlugIndex,
}

/// A filtered projection of every menu.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomMenu {
    pub tree: MenuTree,
    pub slug: SlugIndex,
}

/// The complete derived menu.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MenuView {
    /// Root package tree.
    pub tree: MenuTree,
    /// Root package slug index.
    pub slug: SlugIndex,
    /// Per-package menus, keyed by package name.
    pub packages: IndexMap<String, PackageMenu>,
    /// Custom menus, keyed by menu name.
    pub custom: IndexMap<String, CustomMenu>,
}

impl MenuView {
    /// Reorder every level of the view.
    pub fn sort_deep(&mut self) {
        self.tree.sort(true);
        sort_slugs(&mut self.slug, true);
        sort_keys(&mut self.packages);
        for package in self.packages.values_mut() {
            package.sort_deep();
        }
        sort_keys(&mut self.custom);
        for custom in self.custom.values_mut() {
            custom.sort_deep();
        }
    }
}

impl PackageMenu {
    pub fn sort_deep(&mut self) {
        self.tree.sort(true);
        sort_slugs(&mut self.slug, true);
    }
}

impl CustomMenu {
    pub fn sort_deep(&mut self) {
        self.tree.sort(true);
        sort_slugs(&mut self.slug, true);
    }
}

pub(crate) fn sort_keys<V>(map: &mut IndexMap<String, V>) {
    map.sort_by(|a, _, b, _| locale_compare(a, b));
}

/// Reorder a slug index; `deep` also reorders the fields of each referenced entry.
pub fn sort_slugs(slugs: &mut SlugIndex, deep: bool) {
    sort_keys(slugs);
    if deep {
        for leaf in slugs.values_mut() {
            leaf.sort_deep();
        }
    }
}

/// Derive the menu of a merged table.
///
/// `root_package` names the package whose entries form the top-level tree;
/// entries without a package descriptor also count as root entries.
pub fn build_menu(
    map: &EntryMap,
    root_package: &str,
    custom_menus: &CustomMenus,
) -> Result<MenuView, MenuError> {
    let mut partitions: IndexMap<&str, Vec<&Entry>> = IndexMap::new();
    for entry in map.values().filter(|e| e.menu.is_some()) {
        let package = entry.package_name().unwrap_or(root_package);
        partitions.entry(package).or_default().push(entry);
    }

    let mut view = MenuView::default();

    for (package, entries) in partitions {
        let (mut tree, slug) = build_partition(&entries);

        if package == root_package {
            view.tree = tree;
            view.slug = slug;
            continue;
        }

        let prefix = format!("/package/{package}");
        tree.try_for_each_leaf_mut(&mut |leaf| {
            leaf.slug = scope_slug(&prefix, package, &leaf.slug)?;
            Ok::<(), MenuError>(())
        })?;

        let mut scoped = SlugIndex::with_capacity(slug.len());
        for (key, mut leaf) in slug {
            let key = scope_slug(&prefix, package, &key)?;
            leaf.slug.clone_from(&key);
            scoped.insert(key, leaf);
        }

        debug!(package, leaves = scoped.len(), "built package menu");
        view.packages.insert(
            package.to_string(),
            PackageMenu {
                name: package.to_string(),
                tree,
                slug: scoped,
            },
        );
    }

    for (name, filter) in custom_menus.iter() {
        let mut menu = CustomMenu {
            tree: filter_tree(&view.tree, filter),
            slug: filter_slugs(&view.slug, filter),
        };
        for package in view.packages.values() {
            menu.tree.merge(filter_tree(&package.tree, filter));
            menu.slug.extend(filter_slugs(&package.slug, filter));
        }
        debug!(menu = name, leaves = menu.slug.len(), "built custom menu");
        view.custom.insert(name.to_string(), menu);
    }

    Ok(view)
}

/// Tree and slug index of one package's entries.
fn build_partition(entries: &[&Entry]) -> (MenuTree, SlugIndex) {
    let mut tree = MenuTree::new();
    let mut slugs = SlugIndex::new();

    for entry in entries {
        let Some(menu) = &entry.menu else {
            continue;
        };
        let leaf = MenuLeaf {
            name: entry.display_name().to_string(),
            alias: entry.alias.clone(),
            slug: menu.slug.clone(),
            tree: menu.tree.clone(),
            docmap: None,
        };

        if !menu.slug.is_empty() {
            slugs.insert(
                menu.slug.clone(),
                MenuLeaf {
                    docmap: Some(Box::new((*entry).clone())),
                    ..leaf.clone()
                },
            );
        }
        tree.insert_leaf(&menu.tree, entry.display_name(), leaf);
    }

    (tree, slugs)
}

/// `/package/<name><slug>`; empty slugs stay empty.
fn scope_slug(prefix: &str, package: &str, slug: &str) -> Result<String, MenuError> {
    if slug.is_empty() {
        return Ok(String::new());
    }
    if !slug.starts_with('/') {
        return Err(MenuError::MalformedSlug {
            package: package.to_string(),
            slug: slug.to_string(),
        });
    }
    Ok(format!("{prefix}{slug}"))
}
