//! Custom menus: named views of the menu filtered by a predicate.

use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::tree::{MenuGroup, MenuLeaf, MenuNode, MenuTree};
use super::{MenuError, SlugIndex};

/// What a custom-menu predicate decides for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Keep the node and everything below it.
    Keep,
    /// Drop the node and everything below it.
    Drop,
    /// Ask again for each child; groups left empty are dropped.
    ///
    /// A leaf has no children, so a leaf answering `Descend` is dropped from
    /// both the tree and the slug index.
    Descend,
}

impl From<bool> for FilterDecision {
    fn from(keep: bool) -> Self {
        if keep {
            Self::Keep
        } else {
            Self::Drop
        }
    }
}

/// The node a predicate is asked about.
#[derive(Debug, Clone, Copy)]
pub enum FilterValue<'a> {
    Group(&'a MenuGroup),
    Leaf(&'a MenuLeaf),
}

/// One key/value pair presented to a predicate.
#[derive(Debug, Clone, Copy)]
pub struct FilterItem<'a> {
    /// Tree key (lower-cased segment or leaf name) or slug index key.
    pub key: &'a str,
    pub value: FilterValue<'a>,
}

impl FilterItem<'_> {
    /// Returns true if the node has children.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.value, FilterValue::Group(_))
    }
}

/// A custom-menu predicate.
pub type MenuFilter = Arc<dyn Fn(&FilterItem<'_>) -> FilterDecision + Send + Sync>;

/// Predicate keeping one top-level key plus every slug matching a pattern.
///
/// Keys without a `/` are only kept when equal to `key`, so the tree keeps the
/// whole `key` group and the slug index keeps the matching routes.
#[derive(Debug, Clone)]
pub struct KeyFilter {
    key: String,
    slug: Regex,
}

impl KeyFilter {
    /// Create a filter for `key`, keeping slugs matching `slug_pattern`.
    pub fn new(
        menu: &str,
        key: impl Into<String>,
        slug_pattern: &str,
    ) -> Result<Self, MenuError> {
        let slug = Regex::new(slug_pattern).map_err(|source| MenuError::InvalidFilter {
            menu: menu.to_string(),
            pattern: slug_pattern.to_string(),
            source,
        })?;
        Ok(Self {
            key: key.into(),
            slug,
        })
    }

    /// Decide for one item.
    #[must_use]
    pub fn decide(&self, item: &FilterItem<'_>) -> FilterDecision {
        let keep = item.key == self.key || (item.key.contains('/') && self.slug.is_match(item.key));
        keep.into()
    }

    #[must_use]
    pub fn into_filter(self) -> MenuFilter {
        Arc::new(move |item: &FilterItem<'_>| self.decide(item))
    }
}

/// Named custom-menu predicates, in registration order.
#[derive(Clone)]
pub struct CustomMenus {
    filters: IndexMap<String, MenuFilter>,
}

impl CustomMenus {
    /// No custom menus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: IndexMap::new(),
        }
    }

    /// The `styleguide` and `specs` menus.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut menus = Self::new();
        for (name, pattern) in [
            ("styleguide", "^([a-zA-Z0-9_@/-]+)?/styleguide/"),
            ("specs", "^([a-zA-Z0-9_@/-]+)?/views/"),
        ] {
            // The built-in patterns are known to compile.
            if let Ok(filter) = KeyFilter::new(name, name, pattern) {
                menus.insert(name, filter.into_filter());
            }
        }
        menus
    }

    /// Register or replace a custom menu.
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&FilterItem<'_>) -> FilterDecision + Send + Sync + 'static,
    {
        self.insert(name, Arc::new(filter))
    }

    pub fn insert(&mut self, name: impl Into<String>, filter: MenuFilter) -> &mut Self {
        self.filters.insert(name.into(), filter);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MenuFilter)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for CustomMenus {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for CustomMenus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.filters.keys()).finish()
    }
}

/// Filter a menu tree.
#[must_use]
pub fn filter_tree(tree: &MenuTree, filter: &MenuFilter) -> MenuTree {
    tree.filter_map(&mut |key, node| {
        let value = match node {
            MenuNode::Group(group) => FilterValue::Group(group),
            MenuNode::Leaf(leaf) => FilterValue::Leaf(leaf),
        };
        match (filter(&FilterItem { key, value }), node) {
            (FilterDecision::Keep, _) => Some(node.clone()),
            (FilterDecision::Descend, MenuNode::Group(group)) => {
                let children = filter_tree(&group.children, filter);
                (!children.is_empty()).then(|| {
                    MenuNode::Group(MenuGroup {
                        name: group.name.clone(),
                        children,
                    })
                })
            }
            (FilterDecision::Drop | FilterDecision::Descend, _) => None,
        }
    })
}

/// Filter a slug index. Only leaves answering [`FilterDecision::Keep`] remain.
#[must_use]
pub fn filter_slugs(slugs: &SlugIndex, filter: &MenuFilter) -> SlugIndex {
    slugs
        .iter()
        .filter(|(key, leaf)| {
            filter(&FilterItem {
                key: key.as_str(),
                value: FilterValue::Leaf(leaf),
            }) == FilterDecision::Keep
        })
        .map(|(key, leaf)| (key.clone(), leaf.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, slug: &str) -> MenuLeaf {
        MenuLeaf {
            name: name.to_string(),
            alias: None,
            slug: slug.to_string(),
            tree: Vec::new(),
            docmap: None,
        }
    }

    fn sample() -> MenuTree {
        let mut tree = MenuTree::new();
        tree.insert_leaf(&["Styleguide".to_string(), "Buttons".to_string()], "primary", leaf("primary", "/styleguide/buttons/primary"));
        tree.insert_leaf(&["Guides".to_string()], "intro", leaf("intro", "/guides/intro"));
        tree.insert_leaf(&["Guides".to_string(), "Styleguide".to_string()], "tokens", leaf("tokens", "/guides/styleguide/tokens"));
        tree
    }

    #[test]
    fn default_styleguide_keeps_top_level_group() {
        let menus = CustomMenus::with_defaults();
        let (_, styleguide) = menus.iter().next().unwrap();
        let filtered = filter_tree(&sample(), styleguide);
        assert_eq!(filtered.keys().collect::<Vec<_>>(), vec!["styleguide"]);
        assert!(filtered.at(&["styleguide", "buttons", "primary"]).is_some());
    }

    #[test]
    fn default_styleguide_keeps_matching_slugs() {
        let menus = CustomMenus::with_defaults();
        let (_, styleguide) = menus.iter().next().unwrap();
        let slugs: SlugIndex = [
            ("/styleguide/buttons/primary", leaf("primary", "/styleguide/buttons/primary")),
            ("/package/@acme/ui/styleguide/cards", leaf("cards", "/package/@acme/ui/styleguide/cards")),
            ("/guides/intro", leaf("intro", "/guides/intro")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let filtered = filter_slugs(&slugs, styleguide);
        assert_eq!(
            filtered.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["/styleguide/buttons/primary", "/package/@acme/ui/styleguide/cards"]
        );
    }

    #[test]
    fn descend_drops_empty_groups() {
        let filter: MenuFilter = Arc::new(|item: &FilterItem<'_>| {
            if item.is_group() {
                FilterDecision::Descend
            } else {
                (item.key == "tokens").into()
            }
        });
        let filtered = filter_tree(&sample(), &filter);
        assert_eq!(filtered.keys().collect::<Vec<_>>(), vec!["guides"]);
        assert!(filtered.at(&["guides", "intro"]).is_none());
        assert!(filtered.at(&["guides", "styleguide", "tokens"]).is_some());
    }

    #[test]
    fn descend_on_a_leaf_drops_it() {
        let filter: MenuFilter = Arc::new(|_: &FilterItem<'_>| FilterDecision::Descend);
        assert!(filter_tree(&sample(), &filter).is_empty());

        let slugs: SlugIndex = [("/guides/intro".to_string(), leaf("intro", "/guides/intro"))]
            .into_iter()
            .collect();
        assert!(filter_slugs(&slugs, &filter).is_empty());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = KeyFilter::new("broken", "broken", "(").unwrap_err();
        assert!(matches!(err, MenuError::InvalidFilter { menu, .. } if menu == "broken"));
    }
}
