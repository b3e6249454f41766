//! Menu tree nodes.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::entry::Entry;
use crate::sort::{locale_compare, sort_json_value};

/// A menu leaf, one per entry carrying a `menu` annotation.
#[derive(Debug, Clone, Serialize)]
pub struct MenuLeaf {
    /// Entry display name.
    pub name: String,

    /// Entry alias.
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Routable slug.
    pub slug: String,

    /// Original-case menu segments.
    pub tree: Vec<String>,

    /// The full entry; only set on leaves of a slug index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docmap: Option<Box<Entry>>,
}

/// A grouping node: original-case display name plus children keyed by lower-cased segment.
#[derive(Debug, Clone, Serialize)]
pub struct MenuGroup {
    pub name: String,
    #[serde(flatten)]
    pub children: MenuTree,
}

impl MenuGroup {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: MenuTree::new(),
        }
    }
}

/// A node of the menu tree.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MenuNode {
    Group(MenuGroup),
    Leaf(MenuLeaf),
}

impl MenuNode {
    /// The display name of the node.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Group(group) => &group.name,
            Self::Leaf(leaf) => &leaf.name,
        }
    }
}

/// Ordered children of one menu level.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MenuTree(IndexMap<String, MenuNode>);

impl MenuTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MenuNode> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut MenuNode> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, node: MenuNode) -> Option<MenuNode> {
        self.0.insert(key.into(), node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MenuNode)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The node at a path of keys.
    #[must_use]
    pub fn at(&self, keys: &[&str]) -> Option<&MenuNode> {
        let (first, rest) = keys.split_first()?;
        let node = self.0.get(*first)?;
        match (node, rest.is_empty()) {
            (_, true) => Some(node),
            (MenuNode::Group(group), false) => group.children.at(rest),
            (MenuNode::Leaf(_), false) => None,
        }
    }

    /// Place `leaf` under the groups named by `segments`, keyed by `leaf_key`.
    ///
    /// Missing groups are created with the segment as display name and its
    /// lower-cased form as key. A leaf standing where a group is needed is
    /// replaced by the group; a group standing where the leaf goes is kept.
    pub fn insert_leaf(&mut self, segments: &[String], leaf_key: &str, leaf: MenuLeaf) {
        let mut current = self;
        for segment in segments {
            let key = segment.to_lowercase();
            let node = current
                .0
                .entry(key)
                .or_insert_with(|| MenuNode::Group(MenuGroup::new(segment.clone())));
            if let MenuNode::Leaf(existing) = node {
                warn!(
                    group = %segment,
                    leaf = %existing.name,
                    "menu group replaces a leaf at the same path"
                );
                *node = MenuNode::Group(MenuGroup::new(segment.clone()));
            }
            let MenuNode::Group(group) = node else {
                return;
            };
            current = &mut group.children;
        }

        if let Some(MenuNode::Group(_)) = current.0.get(leaf_key) {
            warn!(leaf = %leaf_key, slug = %leaf.slug, "menu leaf collides with a group, keeping the group");
            return;
        }
        current.0.insert(leaf_key.to_string(), MenuNode::Leaf(leaf));
    }

    /// Merge `other` into this tree: groups merge recursively, anything else replaces.
    pub fn merge(&mut self, other: MenuTree) {
        for (key, node) in other.0 {
            match (self.0.get_mut(&key), node) {
                (Some(MenuNode::Group(mine)), MenuNode::Group(theirs)) => {
                    mine.name = theirs.name;
                    mine.children.merge(theirs.children);
                }
                (_, node) => {
                    self.0.insert(key, node);
                }
            }
        }
    }

    /// Visit every leaf, depth first, stopping at the first error.
    pub fn try_for_each_leaf_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut MenuLeaf) -> Result<(), E>,
    ) -> Result<(), E> {
        for node in self.0.values_mut() {
            match node {
                MenuNode::Group(group) => group.children.try_for_each_leaf_mut(f)?,
                MenuNode::Leaf(leaf) => f(leaf)?,
            }
        }
        Ok(())
    }

    /// Keep only the nodes for which `f` returns a subtree.
    pub(crate) fn filter_map(&self, f: &mut impl FnMut(&str, &MenuNode) -> Option<MenuNode>) -> Self {
        Self(
            self.0
                .iter()
                .filter_map(|(key, node)| f(key, node).map(|n| (key.clone(), n)))
                .collect(),
        )
    }

    /// Reorder keys; `deep` also reorders every nested level and leaf entry fields.
    pub fn sort(&mut self, deep: bool) {
        self.0.sort_by(|a, _, b, _| locale_compare(a, b));
        if !deep {
            return;
        }
        for node in self.0.values_mut() {
            match node {
                MenuNode::Group(group) => group.children.sort(true),
                MenuNode::Leaf(leaf) => leaf.sort_deep(),
            }
        }
    }
}

impl MenuLeaf {
    pub(crate) fn sort_deep(&mut self) {
        if let Some(entry) = self.docmap.as_mut() {
            for value in entry.fields.values_mut() {
                sort_json_value(value, true);
            }
        }
    }
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

    fn segments(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn insert_creates_lowercase_groups() {
        let mut tree = MenuTree::new();
        tree.insert_leaf(&segments(&["Guides", "Getting Started"]), "intro", leaf("intro", "/guides/start"));

        let group = tree.at(&["guides"]).unwrap();
        assert_eq!(group.name(), "Guides");
        let inner = tree.at(&["guides", "getting started"]).unwrap();
        assert_eq!(inner.name(), "Getting Started");
        assert!(matches!(
            tree.at(&["guides", "getting started", "intro"]),
            Some(MenuNode::Leaf(l)) if l.slug == "/guides/start"
        ));
    }

    #[test]
    fn group_replaces_leaf_on_path() {
        let mut tree = MenuTree::new();
        tree.insert_leaf(&segments(&["Guides"]), "setup", leaf("setup", "/a"));
        tree.insert_leaf(&segments(&["Guides", "Setup"]), "linux", leaf("linux", "/b"));

        assert!(matches!(tree.at(&["guides", "setup"]), Some(MenuNode::Group(_))));
        assert!(tree.at(&["guides", "setup", "linux"]).is_some());
    }

    #[test]
    fn merge_is_recursive_for_groups() {
        let mut a = MenuTree::new();
        a.insert_leaf(&segments(&["Docs"]), "one", leaf("one", "/1"));
        let mut b = MenuTree::new();
        b.insert_leaf(&segments(&["Docs"]), "two", leaf("two", "/2"));
        b.insert_leaf(&segments(&["Docs"]), "one", leaf("one", "/1b"));

        a.merge(b);
        let docs: Vec<_> = match a.get("docs").unwrap() {
            MenuNode::Group(g) => g.children.keys().collect(),
            MenuNode::Leaf(_) => panic!("expected group"),
        };
        assert_eq!(docs, vec!["one", "two"]);
        assert!(matches!(a.at(&["docs", "one"]), Some(MenuNode::Leaf(l)) if l.slug == "/1b"));
    }

    #[test]
    fn group_serializes_name_with_children() {
        let mut tree = MenuTree::new();
        tree.insert_leaf(&segments(&["Guides"]), "intro", leaf("intro", "/intro"));
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "guides": {
                    "name": "Guides",
                    "intro": { "name": "intro", "slug": "/intro", "tree": [] }
                }
            })
        );
    }

    #[test]
    fn sort_shallow_and_deep() {
        let mut tree = MenuTree::new();
        tree.insert_leaf(&segments(&["b"]), "z", leaf("z", "/z"));
        tree.insert_leaf(&segments(&["b"]), "a", leaf("a", "/a"));
        tree.insert_leaf(&segments(&["A"]), "x", leaf("x", "/x"));

        let mut shallow = tree.clone();
        shallow.sort(false);
        assert_eq!(shallow.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        let MenuNode::Group(b) = shallow.get("b").unwrap() else { panic!() };
        assert_eq!(b.children.keys().collect::<Vec<_>>(), vec!["z", "a"]);

        tree.sort(true);
        let MenuNode::Group(b) = tree.get("b").unwrap() else { panic!() };
        assert_eq!(b.children.keys().collect::<Vec<_>>(), vec!["a", "z"]);
    }
}
