//! Alphabetical reordering of parts of an aggregated docmap, addressed by dotted path.
//!
//! Recognized paths:
//!
//! - `map`, `map.<id>`, `map.<id>.<field>...`
//! - `menu`, `menu.tree`, `menu.tree.<segment>...`, `menu.slug`, `menu.slug.<slug>`
//! - `menu.packages`, `menu.packages.<name>`, `menu.packages.<name>.tree[...]`, `menu.packages.<name>.slug`
//! - `menu.custom`, `menu.custom.<name>`, `menu.custom.<name>.tree[...]`, `menu.custom.<name>.slug`
//!
//! Keys containing dots are matched greedily against the existing keys.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::debug;

use crate::docmap::DocmapIndex;
use crate::entry::Entry;
use crate::menu::{
    sort_keys, sort_slugs, CustomMenu, MenuNode, MenuTree, MenuView, PackageMenu, SlugIndex,
};

/// How far below the addressed collection ordering applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Only the addressed collection.
    Shallow,
    /// The addressed collection and every collection nested in it.
    Deep,
}

impl SortMode {
    fn is_deep(self) -> bool {
        self == Self::Deep
    }
}

/// Locale-style comparison: case-insensitive first, lower case before upper case on ties.
#[must_use]
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| {
        for (x, y) in a.chars().zip(b.chars()) {
            if x != y {
                return match (x.is_lowercase(), y.is_lowercase()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => x.cmp(&y),
                };
            }
        }
        a.len().cmp(&b.len())
    })
}

/// Reorder the keys of a JSON object; `deep` recurses into nested objects and arrays.
pub fn sort_json_value(value: &mut Value, deep: bool) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| locale_compare(a, b));
            if deep {
                for (_, nested) in &mut entries {
                    sort_json_value(nested, true);
                }
            }
            *map = entries.into_iter().collect::<Map<String, Value>>();
        }
        Value::Array(items) if deep => {
            for item in items {
                sort_json_value(item, true);
            }
        }
        _ => {}
    }
}

/// Sort the collection at `path`. Returns false when the path resolves to nothing.
pub fn sort_path(index: &mut DocmapIndex, path: &str, mode: SortMode) -> bool {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let deep = mode.is_deep();

    let found = match segments.split_first() {
        Some((&"map", rest)) => sort_map(&mut index.map, rest, deep),
        Some((&"menu", rest)) => index
            .menu
            .as_mut()
            .is_some_and(|menu| sort_menu(menu, rest, deep)),
        _ => false,
    };

    if !found {
        debug!(path, "sort path not found");
    }
    found
}

fn sort_map(map: &mut IndexMap<String, Entry>, rest: &[&str], deep: bool) -> bool {
    if rest.is_empty() {
        sort_keys(map);
        if deep {
            for entry in map.values_mut() {
                sort_entry(entry, true);
            }
        }
        return true;
    }
    let Some((id, rest)) = split_key(map.keys().map(String::as_str), rest) else {
        return false;
    };
    let Some(entry) = map.get_mut(&id) else {
        return false;
    };
    if rest.is_empty() {
        sort_entry(entry, deep);
        return true;
    }
    let Some((field, rest)) = split_key(entry.fields.keys().map(String::as_str), rest) else {
        return false;
    };
    entry
        .fields
        .get_mut(&field)
        .is_some_and(|value| sort_value_at(value, rest, deep))
}

/// Typed entry attributes keep their declared order; only the open field set is reordered.
fn sort_entry(entry: &mut Entry, deep: bool) {
    let mut fields = Value::Object(std::mem::take(&mut entry.fields));
    sort_json_value(&mut fields, deep);
    if let Value::Object(map) = fields {
        entry.fields = map;
    }
}

fn sort_value_at(value: &mut Value, rest: &[&str], deep: bool) -> bool {
    let Some((first, tail)) = rest.split_first() else {
        if !value.is_object() {
            return false;
        }
        sort_json_value(value, deep);
        return true;
    };
    match value {
        Value::Object(map) => map
            .get_mut(*first)
            .is_some_and(|nested| sort_value_at(nested, tail, deep)),
        _ => false,
    }
}

fn sort_menu(menu: &mut MenuView, rest: &[&str], deep: bool) -> bool {
    match rest.split_first() {
        None => {
            if deep {
                menu.sort_deep();
            }
            true
        }
        Some((&"tree", rest)) => sort_tree_at(&mut menu.tree, rest, deep),
        Some((&"slug", rest)) => sort_slug_at(&mut menu.slug, rest, deep),
        Some((&"packages", rest)) => sort_named(&mut menu.packages, rest, deep, sort_package),
        Some((&"custom", rest)) => sort_named(&mut menu.custom, rest, deep, sort_custom),
        Some(_) => false,
    }
}

fn sort_named<V>(
    map: &mut IndexMap<String, V>,
    rest: &[&str],
    deep: bool,
    descend: impl Fn(&mut V, &[&str], bool) -> bool,
) -> bool {
    if rest.is_empty() {
        sort_keys(map);
        if deep {
            for value in map.values_mut() {
                descend(value, &[], true);
            }
        }
        return true;
    }
    let Some((name, rest)) = split_key(map.keys().map(String::as_str), rest) else {
        return false;
    };
    map.get_mut(&name)
        .is_some_and(|value| descend(value, rest, deep))
}

fn sort_package(package: &mut PackageMenu, rest: &[&str], deep: bool) -> bool {
    match rest.split_first() {
        None => {
            if deep {
                package.sort_deep();
            }
            true
        }
        Some((&"tree", rest)) => sort_tree_at(&mut package.tree, rest, deep),
        Some((&"slug", rest)) => sort_slug_at(&mut package.slug, rest, deep),
        Some(_) => false,
    }
}

fn sort_custom(custom: &mut CustomMenu, rest: &[&str], deep: bool) -> bool {
    match rest.split_first() {
        None => {
            if deep {
                custom.sort_deep();
            }
            true
        }
        Some((&"tree", rest)) => sort_tree_at(&mut custom.tree, rest, deep),
        Some((&"slug", rest)) => sort_slug_at(&mut custom.slug, rest, deep),
        Some(_) => false,
    }
}

fn sort_tree_at(tree: &mut MenuTree, rest: &[&str], deep: bool) -> bool {
    if rest.is_empty() {
        tree.sort(deep);
        return true;
    }
    let Some((key, rest)) = split_key(tree.keys(), rest) else {
        return false;
    };
    match tree.get_mut(&key) {
        Some(MenuNode::Group(group)) => sort_tree_at(&mut group.children, rest, deep),
        Some(MenuNode::Leaf(leaf)) if rest.is_empty() => {
            if deep {
                leaf.sort_deep();
            }
            true
        }
        _ => false,
    }
}

fn sort_slug_at(slugs: &mut SlugIndex, rest: &[&str], deep: bool) -> bool {
    if rest.is_empty() {
        sort_slugs(slugs, deep);
        return true;
    }
    let joined = rest.join(".");
    match slugs.get_mut(&joined) {
        Some(leaf) => {
            if deep {
                leaf.sort_deep();
            }
            true
        }
        None => false,
    }
}

/// Match the longest run of leading segments that, joined with dots, is one of `keys`.
fn split_key<'k, 'a, 'p>(
    keys: impl IntoIterator<Item = &'k str>,
    segments: &'a [&'p str],
) -> Option<(String, &'a [&'p str])> {
    let keys: Vec<&str> = keys.into_iter().collect();
    (1..=segments.len()).rev().find_map(|n| {
        let candidate = segments[..n].join(".");
        keys.contains(&candidate.as_str())
            .then(|| (candidate, &segments[n..]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{build_menu, CustomMenus};
    use serde_json::json;

    fn index() -> DocmapIndex {
        let mut map: IndexMap<String, Entry> = serde_json::from_value(json!({
            "z.b": { "name": "b", "package": { "name": "site" },
                     "menu": { "tree": ["Zeta", "Beta"], "slug": "/z/b" }, "zeta": 1, "Alpha": 2 },
            "a.a": { "name": "a", "package": { "name": "site" },
                     "menu": { "tree": ["Zeta", "Alpha"], "slug": "/z/a" } },
            "z.c": { "name": "c", "package": { "name": "zed-lib" },
                     "menu": { "tree": ["Y"], "slug": "/y/c" } },
            "a.d": { "name": "d", "package": { "name": "alpha.lib" },
                     "menu": { "tree": ["Y", "Q"], "slug": "/y/d" } },
            "a.e": { "name": "e", "package": { "name": "alpha.lib" },
                     "menu": { "tree": ["Y", "B"], "slug": "/y/e" } }
        }))
        .unwrap();
        for (id, entry) in &mut map {
            entry.id.clone_from(id);
        }
        let menu = build_menu(&map, "site", &CustomMenus::new()).unwrap();
        DocmapIndex {
            map,
            menu: Some(menu),
        }
    }

    #[test]
    fn locale_compare_orders_case_insensitively() {
        let mut words = vec!["banana", "Apple", "apple", "Cherry", "b"];
        words.sort_by(|a, b| locale_compare(a, b));
        assert_eq!(words, vec!["apple", "Apple", "b", "banana", "Cherry"]);
    }

    #[test]
    fn shallow_packages_sort() {
        let mut index = index();
        assert!(sort_path(&mut index, "menu.packages", SortMode::Shallow));
        let menu = index.menu.as_ref().unwrap();
        let names: Vec<_> = menu.packages.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["alpha.lib", "zed-lib"]);
        let y: Vec<_> = match menu.packages["alpha.lib"].tree.get("y").unwrap() {
            MenuNode::Group(g) => g.children.keys().collect(),
            MenuNode::Leaf(_) => panic!("expected group"),
        };
        assert_eq!(y, vec!["q", "b"]);
    }

    #[test]
    fn deep_packages_sort() {
        let mut index = index();
        assert!(sort_path(&mut index, "menu.packages", SortMode::Deep));
        let menu = index.menu.as_ref().unwrap();
        let y: Vec<_> = match menu.packages["alpha.lib"].tree.get("y").unwrap() {
            MenuNode::Group(g) => g.children.keys().collect(),
            MenuNode::Leaf(_) => panic!("expected group"),
        };
        assert_eq!(y, vec!["b", "q"]);
    }

    #[test]
    fn dotted_package_name_resolves() {
        let mut index = index();
        assert!(sort_path(&mut index, "menu.packages.alpha.lib.tree", SortMode::Deep));
        assert!(sort_path(&mut index, "menu.packages.alpha.lib", SortMode::Shallow));
        assert!(!sort_path(&mut index, "menu.packages.alpha", SortMode::Shallow));
    }

    #[test]
    fn map_sort_shallow_and_deep() {
        let mut index = index();
        assert!(sort_path(&mut index, "map", SortMode::Shallow));
        let ids: Vec<_> = index.map.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["a.a", "a.d", "a.e", "z.b", "z.c"]);
        let fields: Vec<_> = index.map["z.b"].fields.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["zeta", "Alpha"]);

        assert!(sort_path(&mut index, "map.z.b", SortMode::Shallow));
        let fields: Vec<_> = index.map["z.b"].fields.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["Alpha", "zeta"]);
    }

    #[test]
    fn menu_tree_path() {
        let mut index = index();
        assert!(sort_path(&mut index, "menu.tree.zeta", SortMode::Shallow));
        let menu = index.menu.as_ref().unwrap();
        let zeta: Vec<_> = match menu.tree.get("zeta").unwrap() {
            MenuNode::Group(g) => g.children.keys().collect(),
            MenuNode::Leaf(_) => panic!("expected group"),
        };
        assert_eq!(zeta, vec!["alpha", "beta"]);
    }

    #[test]
    fn missing_paths_are_noops() {
        let mut index = index();
        assert!(!sort_path(&mut index, "menu.custom.styleguide", SortMode::Deep));
        assert!(!sort_path(&mut index, "nothing", SortMode::Shallow));
        assert!(!sort_path(&mut index, "menu.tree.missing", SortMode::Shallow));

        let mut empty = DocmapIndex::default();
        assert!(!sort_path(&mut empty, "menu.packages", SortMode::Shallow));
    }
}
