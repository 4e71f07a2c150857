//! Helper registry: one name and one body per (source struct, target struct).
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::shape::{StructShape, package_alias};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HelperKey {
    pub source: String,
    pub target: String,
}

impl HelperKey {
    pub fn new(source: &StructShape, target: &StructShape) -> Self {
        Self {
            source: format!("{}.{}", source.package, source.name),
            target: format!("{}.{}", target.package, target.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HelperEntry {
    pub key: HelperKey,
    pub name: String,
    /// `None` while the body is being synthesized.
    pub body: Option<String>,
}

pub enum Reservation {
    Existing(String),
    New { name: String, slot: usize },
}

#[derive(Debug, Default)]
pub struct HelperRegistry {
    names: HashMap<HelperKey, String>,
    taken: HashSet<String>,
    entries: Vec<HelperEntry>,
}

impl HelperRegistry {
    pub fn new() -> Self { Self::default() }

    /// Look up or register the helper for a struct pair.
    /// A new key is registered (and its name taken) before any body exists,
    /// so a cyclic request made while synthesizing it gets `Existing`.
    pub fn reserve(&mut self, source: &StructShape, target: &StructShape) -> Reservation {
        let key = HelperKey::new(source, target);
        if let Some(name) = self.names.get(&key) {
            return Reservation::Existing(name.clone());
        }
        let name = self.canonical_name(source, target);
        self.taken.insert(name.clone());
        self.names.insert(key.clone(), name.clone());
        self.entries.push(HelperEntry { key, name: name.clone(), body: None });
        Reservation::New { name, slot: self.entries.len() - 1 }
    }

    pub fn fill(&mut self, slot: usize, body: String) {
        if let Some(entry) = self.entries.get_mut(slot) {
            entry.body = Some(body);
        }
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entries in registration order.
    pub fn entries(&self) -> &[HelperEntry] {
        &self.entries
    }

    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.body.as_deref())
    }

    /// `map{Source}To{Target}`; package aliases are folded in when two
    /// different pairs share struct names.
    fn canonical_name(&self, source: &StructShape, target: &StructShape) -> String {
        let short = format!("map{}To{}", source.name, target.name);
        if !self.taken.contains(&short) {
            return short;
        }
        let long = format!(
            "map{}{}To{}{}",
            exported(package_alias(&source.package)),
            source.name,
            exported(package_alias(&target.package)),
            target.name,
        );
        if !self.taken.contains(&long) {
            return long;
        }
        (2..)
            .map(|n| format!("{long}{n}"))
            .find(|candidate| !self.taken.contains(candidate))
            .unwrap_or(long)
    }
}

/// `go-lib.v2` → `Golibv2`
fn exported(alias: &str) -> String {
    let mut chars = alias.chars().filter(|c| c.is_alphanumeric() || *c == '_');
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strukt(package: &str, name: &str) -> StructShape {
        StructShape { name: name.into(), package: package.into(), fields: Vec::new() }
    }

    #[test]
    fn repeated_requests_reuse_the_name() {
        let mut reg = HelperRegistry::new();
        let (a, b) = (strukt("x/source", "Child"), strukt("x/target", "ChildDTO"));
        let Reservation::New { name, slot } = reg.reserve(&a, &b) else { panic!("expected new") };
        assert_eq!(name, "mapChildToChildDTO");
        assert!(matches!(reg.reserve(&a, &b), Reservation::Existing(n) if n == name));
        reg.fill(slot, "body".into());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.bodies().collect::<Vec<_>>(), ["body"]);
    }

    #[test]
    fn unfilled_entries_are_skipped() {
        let mut reg = HelperRegistry::new();
        reg.reserve(&strukt("x/a", "A"), &strukt("x/b", "B"));
        assert_eq!(reg.bodies().count(), 0);
        assert!(reg.entries()[0].body.is_none());
    }

    #[test]
    fn same_names_in_other_packages_get_qualified() {
        let mut reg = HelperRegistry::new();
        reg.reserve(&strukt("x/source", "User"), &strukt("x/target", "User"));
        let Reservation::New { name, .. } = reg.reserve(&strukt("x/legacy", "User"), &strukt("x/target", "User")) else {
            panic!("expected new")
        };
        assert_eq!(name, "mapLegacyUserToTargetUser");
        let Reservation::New { name, .. } = reg.reserve(&strukt("y/legacy", "User"), &strukt("y/target", "User")) else {
            panic!("expected new")
        };
        assert_eq!(name, "mapLegacyUserToTargetUser2");
    }

    #[test]
    fn exported_alias() {
        assert_eq!(exported("go-lib.v2"), "Golibv2");
        assert_eq!(exported("source"), "Source");
    }
}
