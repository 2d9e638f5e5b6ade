use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};

use crate::path::first_segment;

/// A set of directory names. Empty names are never members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSet(HashSet<String>);

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() {
            return false;
        }
        self.0.insert(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.0.iter().map(String::as_str).collect();
        set.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for NameSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl Serialize for NameSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sorted().serialize(serializer)
    }
}

/// Prefix the specifier with '/' when its first segment is a top-level project
/// directory that is not shadowed by an installed package.
pub fn promote(
    specifier: &str,
    absolute_prefix: &str,
    top_level: &NameSet,
    installed: &NameSet,
) -> Option<String> {
    if specifier.starts_with(absolute_prefix) {
        return None;
    }
    let head = first_segment(specifier);
    if top_level.contains(head) && !installed.contains(head) {
        Some(format!("/{}", specifier))
    } else {
        None
    }
}
