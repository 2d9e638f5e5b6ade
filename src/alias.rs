use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::path::first_segment;

/// Alias key -> real path prefix, both without the `/*` wildcard suffix.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasMap(BTreeMap<String, String>);

#[derive(Debug, Deserialize)]
struct TsConfig {
    #[serde(rename = "compilerOptions")]
    compiler_options: Option<CompilerOptions>,
}

#[derive(Debug, Deserialize)]
struct CompilerOptions {
    paths: Option<HashMap<String, Vec<String>>>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, target: impl Into<String>) {
        self.0.insert(key.into(), target.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse the `compilerOptions.paths` table of a tsconfig.json document.
    ///
    /// Returns `Ok(None)` when the document has no `paths` table. Only the first
    /// target of each key is used and the first `/*` is dropped from both sides.
    pub fn from_tsconfig_str(json: &str) -> Result<Option<Self>, serde_json::Error> {
        let cfg: TsConfig = serde_json::from_str(json)?;
        let Some(paths) = cfg.compiler_options.and_then(|c| c.paths) else {
            return Ok(None);
        };
        let mut map = Self::new();
        for (key, targets) in paths {
            let Some(target) = targets.first() else {
                log::warn!("alias: `{}` has no target path, skipped", key);
                continue;
            };
            map.insert(key.replacen("/*", "", 1), target.replacen("/*", "", 1));
        }
        Ok(Some(map))
    }
}

impl FromIterator<(String, String)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Substitute the specifier's first segment when it is an alias key.
///
/// The replacement is made root-relative: `shared/x` with `shared -> lib/shared`
/// becomes `/lib/shared/x`.
pub fn apply_alias(specifier: &str, aliases: Option<&AliasMap>) -> Option<String> {
    let aliases = aliases?;
    let head = first_segment(specifier);
    let target = aliases.get(head)?;
    Some(format!("/{}{}", target, &specifier[head.len()..]))
}
