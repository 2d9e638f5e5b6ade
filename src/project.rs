use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::alias::AliasMap;
use crate::extension::{SourceFileIndex, is_indexable};
use crate::promote::NameSet;
use crate::resolver::{DEFAULT_RESERVED_PREFIX, ResolverConfig};

/// Where to look for the inputs of a [`ResolverConfig`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectOptions {
    pub root: PathBuf,
    pub imports_dir: String,
    pub deps_dir: String,
    pub tsconfig: String,
    pub reserved_prefix: String,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            imports_dir: "imports".to_string(),
            deps_dir: "node_modules".to_string(),
            tsconfig: "tsconfig.json".to_string(),
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
        }
    }
}

impl ProjectOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..Self::default() }
    }

    /// Defaults overridden by `ROOTIMPORT_IMPORTS_DIR`, `ROOTIMPORT_DEPS_DIR`,
    /// `ROOTIMPORT_TSCONFIG` and `ROOTIMPORT_RESERVED_PREFIX`.
    pub fn from_env(root: impl Into<PathBuf>) -> Self {
        let mut opts = Self::new(root);
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        if let Some(v) = var("ROOTIMPORT_IMPORTS_DIR") {
            opts.imports_dir = v;
        }
        if let Some(v) = var("ROOTIMPORT_DEPS_DIR") {
            opts.deps_dir = v;
        }
        if let Some(v) = var("ROOTIMPORT_TSCONFIG") {
            opts.tsconfig = v;
        }
        if let Some(v) = var("ROOTIMPORT_RESERVED_PREFIX") {
            opts.reserved_prefix = v;
        }
        opts
    }

    /// `/imports/` for the default imports directory.
    pub fn absolute_prefix(&self) -> String {
        format!("/{}/", self.imports_dir.trim_matches('/'))
    }

    /// Scan the project once and bundle the results.
    pub fn load(&self) -> anyhow::Result<ResolverConfig> {
        let installed_packages = installed_package_names(&self.root, &self.deps_dir)?;
        let top_level_dirs = top_level_dir_names(&self.root, &self.deps_dir)?;
        let aliases = load_alias_map(&self.root.join(&self.tsconfig))?;
        let source_files = source_file_index(&self.root, &self.imports_dir);
        log::info!(
            "project: root={} installed={} top_level={} aliases={} source_files={}",
            self.root.display(),
            installed_packages.len(),
            top_level_dirs.len(),
            aliases.as_ref().map_or(0, AliasMap::len),
            source_files.len()
        );
        Ok(ResolverConfig {
            installed_packages,
            top_level_dirs,
            aliases,
            source_files,
            reserved_prefix: self.reserved_prefix.clone(),
            absolute_prefix: self.absolute_prefix(),
        })
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Names directly under `<root>/<deps_dir>`, dot entries excluded.
pub fn installed_package_names(root: &Path, deps_dir: &str) -> anyhow::Result<NameSet> {
    let dir = root.join(deps_dir);
    if !dir.is_dir() {
        log::debug!("project: no dependency directory at {}", dir.display());
        return Ok(NameSet::new());
    }
    let mut names = NameSet::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("read dir: {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read dir: {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_hidden(&name) {
            names.insert(name);
        }
    }
    Ok(names)
}

/// Directories directly under `root`, except `deps_dir` and dot directories.
pub fn top_level_dir_names(root: &Path, deps_dir: &str) -> anyhow::Result<NameSet> {
    let mut names = NameSet::new();
    for entry in fs::read_dir(root).with_context(|| format!("read dir: {}", root.display()))? {
        let entry = entry.with_context(|| format!("read dir: {}", root.display()))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&name) || name == deps_dir {
            continue;
        }
        if entry.path().is_dir() {
            names.insert(name);
        }
    }
    Ok(names)
}

/// All `.ts`/`.tsx` files under `<root>/<imports_dir>`, as `imports/...` paths.
/// Files of a directory come before the files of its subdirectories.
pub fn source_file_index(root: &Path, imports_dir: &str) -> SourceFileIndex {
    let base = root.join(imports_dir);
    let mut index = SourceFileIndex::new();
    if !base.is_dir() {
        log::debug!("project: no imports directory at {}", base.display());
        return index;
    }
    let walker = WalkDir::new(&base)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_map(Result::ok);
    for entry in walker {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&base) else { continue };
        let rel = rel.to_string_lossy().replace('\\', "/");
        if is_indexable(&rel) {
            index.push(format!("{}/{}", imports_dir.trim_matches('/'), rel));
        }
    }
    index
}

/// Read the alias table from a tsconfig.json. A missing file means no aliases.
pub fn load_alias_map(path: &Path) -> anyhow::Result<Option<AliasMap>> {
    if !path.is_file() {
        log::debug!("project: no tsconfig at {}", path.display());
        return Ok(None);
    }
    let text = fs::read_to_string(path).with_context(|| format!("read tsconfig: {}", path.display()))?;
    AliasMap::from_tsconfig_str(&text).with_context(|| format!("parse tsconfig: {}", path.display()))
}

/// Project-relative directory of `file`, with '/' separators.
/// Files directly under the root get the empty context.
pub fn importing_dir(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    let rel = rel.strip_prefix(".").unwrap_or(rel);
    rel.parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}
