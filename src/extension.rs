use serde::{Serialize, Serializer};
use std::collections::HashSet;

use crate::path::{PathError, has_extension, is_relative, resolve_relative, trim_slashes};

/// Extensions tried for extensionless specifiers, in order.
pub const SOURCE_EXTENSIONS: [&str; 2] = [".ts", ".tsx"];

/// Known typed-source files under the imports root, e.g. `imports/ui/App.tsx`.
#[derive(Debug, Clone, Default)]
pub struct SourceFileIndex {
    files: Vec<String>,
    lookup: HashSet<String>,
}

impl SourceFileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path. Declaration files and non-source files are ignored.
    pub fn push(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !is_indexable(&path) || self.lookup.contains(&path) {
            return;
        }
        self.lookup.insert(path.clone());
        self.files.push(path);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup.contains(path)
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SourceFileIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut idx = Self::new();
        for p in iter {
            idx.push(p);
        }
        idx
    }
}

impl Serialize for SourceFileIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.files.serialize(serializer)
    }
}

/// Whether a file name belongs in the index: `.ts`/`.tsx`, but not `.d.ts`.
pub fn is_indexable(path: &str) -> bool {
    !path.ends_with(".d.ts") && SOURCE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Append `.ts` or `.tsx` to an extensionless specifier when the index knows
/// the file it points at. The written form of the specifier is kept.
///
/// Relative specifiers are looked up against `importing_dir`; resolution
/// errors propagate.
pub fn infer_extension(
    specifier: &str,
    importing_dir: &str,
    index: &SourceFileIndex,
) -> Result<Option<String>, PathError> {
    if has_extension(specifier) {
        return Ok(None);
    }
    let candidate = if is_relative(specifier) {
        resolve_relative(importing_dir, specifier)?
    } else {
        specifier.to_string()
    };
    let stem = trim_slashes(&candidate);
    for ext in SOURCE_EXTENSIONS {
        if index.contains(&format!("{}{}", stem, ext)) {
            return Ok(Some(format!("{}{}", specifier, ext)));
        }
    }
    Ok(None)
}
