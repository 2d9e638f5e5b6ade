use serde::{Deserialize, Serialize};

use crate::alias::{AliasMap, apply_alias};
use crate::extension::{SourceFileIndex, infer_extension};
use crate::path::{PathError, first_segment};
use crate::promote::{NameSet, promote};

pub const DEFAULT_RESERVED_PREFIX: &str = "meteor/";
pub const DEFAULT_ABSOLUTE_PREFIX: &str = "/imports/";

/// Everything the resolver reads. Built once, then shared by reference.
#[derive(Debug, Clone, Serialize)]
pub struct ResolverConfig {
    pub installed_packages: NameSet,
    pub top_level_dirs: NameSet,
    pub aliases: Option<AliasMap>,
    pub source_files: SourceFileIndex,
    /// Specifiers under this prefix belong to the host's own packages.
    pub reserved_prefix: String,
    /// Specifiers already under this prefix are never promoted again.
    pub absolute_prefix: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            installed_packages: NameSet::new(),
            top_level_dirs: NameSet::new(),
            aliases: None,
            source_files: SourceFileIndex::new(),
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            absolute_prefix: DEFAULT_ABSOLUTE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "specifier", rename_all = "snake_case")]
pub enum Resolution {
    Unchanged,
    Rewritten(String),
}

impl Resolution {
    pub fn rewritten(&self) -> Option<&str> {
        match self {
            Resolution::Unchanged => None,
            Resolution::Rewritten(s) => Some(s),
        }
    }
}

pub struct SpecifierResolver<'a> {
    config: &'a ResolverConfig,
}

impl<'a> SpecifierResolver<'a> {
    pub fn new(config: &'a ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a ResolverConfig {
        self.config
    }

    /// Whether the specifier names a host package or an installed dependency.
    pub fn is_package_import(&self, specifier: &str) -> bool {
        specifier.starts_with(&self.config.reserved_prefix)
            || self
                .config
                .installed_packages
                .contains(first_segment(specifier))
    }

    /// Resolve one specifier written in a file living in `importing_dir`.
    ///
    /// Steps: package skip, alias substitution, extension inference, promotion.
    /// Each step sees the output of the previous one.
    pub fn resolve(&self, specifier: &str, importing_dir: &str) -> Result<Resolution, PathError> {
        let cfg = self.config;
        if self.is_package_import(specifier) {
            return Ok(Resolution::Unchanged);
        }

        let mut current = specifier.to_string();
        if let Some(aliased) = apply_alias(&current, cfg.aliases.as_ref()) {
            current = aliased;
        }
        if let Some(with_ext) = infer_extension(&current, importing_dir, &cfg.source_files)? {
            current = with_ext;
        }
        if let Some(promoted) = promote(
            &current,
            &cfg.absolute_prefix,
            &cfg.top_level_dirs,
            &cfg.installed_packages,
        ) {
            current = promoted;
        }

        if current == specifier {
            Ok(Resolution::Unchanged)
        } else {
            Ok(Resolution::Rewritten(current))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ResolverConfig {
        let mut aliases = AliasMap::new();
        aliases.insert("shared", "lib/shared");
        aliases.insert("@ui", "imports/ui");
        ResolverConfig {
            installed_packages: ["react", "utils", "@babel"].into_iter().collect(),
            top_level_dirs: ["imports", "client", "server", "utils", "lib"]
                .into_iter()
                .collect(),
            aliases: Some(aliases),
            source_files: [
                "imports/foo/bar.tsx",
                "imports/foo/baz.ts",
                "imports/ui/Button.tsx",
                "imports/api/links.ts",
            ]
            .into_iter()
            .collect(),
            ..ResolverConfig::default()
        }
    }

    fn run(spec: &str, dir: &str) -> Resolution {
        let cfg = config();
        SpecifierResolver::new(&cfg).resolve(spec, dir).unwrap()
    }

    #[test]
    fn skips_packages() {
        assert_eq!(run("meteor/mongo", "imports"), Resolution::Unchanged);
        assert_eq!(run("react", "imports"), Resolution::Unchanged);
        assert_eq!(run("@babel/runtime/helpers", "imports"), Resolution::Unchanged);
        assert_eq!(run("utils/thing", "imports"), Resolution::Unchanged);
    }

    #[test]
    fn alias_is_root_relative() {
        assert_eq!(
            run("shared/widgets/button", "imports"),
            Resolution::Rewritten("/lib/shared/widgets/button".into())
        );
    }

    #[test]
    fn alias_then_extension() {
        assert_eq!(
            run("@ui/Button", "client"),
            Resolution::Rewritten("/imports/ui/Button.tsx".into())
        );
    }

    #[test]
    fn relative_keeps_written_form() {
        assert_eq!(run("./bar", "imports/foo"), Resolution::Rewritten("./bar.tsx".into()));
        assert_eq!(
            run("../api/links", "imports/foo"),
            Resolution::Rewritten("../api/links.ts".into())
        );
        assert_eq!(run("./nothing", "imports/foo"), Resolution::Unchanged);
    }

    #[test]
    fn promotes_after_extension() {
        assert_eq!(
            run("imports/foo/baz", "client"),
            Resolution::Rewritten("/imports/foo/baz.ts".into())
        );
        assert_eq!(
            run("imports/styles/main.css", "client"),
            Resolution::Rewritten("/imports/styles/main.css".into())
        );
        assert_eq!(
            run("server/methods", "client"),
            Resolution::Rewritten("/server/methods".into())
        );
    }

    #[test]
    fn resolved_output_is_stable() {
        let cfg = config();
        let r = SpecifierResolver::new(&cfg);
        for (spec, dir) in [
            ("shared/widgets/button", "imports"),
            ("@ui/Button", "client"),
            ("./bar", "imports/foo"),
            ("imports/foo/baz", "client"),
            ("server/methods", "client"),
        ] {
            let first = r.resolve(spec, dir).unwrap();
            let out = first.rewritten().unwrap().to_string();
            assert_eq!(r.resolve(&out, dir).unwrap(), Resolution::Unchanged, "{}", spec);
        }
    }

    #[test]
    fn relative_errors_propagate() {
        let cfg = config();
        let err = SpecifierResolver::new(&cfg).resolve("../../x", "imports").unwrap_err();
        assert!(matches!(err, PathError::UnresolvableRelativePath { .. }));
    }
}
