//! Slash-separated path arithmetic on specifier strings.
//! Nothing here touches the filesystem.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid relative path: {specifier}")]
    InvalidRelativePath { specifier: String },
    #[error("cannot resolve relative path \"{specifier}\" from current path \"{context}\"")]
    UnresolvableRelativePath { specifier: String, context: String },
}

/// Remove at most one leading and one trailing '/'.
pub fn trim_slashes(p: &str) -> &str {
    let p = p.strip_prefix('/').unwrap_or(p);
    p.strip_suffix('/').unwrap_or(p)
}

/// Text before the first '/'. Empty for root-absolute paths.
pub fn first_segment(p: &str) -> &str {
    p.split('/').next().unwrap_or(p)
}

pub fn last_segment(p: &str) -> &str {
    p.rsplit('/').next().unwrap_or(p)
}

/// Heuristic: a final segment containing a dot already names a file extension.
pub fn has_extension(p: &str) -> bool {
    last_segment(p).contains('.')
}

pub fn is_relative(p: &str) -> bool {
    p.starts_with("./") || p.starts_with("../")
}

/// Resolve `rel` (which must start with `./` or `../`) against `base_dir`.
///
/// e.g. `resolve_relative("imports/foo/bar", "../stuff.ts")` gives
/// `imports/foo/stuff.ts`.
///
/// For `../` paths every `../` group in `rel` counts as one step up, and only
/// the text after the last group is appended. A trailing '/' on `base_dir` is
/// ignored in both cases, so `imports/foo/` counts as two segments.
pub fn resolve_relative(base_dir: &str, rel: &str) -> Result<String, PathError> {
    let base = base_dir.strip_suffix('/').unwrap_or(base_dir);
    if let Some(rest) = rel.strip_prefix("./") {
        return Ok(format!("{}/{}", base, rest));
    }
    if !rel.starts_with("../") {
        return Err(PathError::InvalidRelativePath {
            specifier: rel.to_string(),
        });
    }
    let ups = rel.matches("../").count();
    let mut segments: Vec<&str> = base.split('/').collect();
    if ups > segments.len().saturating_sub(1) {
        return Err(PathError::UnresolvableRelativePath {
            specifier: rel.to_string(),
            context: base_dir.to_string(),
        });
    }
    segments.truncate(segments.len() - ups);
    let rest = rel.rsplit("../").next().unwrap_or("");
    Ok(format!("{}/{}", segments.join("/"), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_one_slash_each_side() {
        assert_eq!(trim_slashes("/imports/foo/"), "imports/foo");
        assert_eq!(trim_slashes("imports/foo"), "imports/foo");
        assert_eq!(trim_slashes("//a//"), "/a/");
        assert_eq!(trim_slashes("/"), "");
        assert_eq!(trim_slashes(""), "");
    }

    #[test]
    fn segments() {
        assert_eq!(first_segment("imports/foo/bar"), "imports");
        assert_eq!(first_segment("/imports/foo"), "");
        assert_eq!(first_segment("react"), "react");
        assert_eq!(last_segment("imports/foo/bar.ts"), "bar.ts");
        assert_eq!(last_segment("bar"), "bar");
        assert!(has_extension("./styles/main.css"));
        assert!(!has_extension("./v1.2/widget"));
        assert!(is_relative("./a"));
        assert!(is_relative("../a"));
        assert!(!is_relative(".hidden/a"));
    }

    #[test]
    fn current_dir() {
        assert_eq!(resolve_relative("imports/foo", "./bar").unwrap(), "imports/foo/bar");
        assert_eq!(resolve_relative("imports/foo/", "./bar").unwrap(), "imports/foo/bar");
        assert_eq!(resolve_relative("", "./bar").unwrap(), "/bar");
    }

    #[test]
    fn parent_dirs() {
        assert_eq!(
            resolve_relative("imports/foo/bar", "../baz.ts").unwrap(),
            "imports/foo/baz.ts"
        );
        assert_eq!(
            resolve_relative("imports/foo/bar", "../../x/y").unwrap(),
            "imports/x/y"
        );
        assert_eq!(resolve_relative("imports/foo/", "../x").unwrap(), "imports/x");
        assert!(resolve_relative("imports/", "../x").is_err());
    }

    #[test]
    fn climbing_above_root_fails() {
        let err = resolve_relative("imports", "../../x").unwrap_err();
        assert_eq!(
            err,
            PathError::UnresolvableRelativePath {
                specifier: "../../x".into(),
                context: "imports".into(),
            }
        );
        assert!(resolve_relative("imports", "../x").is_err());
        assert!(resolve_relative("", "../x").is_err());
    }

    #[test]
    fn rejects_non_relative() {
        assert!(matches!(
            resolve_relative("imports", "lib/x"),
            Err(PathError::InvalidRelativePath { .. })
        ));
    }
}
