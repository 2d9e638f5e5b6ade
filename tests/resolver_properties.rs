use pretty_assertions::assert_eq;
use rootimport::{
    AliasMap, NameSet, PathError, Resolution, ResolverConfig, SourceFileIndex, SpecifierResolver,
    resolve_relative,
};

fn names(items: &[&str]) -> NameSet {
    items.iter().copied().collect()
}

fn meteor_app() -> ResolverConfig {
    let mut aliases = AliasMap::new();
    aliases.insert("shared", "lib/shared");
    aliases.insert("@api", "imports/api");
    ResolverConfig {
        installed_packages: names(&["react", "utils", "@mui", "lodash"]),
        top_level_dirs: names(&["imports", "client", "server", "utils", "lib"]),
        aliases: Some(aliases),
        source_files: [
            "imports/foo/bar.tsx",
            "imports/foo/index.ts",
            "imports/api/links.ts",
            "imports/api/links/methods.ts",
        ]
        .into_iter()
        .collect::<SourceFileIndex>(),
        ..ResolverConfig::default()
    }
}

#[test]
fn end_to_end_promotion() {
    let cfg = ResolverConfig {
        top_level_dirs: names(&["imports"]),
        ..ResolverConfig::default()
    };
    let r = SpecifierResolver::new(&cfg);
    for ctx in ["", "client", "imports/deep/dir"] {
        assert_eq!(
            r.resolve("imports/foo/bar", ctx).unwrap(),
            Resolution::Rewritten("/imports/foo/bar".into())
        );
    }
}

#[test]
fn alias_precedence() {
    let cfg = meteor_app();
    let r = SpecifierResolver::new(&cfg);
    assert_eq!(
        r.resolve("shared/widgets/button", "client").unwrap(),
        Resolution::Rewritten("/lib/shared/widgets/button".into())
    );
    assert_eq!(
        r.resolve("@api/links", "client").unwrap(),
        Resolution::Rewritten("/imports/api/links.ts".into())
    );
}

#[test]
fn installed_package_beats_top_level_dir() {
    let cfg = meteor_app();
    let r = SpecifierResolver::new(&cfg);
    assert_eq!(r.resolve("utils/thing", "client").unwrap(), Resolution::Unchanged);
    assert_eq!(r.resolve("@mui/material", "client").unwrap(), Resolution::Unchanged);
}

#[test]
fn extension_inference_keeps_relative_form() {
    let cfg = meteor_app();
    let r = SpecifierResolver::new(&cfg);
    assert_eq!(
        r.resolve("./bar", "imports/foo").unwrap(),
        Resolution::Rewritten("./bar.tsx".into())
    );
    assert_eq!(
        r.resolve("../api/links/methods", "imports/foo").unwrap(),
        Resolution::Rewritten("../api/links/methods.ts".into())
    );
    // directory imports are left to the loader
    assert_eq!(r.resolve("./foo", "imports").unwrap(), Resolution::Unchanged);
}

#[test]
fn reserved_namespace_is_never_touched() {
    let mut cfg = meteor_app();
    cfg.top_level_dirs.insert("meteor");
    cfg.source_files.push("meteor/mongo.ts");
    let r = SpecifierResolver::new(&cfg);
    for spec in ["meteor/mongo", "meteor/react-meteor-data", "meteor/meteor"] {
        assert_eq!(r.resolve(spec, "").unwrap(), Resolution::Unchanged, "{}", spec);
    }
}

#[test]
fn relative_climbing() {
    assert_eq!(resolve_relative("imports/foo/bar", "../baz.ts").unwrap(), "imports/foo/baz.ts");
    assert!(matches!(
        resolve_relative("imports", "../../x"),
        Err(PathError::UnresolvableRelativePath { .. })
    ));
}

#[test]
fn resolution_errors_are_per_specifier() {
    let cfg = meteor_app();
    let r = SpecifierResolver::new(&cfg);
    let err = r.resolve("../../../x", "imports/foo").unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot resolve relative path \"../../../x\" from current path \"imports/foo\""
    );
    // the next call is unaffected
    assert_eq!(
        r.resolve("./bar", "imports/foo").unwrap(),
        Resolution::Rewritten("./bar.tsx".into())
    );
}

#[test]
fn resolving_twice_is_a_no_op() {
    let cfg = meteor_app();
    let r = SpecifierResolver::new(&cfg);
    let cases = [
        ("imports/foo/bar", "client"),
        ("imports/foo", "client"),
        ("shared/widgets/button", "client"),
        ("@api/links", "server"),
        ("./bar", "imports/foo"),
        ("../foo/bar", "imports/api"),
        ("server/main", "client"),
        ("lib/x.js", "client"),
        ("react", "client"),
        ("./styles.css", "imports"),
        ("/imports/foo/bar.tsx", "client"),
    ];
    for (spec, ctx) in cases {
        let once = match r.resolve(spec, ctx).unwrap() {
            Resolution::Unchanged => spec.to_string(),
            Resolution::Rewritten(s) => s,
        };
        assert_eq!(r.resolve(&once, ctx).unwrap(), Resolution::Unchanged, "{} -> {}", spec, once);
    }
}

#[test]
fn config_is_shared_across_threads() {
    let cfg = meteor_app();
    let r = SpecifierResolver::new(&cfg);
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| r.resolve("imports/foo/bar", "client").unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Resolution::Rewritten("/imports/foo/bar.tsx".into()));
        }
    });
}
