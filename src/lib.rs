pub mod alias;
pub mod extension;
pub mod path;
pub mod project;
pub mod promote;
pub mod resolver;
pub mod rewrite;
pub mod ts_core;

pub use alias::{AliasMap, apply_alias};
pub use extension::{SourceFileIndex, infer_extension};
pub use path::{PathError, resolve_relative, trim_slashes};
pub use project::{ProjectOptions, importing_dir};
pub use promote::{NameSet, promote};
pub use resolver::{Resolution, ResolverConfig, SpecifierResolver};
pub use rewrite::{
    DeclarationKind, FileReport, ResolvingVisitor, SpecifierSite, SpecifierVisitor, collect_sites,
    rewrite_source,
};
pub use ts_core::{ParserSet, SourceKind, SourceParser};
