//! Locating import/export specifiers in a syntax tree and splicing
//! replacements back into the source text.
use serde::{Deserialize, Serialize};

use crate::path::PathError;
use crate::resolver::{Resolution, SpecifierResolver};
use crate::ts_core::SourceParser;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Import,
    ExportAll,
    ExportNamed,
}

/// A string literal naming the source of an import/export declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierSite<'s> {
    pub kind: DeclarationKind,
    pub specifier: &'s str,
    /// Project-relative directory of the file being rewritten.
    pub context: &'s str,
    /// 1-based line of the literal.
    pub line: u32,
    /// Byte range of the literal's content, quotes excluded.
    pub start: usize,
    pub end: usize,
}

/// Called once per specifier site. `Some` replaces the literal's content.
pub trait SpecifierVisitor {
    fn visit_specifier(&mut self, site: &SpecifierSite<'_>) -> Option<String>;
}

/// Every import/export source literal in `src`, in source order.
pub fn collect_sites<'s>(
    parser: &SourceParser,
    src: &'s str,
    context: &'s str,
) -> anyhow::Result<Vec<SpecifierSite<'s>>> {
    let tree = parser.parse(src)?;
    let mut out = Vec::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        let kind = match node.kind() {
            "import_statement" => Some(DeclarationKind::Import),
            "export_statement" => Some(export_kind(&node)),
            _ => None,
        };
        if let Some(kind) = kind
            && let Some(source) = node.child_by_field_name("source")
            && let Some(site) = string_site(&source, src, context, kind)
        {
            out.push(site);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    Ok(out)
}

fn export_kind(node: &tree_sitter::Node<'_>) -> DeclarationKind {
    let mut cursor = node.walk();
    let star = node
        .children(&mut cursor)
        .any(|c| c.kind() == "*" || c.kind() == "namespace_export");
    if star { DeclarationKind::ExportAll } else { DeclarationKind::ExportNamed }
}

fn string_site<'s>(
    node: &tree_sitter::Node<'_>,
    src: &'s str,
    context: &'s str,
    kind: DeclarationKind,
) -> Option<SpecifierSite<'s>> {
    if node.kind() != "string" {
        return None;
    }
    let (start, end) = (node.start_byte(), node.end_byte());
    let text = src.get(start..end)?;
    if text.len() < 2 {
        return None;
    }
    let specifier = src.get(start + 1..end - 1)?;
    if specifier.contains('\\') {
        log::debug!("rewrite: skip escaped specifier {}", text);
        return None;
    }
    Some(SpecifierSite {
        kind,
        specifier,
        context,
        line: node.start_position().row as u32 + 1,
        start: start + 1,
        end: end - 1,
    })
}

/// Run `visitor` over every site and return the rewritten source, or `None`
/// when nothing changed.
pub fn rewrite_source<V: SpecifierVisitor + ?Sized>(
    parser: &SourceParser,
    src: &str,
    context: &str,
    visitor: &mut V,
) -> anyhow::Result<Option<String>> {
    let sites = collect_sites(parser, src, context)?;
    let mut edits: Vec<(usize, usize, String)> = Vec::new();
    for site in &sites {
        if let Some(new) = visitor.visit_specifier(site)
            && new != site.specifier
        {
            edits.push((site.start, site.end, new));
        }
    }
    if edits.is_empty() {
        return Ok(None);
    }
    let mut out = src.to_string();
    // back to front so earlier offsets stay valid
    for (start, end, new) in edits.into_iter().rev() {
        out.replace_range(start..end, &new);
    }
    Ok(Some(out))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecifierRewrite {
    pub line: u32,
    pub kind: DeclarationKind,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecifierFailure {
    pub line: u32,
    pub specifier: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileReport {
    pub file: String,
    pub rewrites: Vec<SpecifierRewrite>,
    pub failures: Vec<SpecifierFailure>,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.rewrites.is_empty() && self.failures.is_empty()
    }
}

/// Visitor backed by a [`SpecifierResolver`]. A failed resolution leaves the
/// specifier as written and is recorded in the report.
pub struct ResolvingVisitor<'r, 'c> {
    resolver: &'r SpecifierResolver<'c>,
    report: FileReport,
}

impl<'r, 'c> ResolvingVisitor<'r, 'c> {
    pub fn new(resolver: &'r SpecifierResolver<'c>, file: impl Into<String>) -> Self {
        Self {
            resolver,
            report: FileReport { file: file.into(), ..FileReport::default() },
        }
    }

    pub fn into_report(self) -> FileReport {
        self.report
    }

    fn record_failure(&mut self, site: &SpecifierSite<'_>, err: PathError) {
        log::warn!("{}:{}: {}", self.report.file, site.line, err);
        self.report.failures.push(SpecifierFailure {
            line: site.line,
            specifier: site.specifier.to_string(),
            error: err.to_string(),
        });
    }
}

impl SpecifierVisitor for ResolvingVisitor<'_, '_> {
    fn visit_specifier(&mut self, site: &SpecifierSite<'_>) -> Option<String> {
        match self.resolver.resolve(site.specifier, site.context) {
            Ok(Resolution::Unchanged) => None,
            Ok(Resolution::Rewritten(new)) => {
                log::debug!("{}:{}: {} -> {}", self.report.file, site.line, site.specifier, new);
                self.report.rewrites.push(SpecifierRewrite {
                    line: site.line,
                    kind: site.kind,
                    from: site.specifier.to_string(),
                    to: new.clone(),
                });
                Some(new)
            }
            Err(err) => {
                self.record_failure(site, err);
                None
            }
        }
    }
}
