use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Javascript,
    Typescript,
    Tsx,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match ext {
            "js" | "jsx" | "mjs" | "cjs" => Some(SourceKind::Javascript),
            "ts" | "mts" | "cts" => Some(SourceKind::Typescript),
            "tsx" => Some(SourceKind::Tsx),
            _ => None,
        }
    }

    fn language(self) -> tree_sitter::Language {
        match self {
            SourceKind::Javascript => tree_sitter_javascript::LANGUAGE.into(),
            SourceKind::Typescript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceKind::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// One tree-sitter parser per source kind. Not shared across threads.
pub struct SourceParser {
    kind: SourceKind,
    parser: std::cell::RefCell<tree_sitter::Parser>,
}

impl SourceParser {
    pub fn new(kind: SourceKind) -> anyhow::Result<Self> {
        let mut p = tree_sitter::Parser::new();
        p.set_language(&kind.language())?;
        Ok(Self { kind, parser: std::cell::RefCell::new(p) })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn parse(&self, src: &str) -> anyhow::Result<tree_sitter::Tree> {
        self.parser
            .borrow_mut()
            .parse(src, None)
            .ok_or_else(|| anyhow::anyhow!("tree-sitter returned no tree for {:?} source", self.kind))
    }
}

/// Lazily built parsers for every [`SourceKind`].
#[derive(Default)]
pub struct ParserSet {
    javascript: Option<SourceParser>,
    typescript: Option<SourceParser>,
    tsx: Option<SourceParser>,
}

impl ParserSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, kind: SourceKind) -> anyhow::Result<&SourceParser> {
        let slot = match kind {
            SourceKind::Javascript => &mut self.javascript,
            SourceKind::Typescript => &mut self.typescript,
            SourceKind::Tsx => &mut self.tsx,
        };
        if slot.is_none() {
            *slot = Some(SourceParser::new(kind)?);
        }
        slot.as_ref()
            .ok_or_else(|| anyhow::anyhow!("parser for {:?} unavailable", kind))
    }
}
