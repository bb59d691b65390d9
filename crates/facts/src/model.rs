//! Fact Model
//!
//! Structural/quality summaries extracted heuristically from source files.
//! Facts are immutable once produced; their lifetime is one pipeline run.

use serde::{Deserialize, Serialize};

/// Source languages the heuristic extractors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Rust,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Python,
    Ruby,
}

impl Language {
    /// Map a file extension to a language, if supported.
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext {
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "rs" => Some(Language::Rust),
            "go" => Some(Language::Go),
            "java" => Some(Language::Java),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
            "cs" => Some(Language::CSharp),
            "py" | "pyi" => Some(Language::Python),
            "rb" => Some(Language::Ruby),
            _ => None,
        }
    }

    /// Whether block structure is indentation-significant rather than braced.
    pub fn is_indent_based(&self) -> bool {
        matches!(self, Language::Python | Language::Ruby)
    }

    /// Short tag used in prompt serialization.
    pub fn tag(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Python => "python",
            Language::Ruby => "ruby",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Kind of a top-level declaration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Class,
    Struct,
    Interface,
    Enum,
    Trait,
}

/// A class/struct/interface-level declaration found in a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationFact {
    pub kind: DeclarationKind,
    pub name: String,
    /// 1-based line span of the declaration block
    pub start_line: u32,
    pub end_line: u32,
    /// Number of members (methods/fields) counted inside the block
    pub member_count: u32,
    /// Member names, in source order
    pub members: Vec<String>,
    /// Names this declaration visibly depends on (extends/implements/derives)
    pub dependencies: Vec<String>,
}

/// A free function or method signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionFact {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
    pub param_count: u32,
    pub is_async: bool,
    pub is_exported: bool,
    /// Brace or indentation depth at the signature
    pub nesting_depth: u32,
    /// Branch-keyword count within the body, plus one
    pub complexity: u32,
}

impl FunctionFact {
    /// Body length in lines.
    pub fn line_span(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// How a handler body deals with the error it catches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStrategy {
    /// Empty handler, error discarded
    Ignore,
    /// Logs and moves on
    Log,
    /// Re-raises or wraps and throws
    Rethrow,
    /// Returns a value/result from the handler
    Return,
    /// Anything else
    Custom,
}

/// One error-handling construct (catch/except/rescue/err-check).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandlingFact {
    /// Construct kind, e.g. "catch", "except", "rescue", "err-check"
    pub kind: String,
    pub line: u32,
    pub is_empty: bool,
    pub strategy: ErrorStrategy,
}

/// Per-language concurrency-primitive counters. Only emitted for languages
/// with native concurrency constructs (Go, Rust).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSignals {
    pub goroutines: u32,
    pub channel_ops: u32,
    pub spawns: u32,
    pub locks: u32,
    pub async_functions: u32,
}

impl LanguageSignals {
    /// Whether any counter is non-zero.
    pub fn any(&self) -> bool {
        self.goroutines > 0
            || self.channel_ops > 0
            || self.spawns > 0
            || self.locks > 0
            || self.async_functions > 0
    }
}

/// Quality metrics computed uniformly across languages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// Comment lines / non-blank lines, in [0, 1]
    pub comment_ratio: f32,
    /// Multi-digit numeric literals outside comments and const contexts
    pub magic_number_count: u32,
    /// TODO/FIXME/HACK/XXX markers in comments
    pub marker_comment_count: u32,
}

/// The structural fact record for one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    /// Path relative to the project root, forward-slashed
    pub file: String,
    pub language: Language,
    pub line_count: u32,
    pub declarations: Vec<DeclarationFact>,
    pub functions: Vec<FunctionFact>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub error_handling: Vec<ErrorHandlingFact>,
    pub assertion_count: u32,
    pub has_tests: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<LanguageSignals>,
    pub metrics: QualityMetrics,
}

impl Fact {
    /// Look up a declaration by name.
    pub fn declaration(&self, name: &str) -> Option<&DeclarationFact> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Whether a symbol name appears among declarations or functions.
    pub fn has_symbol(&self, name: &str) -> bool {
        self.declarations.iter().any(|d| d.name == name)
            || self.functions.iter().any(|f| f.name == name)
            || self
                .declarations
                .iter()
                .any(|d| d.members.iter().any(|m| m == name))
    }
}
