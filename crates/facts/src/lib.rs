//! Rigour Facts
//!
//! Heuristic structural fact extraction for the deep analysis engine. One
//! `Fact` summarizes one source file: declarations with member counts,
//! function signatures, imports/exports, error-handling strategy, test
//! signals, and uniform quality metrics.
//!
//! Facts are heuristic, not AST-exact: brace counting for C-like languages,
//! indentation tracking for Python/Ruby. The point is to ground a language
//! model in checkable structure, not to be a parser.
//!
//! ## Module Organization
//!
//! - `model` - The `Fact` record and its nested types
//! - `extractor` - Tree walking and per-file dispatch (`FactExtractor`)
//! - `languages` - Per-language extractors behind `LanguageExtractor`
//! - `metrics` - Uniform quality metrics

pub mod extractor;
pub mod languages;
pub mod metrics;
pub mod model;

// Re-export the extraction entry point
pub use extractor::FactExtractor;

// Re-export the fact model
pub use model::{
    DeclarationFact, DeclarationKind, ErrorHandlingFact, ErrorStrategy, Fact, FunctionFact,
    Language, LanguageSignals, QualityMetrics,
};

// Re-export the extractor seam for additive languages
pub use languages::{extractor_for, ExtractedStructure, LanguageExtractor};
