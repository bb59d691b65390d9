//! Per-Language Extractors
//!
//! Each language gets a heuristic extractor behind the `LanguageExtractor`
//! trait so new languages are additive. Two families cover everything:
//! brace-counting for C-like languages and indentation-tracking for
//! indentation-significant ones. None of this is AST-exact; it trades
//! precision for working uniformly across many languages without a parser.

pub mod brace;
pub mod indent;

use crate::model::{
    DeclarationFact, ErrorHandlingFact, ErrorStrategy, FunctionFact, Language, LanguageSignals,
};

pub use brace::BraceExtractor;
pub use indent::IndentExtractor;

/// Everything a language extractor derives from one file's content.
#[derive(Debug, Default)]
pub struct ExtractedStructure {
    pub declarations: Vec<DeclarationFact>,
    pub functions: Vec<FunctionFact>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub error_handling: Vec<ErrorHandlingFact>,
    pub assertion_count: u32,
    pub has_tests: bool,
    pub signals: Option<LanguageSignals>,
}

/// Heuristic structural extraction for one language family.
pub trait LanguageExtractor: Send + Sync {
    fn extract(&self, content: &str) -> ExtractedStructure;
}

/// Select the extractor for a language.
pub fn extractor_for(language: Language) -> Box<dyn LanguageExtractor> {
    if language.is_indent_based() {
        Box::new(IndentExtractor::new(language))
    } else {
        Box::new(BraceExtractor::new(language))
    }
}

// ── Shared classification helpers ──────────────────────────────────────

const LOG_TOKENS: &[&str] = &[
    "log", "logger", "console.", "print", "fmt.print", "tracing::", "eprintln!", "println!",
    "slog", "warn", "debug", "logging.",
];

const RETHROW_TOKENS: &[&str] = &[
    "throw", "raise", "panic!", "return err", "return fmt.errorf", "anyhow::bail",
];

/// Classify an error-handler body by its leading tokens.
///
/// Returns `(is_empty, strategy)`. The body is the handler's statement lines
/// with the opening/closing delimiters stripped.
pub(crate) fn classify_handler(body_lines: &[&str]) -> (bool, ErrorStrategy) {
    let first = body_lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && *l != "{" && *l != "}");

    let first = match first {
        Some(line) => line.to_lowercase(),
        None => return (true, ErrorStrategy::Ignore),
    };

    // Python's `pass` and Ruby's bare `nil` are empty handlers in spirit.
    if first == "pass" || first == "nil" || first == "...}" || first == "..." {
        return (true, ErrorStrategy::Ignore);
    }

    if LOG_TOKENS.iter().any(|t| first.starts_with(t)) {
        return (false, ErrorStrategy::Log);
    }
    if RETHROW_TOKENS.iter().any(|t| first.starts_with(t)) {
        return (false, ErrorStrategy::Rethrow);
    }
    if first.starts_with("return") {
        return (false, ErrorStrategy::Return);
    }
    (false, ErrorStrategy::Custom)
}

/// Count test assertions for a language.
pub(crate) fn count_assertions(content: &str, language: Language) -> u32 {
    let needles: &[&str] = match language {
        Language::Rust => &["assert!", "assert_eq!", "assert_ne!", "debug_assert"],
        Language::TypeScript | Language::JavaScript => {
            &["expect(", "assert.", ".toBe", ".toEqual", ".toHaveBeen"]
        }
        Language::Go => &["t.Error", "t.Fatal", "require.", "assert."],
        Language::Java | Language::CSharp => &["assertEquals", "assertTrue", "Assert."],
        Language::Python => &["assert ", "self.assert", "pytest.raises"],
        Language::Ruby => &["expect(", "assert_", "must_equal"],
        Language::C | Language::Cpp => &["assert(", "EXPECT_", "ASSERT_"],
    };
    content
        .lines()
        .map(|line| needles.iter().filter(|n| line.contains(*n)).count() as u32)
        .sum()
}

/// Detect whether the file contains test definitions.
pub(crate) fn detect_tests(content: &str, language: Language) -> bool {
    let markers: &[&str] = match language {
        Language::Rust => &["#[test]", "#[tokio::test]", "#[cfg(test)]"],
        Language::TypeScript | Language::JavaScript => &["it(", "test(", "describe("],
        Language::Go => &["func Test", "func Benchmark"],
        Language::Java => &["@Test"],
        Language::CSharp => &["[Test]", "[Fact]", "[TestMethod]"],
        Language::Python => &["def test_", "class Test", "unittest.TestCase"],
        Language::Ruby => &["def test_", "it '", "it \""],
        Language::C | Language::Cpp => &["TEST(", "TEST_F("],
    };
    markers.iter().any(|m| content.contains(m))
}

/// Concurrency-primitive counters, only for languages with native
/// concurrency constructs.
pub(crate) fn collect_signals(content: &str, language: Language) -> Option<LanguageSignals> {
    match language {
        Language::Go => {
            let mut signals = LanguageSignals::default();
            for line in content.lines() {
                let trimmed = line.trim();
                if trimmed.starts_with("go ") || trimmed.contains(" go func(") {
                    signals.goroutines += 1;
                }
                signals.channel_ops += trimmed.matches("<-").count() as u32;
                if trimmed.contains("sync.Mutex")
                    || trimmed.contains("sync.RWMutex")
                    || trimmed.contains("sync.WaitGroup")
                {
                    signals.locks += 1;
                }
            }
            Some(signals)
        }
        Language::Rust => {
            let mut signals = LanguageSignals::default();
            for line in content.lines() {
                if line.contains("tokio::spawn") || line.contains("thread::spawn") {
                    signals.spawns += 1;
                }
                if line.contains("Mutex<") || line.contains("RwLock<") {
                    signals.locks += 1;
                }
                if line.contains("async fn") {
                    signals.async_functions += 1;
                }
                if line.contains("mpsc::") || line.contains("oneshot::") {
                    signals.channel_ops += 1;
                }
            }
            Some(signals)
        }
        _ => None,
    }
}

/// Count branch constructs in a body slice for the complexity estimate.
/// Mirrors the branch set of the original per-function metric: conditionals,
/// loops, handlers, and short-circuit operators, plus one.
pub(crate) fn estimate_complexity(body: &[&str]) -> u32 {
    let mut complexity = 1u32;
    for line in body {
        let trimmed = line.trim();
        for keyword in ["if ", "if(", "for ", "for(", "while ", "while(", "case ", "catch", "except", "elif ", "when "] {
            complexity += trimmed.matches(keyword).count() as u32;
        }
        complexity += trimmed.matches("&&").count() as u32;
        complexity += trimmed.matches("||").count() as u32;
    }
    complexity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empty_handler() {
        let (empty, strategy) = classify_handler(&[]);
        assert!(empty);
        assert_eq!(strategy, ErrorStrategy::Ignore);

        let (empty, strategy) = classify_handler(&["   ", ""]);
        assert!(empty);
        assert_eq!(strategy, ErrorStrategy::Ignore);
    }

    #[test]
    fn test_classify_pass_is_ignore() {
        let (empty, strategy) = classify_handler(&["pass"]);
        assert!(empty);
        assert_eq!(strategy, ErrorStrategy::Ignore);
    }

    #[test]
    fn test_classify_log_handler() {
        let (empty, strategy) = classify_handler(&["console.error(err);"]);
        assert!(!empty);
        assert_eq!(strategy, ErrorStrategy::Log);
    }

    #[test]
    fn test_classify_rethrow_handler() {
        let (_, strategy) = classify_handler(&["throw new WrappedError(err);"]);
        assert_eq!(strategy, ErrorStrategy::Rethrow);

        let (_, strategy) = classify_handler(&["raise RuntimeError(str(e))"]);
        assert_eq!(strategy, ErrorStrategy::Rethrow);
    }

    #[test]
    fn test_classify_return_handler() {
        let (_, strategy) = classify_handler(&["return defaultValue;"]);
        assert_eq!(strategy, ErrorStrategy::Return);
    }

    #[test]
    fn test_classify_custom_handler() {
        let (_, strategy) = classify_handler(&["retries += 1;", "backoff();"]);
        assert_eq!(strategy, ErrorStrategy::Custom);
    }

    #[test]
    fn test_assertion_counting() {
        let rust = "assert_eq!(a, b);\nassert!(ok);\n";
        assert_eq!(count_assertions(rust, Language::Rust), 2);

        let ts = "expect(result).toBe(3);\n";
        assert_eq!(count_assertions(ts, Language::TypeScript), 2);
    }

    #[test]
    fn test_detect_tests() {
        assert!(detect_tests("#[test]\nfn works() {}", Language::Rust));
        assert!(detect_tests("describe('x', () => {});", Language::JavaScript));
        assert!(!detect_tests("fn main() {}", Language::Rust));
    }

    #[test]
    fn test_go_signals() {
        let content = "go worker()\nch <- value\nvar mu sync.Mutex\n";
        let signals = collect_signals(content, Language::Go).unwrap();
        assert_eq!(signals.goroutines, 1);
        assert_eq!(signals.channel_ops, 1);
        assert_eq!(signals.locks, 1);
    }

    #[test]
    fn test_no_signals_for_typescript() {
        assert!(collect_signals("async function f() {}", Language::TypeScript).is_none());
    }

    #[test]
    fn test_complexity_counts_branches() {
        let body = ["if a && b {", "for x in xs {", "} else {", "}"];
        // 1 base + if + && + for
        assert_eq!(estimate_complexity(&body), 4);
    }
}
