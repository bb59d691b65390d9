//! Prompt Builder
//!
//! Renders extracted facts into the two prompt shapes the pipeline sends:
//! per-chunk analysis and whole-project cross-file analysis. Serialization
//! is compact and line-oriented so a chunk's worth of files fits a small
//! model's context.

use std::fmt::Write;

use rigour_core::CheckCategory;
use rigour_facts::{ErrorStrategy, Fact};

/// Character budget for the cross-file summary section.
const CROSS_FILE_CHAR_BUDGET: usize = 16_000;

/// Functions below all of these floors are structural noise and omitted
/// from the prompt.
const FLAG_MIN_LINES: u32 = 40;
const FLAG_MIN_COMPLEXITY: u32 = 8;
const FLAG_MIN_NESTING: u32 = 3;

/// Most member names listed per declaration before eliding.
const MAX_LISTED_MEMBERS: usize = 8;

const RESPONSE_FORMAT: &str = r#"Respond ONLY with valid JSON in this exact format:
{
  "findings": [
    {
      "category": "<one of the requested check ids>",
      "severity": "critical|high|medium|low|info",
      "file": "<file path exactly as given above>",
      "line": <line number or null>,
      "description": "<specific issue, naming the symbol in backticks>",
      "suggestion": "<concrete fix>",
      "confidence": <0.0 to 1.0>
    }
  ]
}
Return {"findings": []} if nothing is wrong. Only report issues supported by the facts above."#;

fn strategy_label(strategy: ErrorStrategy) -> &'static str {
    match strategy {
        ErrorStrategy::Ignore => "ignore",
        ErrorStrategy::Log => "log",
        ErrorStrategy::Rethrow => "rethrow",
        ErrorStrategy::Return => "return",
        ErrorStrategy::Custom => "custom",
    }
}

fn is_flagged(f: &rigour_facts::FunctionFact) -> bool {
    f.line_span() >= FLAG_MIN_LINES
        || f.complexity >= FLAG_MIN_COMPLEXITY
        || f.nesting_depth >= FLAG_MIN_NESTING
}

/// Render one file's facts as a compact block.
pub fn serialize_fact(fact: &Fact) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "### {} ({}, {} lines)",
        fact.file, fact.language, fact.line_count
    );

    for decl in &fact.declarations {
        let mut members = decl
            .members
            .iter()
            .take(MAX_LISTED_MEMBERS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if decl.members.len() > MAX_LISTED_MEMBERS {
            members.push_str(", ...");
        }
        let _ = write!(
            out,
            "{:?} {} (lines {}-{}): {} members",
            decl.kind, decl.name, decl.start_line, decl.end_line, decl.member_count
        );
        if !members.is_empty() {
            let _ = write!(out, " [{members}]");
        }
        if !decl.dependencies.is_empty() {
            let _ = write!(out, " depends on {}", decl.dependencies.join(", "));
        }
        out.push('\n');
    }

    for func in fact.functions.iter().filter(|f| is_flagged(f)) {
        let _ = write!(
            out,
            "fn {} (line {}): {} lines, {} params, complexity {}, nesting {}",
            func.name,
            func.start_line,
            func.line_span(),
            func.param_count,
            func.complexity,
            func.nesting_depth
        );
        if func.is_async {
            out.push_str(", async");
        }
        if func.is_exported {
            out.push_str(", exported");
        }
        out.push('\n');
    }

    if !fact.error_handling.is_empty() {
        let empty = fact.error_handling.iter().filter(|h| h.is_empty).count();
        let strategies = fact
            .error_handling
            .iter()
            .map(|h| strategy_label(h.strategy))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            out,
            "error handling: {} handlers ({} empty) [{}]",
            fact.error_handling.len(),
            empty,
            strategies
        );
    }

    if let Some(signals) = fact.signals.as_ref().filter(|s| s.any()) {
        let _ = writeln!(
            out,
            "signals: goroutines={} channels={} spawns={} locks={} async={}",
            signals.goroutines,
            signals.channel_ops,
            signals.spawns,
            signals.locks,
            signals.async_functions
        );
    }

    let _ = writeln!(
        out,
        "metrics: comments {:.0}%, magic numbers {}, markers {}",
        fact.metrics.comment_ratio * 100.0,
        fact.metrics.magic_number_count,
        fact.metrics.marker_comment_count
    );

    if fact.has_tests || fact.assertion_count > 0 {
        let _ = writeln!(out, "tests: {} assertions", fact.assertion_count);
    }

    out
}

/// Render the per-chunk analysis prompt.
pub fn render_batch(facts: &[Fact], checks: &[CheckCategory]) -> String {
    let mut prompt = String::from(
        "You are a strict code reviewer. Below are structural facts extracted \
         from source files (no source code). Identify quality issues supported \
         by these facts.\n\nCheck for:\n",
    );
    for check in checks {
        let _ = writeln!(prompt, "- {}", check.prompt_hint());
    }
    prompt.push_str("\nFiles:\n\n");
    for fact in facts {
        prompt.push_str(&serialize_fact(fact));
        prompt.push('\n');
    }
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

/// Render the whole-project cross-file prompt. One summary line per file;
/// files are added until the character budget is exceeded, so trailing
/// files may be silently omitted.
pub fn render_cross_file(facts: &[Fact]) -> String {
    let mut prompt = String::from(
        "You are a strict code reviewer looking at a whole project's shape. \
         Below is one summary line per file. Identify cross-file issues only: \
         duplicated responsibilities, layering violations, circular imports, \
         god modules.\n\nFiles:\n",
    );
    let mut used = 0usize;
    for fact in facts {
        let decls = fact
            .declarations
            .iter()
            .map(|d| format!("{}({})", d.name, d.member_count))
            .collect::<Vec<_>>()
            .join(", ");
        let line = format!(
            "{} ({}, {} lines) imports: {} exports: {} declarations: {}\n",
            fact.file,
            fact.language,
            fact.line_count,
            fact.imports.len(),
            fact.exports.join(", "),
            decls
        );
        used += line.len();
        prompt.push_str(&line);
        if used >= CROSS_FILE_CHAR_BUDGET {
            break;
        }
    }
    prompt.push('\n');
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigour_facts::{
        DeclarationFact, DeclarationKind, FunctionFact, Language, QualityMetrics,
    };

    fn fact(file: &str, line_count: u32) -> Fact {
        Fact {
            file: file.to_string(),
            language: Language::TypeScript,
            line_count,
            declarations: vec![],
            functions: vec![],
            imports: vec![],
            exports: vec![],
            error_handling: vec![],
            assertion_count: 0,
            has_tests: false,
            signals: None,
            metrics: QualityMetrics::default(),
        }
    }

    fn big_function(name: &str) -> FunctionFact {
        FunctionFact {
            name: name.to_string(),
            start_line: 10,
            end_line: 90,
            param_count: 4,
            is_async: true,
            is_exported: true,
            nesting_depth: 1,
            complexity: 12,
        }
    }

    #[test]
    fn test_serialize_fact_includes_declarations_and_flagged_functions() {
        let mut f = fact("src/store.ts", 200);
        f.declarations.push(DeclarationFact {
            kind: DeclarationKind::Class,
            name: "Store".to_string(),
            start_line: 5,
            end_line: 120,
            member_count: 3,
            members: vec!["get".to_string(), "put".to_string(), "del".to_string()],
            dependencies: vec!["BaseStore".to_string()],
        });
        f.functions.push(big_function("processAll"));
        f.functions.push(FunctionFact {
            name: "tiny".to_string(),
            start_line: 130,
            end_line: 132,
            param_count: 0,
            is_async: false,
            is_exported: false,
            nesting_depth: 0,
            complexity: 1,
        });

        let block = serialize_fact(&f);
        assert!(block.contains("### src/store.ts (typescript, 200 lines)"));
        assert!(block.contains("Class Store"));
        assert!(block.contains("3 members [get, put, del]"));
        assert!(block.contains("depends on BaseStore"));
        assert!(block.contains("fn processAll"));
        assert!(block.contains("complexity 12"));
        // Below every flag floor, omitted
        assert!(!block.contains("fn tiny"));
    }

    #[test]
    fn test_render_batch_lists_only_enabled_checks() {
        let facts = vec![fact("a.ts", 10)];
        let checks = vec![CheckCategory::Complexity, CheckCategory::Naming];
        let prompt = render_batch(&facts, &checks);
        assert!(prompt.contains("complexity:"));
        assert!(prompt.contains("naming:"));
        assert!(!prompt.contains("duplication:"));
        assert!(prompt.contains("\"findings\""));
        assert!(prompt.contains("### a.ts"));
    }

    #[test]
    fn test_cross_file_budget_drops_trailing_files() {
        // Each summary line is well over 100 chars with a long path
        let long = "x".repeat(200);
        let facts: Vec<Fact> = (0..200)
            .map(|i| fact(&format!("src/{long}/{i}.ts"), 50))
            .collect();
        let prompt = render_cross_file(&facts);
        assert!(prompt.contains("src/"));
        assert!(!prompt.contains("/199.ts"));
        // Budget overflow is bounded by one summary line plus the fixed
        // header/footer text
        assert!(prompt.len() < CROSS_FILE_CHAR_BUDGET + 2000);
    }
}
