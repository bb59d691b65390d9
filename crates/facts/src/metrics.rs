//! Quality Metrics
//!
//! Comment ratio, magic-number count, and marker-comment count, computed
//! uniformly across languages. These are intentionally crude signals; the
//! model weighs them together with the structural facts.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Language, QualityMetrics};

/// Multi-digit integer or decimal literal. Single digits (0..9) and the
/// round numbers matched below are not worth flagging.
static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{2,}(?:\.\d+)?\b").expect("valid regex"));

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(TODO|FIXME|HACK|XXX)\b").expect("valid regex"));

/// Round values that show up constantly without being "magic".
const COMMON_VALUES: &[&str] = &["10", "100", "1000", "16", "32", "64", "128", "256", "512", "1024"];

fn comment_prefixes(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python | Language::Ruby => &["#"],
        _ => &["//", "/*", "*", "*/"],
    }
}

fn is_comment_line(trimmed: &str, language: Language) -> bool {
    comment_prefixes(language)
        .iter()
        .any(|p| trimmed.starts_with(p))
}

/// Lines that declare named constants; literals there are not magic.
fn is_const_context(trimmed: &str) -> bool {
    trimmed.starts_with("const ")
        || trimmed.starts_with("static ")
        || trimmed.starts_with("pub const ")
        || trimmed.starts_with("final ")
        || trimmed.contains("= Object.freeze")
}

/// Compute the uniform quality metrics for one file.
pub fn compute_metrics(content: &str, language: Language) -> QualityMetrics {
    let mut non_blank = 0u32;
    let mut comment_lines = 0u32;
    let mut magic_numbers = 0u32;
    let mut markers = 0u32;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        non_blank += 1;

        if is_comment_line(trimmed, language) {
            comment_lines += 1;
            markers += MARKER.find_iter(trimmed).count() as u32;
            continue;
        }

        if is_const_context(trimmed) {
            continue;
        }

        // Strip a trailing line comment before counting literals, so a
        // `// retries 3 times out of 100` comment is not counted.
        let code = match language {
            Language::Python | Language::Ruby => trimmed.split('#').next().unwrap_or(trimmed),
            _ => trimmed.split("//").next().unwrap_or(trimmed),
        };

        magic_numbers += NUMERIC_LITERAL
            .find_iter(code)
            .filter(|m| !COMMON_VALUES.contains(&m.as_str()))
            .count() as u32;
    }

    let comment_ratio = if non_blank == 0 {
        0.0
    } else {
        comment_lines as f32 / non_blank as f32
    };

    QualityMetrics {
        comment_ratio,
        magic_number_count: magic_numbers,
        marker_comment_count: markers,
    }
}
