//! Response Parser
//!
//! Model output is unreliable: prose around the JSON, markdown fences,
//! responses cut off mid-array by a token limit. The parser tries a chain
//! of strategies, strictest first, and every path funnels through the same
//! validator. `None` means no strategy produced well-formed JSON at all;
//! `Some(vec![])` is a clean "no findings" response.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use rigour_core::Severity;

use crate::finding::Finding;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid regex")
});

/// Parse raw model text into validated findings.
pub fn parse(raw: &str) -> Option<Vec<Finding>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let mut parsed_any = false;

    // (a) whole text as JSON
    if let Some(entries) = parse_json_payload(text) {
        parsed_any = true;
        let findings = validate(&entries);
        if !findings.is_empty() {
            return Some(findings);
        }
    }

    // (b) first fenced code block
    if let Some(caps) = FENCED_BLOCK.captures(text) {
        if let Some(entries) = parse_json_payload(caps[1].trim()) {
            parsed_any = true;
            let findings = validate(&entries);
            if !findings.is_empty() {
                return Some(findings);
            }
        }
    }

    // (c) first {...} span containing a findings key
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            let span = &text[start..=end];
            if span.contains("\"findings\"") {
                if let Some(entries) = parse_json_payload(span) {
                    parsed_any = true;
                    let findings = validate(&entries);
                    if !findings.is_empty() {
                        return Some(findings);
                    }
                }
            }
        }
    }

    // (d) truncation recovery over balanced object literals
    let recovered = recover_objects(text);
    if !recovered.is_empty() {
        parsed_any = true;
        let findings = validate(&recovered);
        if !findings.is_empty() {
            return Some(findings);
        }
    }

    if parsed_any {
        Some(Vec::new())
    } else {
        debug!("response matched no parser strategy");
        None
    }
}

/// Accept either a bare array or an object with a `findings` array.
fn parse_json_payload(text: &str) -> Option<Vec<Value>> {
    let value: Value = serde_json::from_str(text).ok()?;
    match value {
        Value::Array(entries) => Some(entries),
        Value::Object(mut map) => match map.remove("findings") {
            Some(Value::Array(entries)) => Some(entries),
            _ => None,
        },
        _ => None,
    }
}

/// Scan for individually well-formed `{...}` literals that carry both a
/// category and a description, parsing each independently. Tolerates a
/// response truncated mid-array: the trailing partial object simply never
/// balances and is skipped.
fn recover_objects(text: &str) -> Vec<Value> {
    let bytes = text.as_bytes();
    let mut entries = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = balanced_end(bytes, i) {
                let span = &text[i..=end];
                if span.contains("\"category\"") && span.contains("\"description\"") {
                    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(span) {
                        // Skip container objects; only leaf finding literals
                        if value.get("findings").is_none() {
                            entries.push(value);
                            i = end + 1;
                            continue;
                        }
                    }
                }
            }
        }
        i += 1;
    }
    entries
}

/// Index of the `}` closing the object opened at `start`, honoring string
/// literals and escapes. `None` if it never balances.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop malformed entries and normalize the rest.
fn validate(entries: &[Value]) -> Vec<Finding> {
    entries.iter().filter_map(validate_one).collect()
}

fn validate_one(entry: &Value) -> Option<Finding> {
    let category = non_empty_str(entry.get("category")?)?;
    let file = non_empty_str(entry.get("file")?)?;
    let description = non_empty_str(entry.get("description")?)?;

    let severity = entry
        .get("severity")
        .and_then(Value::as_str)
        .map(Severity::parse_or_default)
        .unwrap_or(Severity::Medium);
    let confidence = entry
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(0.5);
    let line = entry
        .get("line")
        .and_then(Value::as_u64)
        .map(|l| l as u32);
    let suggestion = entry
        .get("suggestion")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(Finding {
        category: category.to_string(),
        severity,
        file: file.to_string(),
        line,
        description: description.to_string(),
        suggestion,
        confidence,
    })
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"{"findings": [{"category": "complexity", "severity": "high",
        "file": "src/a.ts", "line": 10, "description": "`run` too long",
        "suggestion": "split it", "confidence": 0.9}]}"#;

    #[test]
    fn test_whole_text_object() {
        let findings = parse(GOOD).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, "complexity");
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].line, Some(10));
    }

    #[test]
    fn test_bare_array() {
        let raw = r#"[{"category": "naming", "file": "a.rs", "description": "bad name"}]"#;
        let findings = parse(raw).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].confidence, 0.5);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_fenced_code_block() {
        let raw = format!("Here is my analysis:\n```json\n{GOOD}\n```\nHope that helps!");
        let findings = parse(&raw).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_brace_span_with_surrounding_prose() {
        let raw = format!("Sure! {GOOD} Let me know if you need more.");
        let findings = parse(&raw).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_truncation_recovery_keeps_only_complete_objects() {
        let raw = r#"{"findings": [
            {"category": "complexity", "file": "a.ts", "description": "first"},
            {"category": "naming", "file": "b.ts", "description": "second"},
            {"category": "dupl"#;
        let findings = parse(raw).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].description, "first");
        assert_eq!(findings[1].description, "second");
    }

    #[test]
    fn test_braces_inside_strings_do_not_break_recovery() {
        let raw = r#"[{"category": "complexity", "file": "a.ts",
            "description": "uses {nested} braces and a \" quote"},
            {"category": "x", "file": "b.ts", "description": "ok"}, {"category": "trun"#;
        let findings = parse(raw).unwrap();
        assert_eq!(findings.len(), 2);
        assert!(findings[0].description.contains("{nested}"));
    }

    #[test]
    fn test_unparseable_text_is_none() {
        assert!(parse("I could not find any issues, great code!").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_clean_empty_findings_is_some_empty() {
        let findings = parse(r#"{"findings": []}"#).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_validation_drops_incomplete_entries() {
        let raw = r#"{"findings": [
            {"category": "naming", "file": "a.rs", "description": "ok"},
            {"category": "naming", "description": "no file"},
            {"category": "", "file": "b.rs", "description": "empty category"},
            {"category": "naming", "file": "c.rs", "description": ""}
        ]}"#;
        let findings = parse(raw).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file, "a.rs");
    }

    #[test]
    fn test_confidence_clamped_and_severity_defaulted() {
        let raw = r#"[{"category": "x", "file": "a.rs", "description": "d",
            "confidence": 3.5, "severity": "blocker"}]"#;
        let findings = parse(raw).unwrap();
        assert_eq!(findings[0].confidence, 1.0);
        assert_eq!(findings[0].severity, Severity::Medium);

        let raw = r#"[{"category": "x", "file": "a.rs", "description": "d", "confidence": -1}]"#;
        let findings = parse(raw).unwrap();
        assert_eq!(findings[0].confidence, 0.0);
    }
}
