//! Verifier
//!
//! Corroborates model claims against extracted facts; findings that cannot
//! be corroborated are dropped, not down-ranked. A finding is verified iff:
//!
//! 1. its `file` matches a fact's path exactly or by path suffix;
//! 2. if it claims a line, the line is within that file's line count;
//! 3. if its description names backtick-quoted symbols, at least one
//!    matches a declaration, function, or member name in that fact.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use rigour_facts::Fact;

use crate::finding::{Finding, VerifiedFinding};

static BACKTICK_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([A-Za-z_][A-Za-z0-9_]*)(?:\(\))?`").expect("valid regex"));

/// Verify findings against the fact set, dropping any that cannot be
/// corroborated.
pub fn verify(findings: Vec<Finding>, facts: &[Fact]) -> Vec<VerifiedFinding> {
    findings
        .into_iter()
        .filter_map(|finding| {
            let Some(fact) = match_fact(&finding, facts) else {
                debug!(file = %finding.file, "dropping finding: unknown file");
                return None;
            };
            if !line_consistent(&finding, fact) {
                debug!(
                    file = %finding.file,
                    line = finding.line,
                    "dropping finding: claimed line beyond file"
                );
                return None;
            }
            if !symbols_consistent(&finding, fact) {
                debug!(file = %finding.file, "dropping finding: no named symbol in facts");
                return None;
            }
            Some(VerifiedFinding {
                finding,
                verified: true,
            })
        })
        .collect()
}

fn match_fact<'a>(finding: &Finding, facts: &'a [Fact]) -> Option<&'a Fact> {
    let claimed = finding.file.trim().trim_start_matches("./");
    if claimed.is_empty() {
        return None;
    }
    facts
        .iter()
        .find(|fact| fact.file == claimed)
        .or_else(|| {
            facts.iter().find(|fact| {
                fact.file.ends_with(claimed) || claimed.ends_with(fact.file.as_str())
            })
        })
}

fn line_consistent(finding: &Finding, fact: &Fact) -> bool {
    match finding.line {
        Some(line) => line >= 1 && line <= fact.line_count,
        None => true,
    }
}

fn symbols_consistent(finding: &Finding, fact: &Fact) -> bool {
    let mut named_any = false;
    for caps in BACKTICK_SYMBOL.captures_iter(&finding.description) {
        named_any = true;
        if fact.has_symbol(&caps[1]) {
            return true;
        }
    }
    // A finding that names no symbols makes no structural claim to check
    !named_any
}
