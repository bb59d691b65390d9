//! Indentation-Tracking Extractor
//!
//! Structural extraction for indentation-significant languages (Python,
//! Ruby). Block spans are derived from indent levels: a block owns every
//! following line that is more deeply indented than its header.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{
    DeclarationFact, DeclarationKind, ErrorHandlingFact, FunctionFact, Language,
};

use super::{
    classify_handler, count_assertions, detect_tests, estimate_complexity, ExtractedStructure,
    LanguageExtractor,
};

static PY_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^class\s+([A-Za-z_]\w*)(?:\(([^)]*)\))?\s*:").expect("valid regex")
});
static PY_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(async\s+)?def\s+([A-Za-z_]\w*)\s*\(").expect("valid regex")
});
static PY_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:import\s+([\w.]+)|from\s+([\w.]+)\s+import)").expect("valid regex")
});
static PY_ALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__all__\s*=\s*\[([^\]]*)\]").expect("valid regex"));

static RB_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:class|module)\s+([A-Z]\w*)(?:\s*<\s*([\w:]+))?").expect("valid regex")
});
static RB_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^def\s+(?:self\.)?([a-z_]\w*[?!]?)").expect("valid regex")
});
static RB_REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^require(?:_relative)?\s+['"]([^'"]+)['"]"#).expect("valid regex")
});

/// Indentation extractor for Python and Ruby.
pub struct IndentExtractor {
    language: Language,
}

impl IndentExtractor {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    fn indent_of(line: &str) -> u32 {
        let mut width = 0u32;
        for c in line.chars() {
            match c {
                ' ' => width += 1,
                '\t' => width += 4,
                _ => break,
            }
        }
        width
    }

    /// Last line belonging to the block whose header is at `start`.
    /// A block owns everything more indented than its header; for Ruby
    /// the matching `end` line is included.
    fn block_end(&self, lines: &[&str], start: usize) -> usize {
        let base = Self::indent_of(lines[start]);
        let mut end = start;
        for (i, line) in lines.iter().enumerate().skip(start + 1) {
            if line.trim().is_empty() {
                continue;
            }
            let indent = Self::indent_of(line);
            if indent <= base {
                if self.language == Language::Ruby && line.trim() == "end" && indent == base {
                    return i;
                }
                return end;
            }
            end = i;
        }
        end
    }

    fn parse_import(&self, trimmed: &str) -> Option<String> {
        match self.language {
            Language::Python => PY_IMPORT.captures(trimmed).map(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default()
            }),
            _ => RB_REQUIRE.captures(trimmed).map(|c| c[1].to_string()),
        }
    }

    /// Count parameters, excluding `self`/`cls` receivers.
    fn count_params(lines: &[&str], start: usize) -> u32 {
        let mut collected = String::new();
        let mut paren_depth = 0i32;
        let mut started = false;
        'outer: for line in lines.iter().skip(start).take(8) {
            for c in line.chars() {
                match c {
                    '(' => {
                        paren_depth += 1;
                        if paren_depth == 1 {
                            started = true;
                            continue;
                        }
                    }
                    ')' => {
                        paren_depth -= 1;
                        if started && paren_depth == 0 {
                            break 'outer;
                        }
                    }
                    _ => {}
                }
                if started && paren_depth >= 1 {
                    collected.push(c);
                }
            }
            if !started {
                // Ruby defs may omit parens entirely.
                return 0;
            }
            collected.push(' ');
        }
        collected
            .split(',')
            .map(|p| p.trim())
            .filter(|p| !p.is_empty() && *p != "self" && *p != "cls")
            .count() as u32
    }
}

impl LanguageExtractor for IndentExtractor {
    fn extract(&self, content: &str) -> ExtractedStructure {
        let lines: Vec<&str> = content.lines().collect();

        let mut out = ExtractedStructure {
            assertion_count: count_assertions(content, self.language),
            has_tests: detect_tests(content, self.language),
            signals: None,
            ..Default::default()
        };

        // Explicit export list wins for Python.
        if self.language == Language::Python {
            if let Some(caps) = PY_ALL.captures(content) {
                out.exports = caps[1]
                    .split(',')
                    .map(|s| s.trim().trim_matches(['\'', '"']).to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }
        let explicit_exports = !out.exports.is_empty();

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = Self::indent_of(line);

            if let Some(import) = self.parse_import(trimmed) {
                out.imports.push(import);
                continue;
            }

            let class_caps = match self.language {
                Language::Python => PY_CLASS.captures(trimmed),
                _ => RB_CLASS.captures(trimmed),
            };
            if let Some(caps) = class_caps {
                let name = caps[1].to_string();
                let deps: Vec<String> = caps
                    .get(2)
                    .map(|g| {
                        g.as_str()
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty() && s != "object")
                            .collect()
                    })
                    .unwrap_or_default();
                let end = self.block_end(&lines, i);

                // Methods are defs one level deeper than the class header.
                let mut members = Vec::new();
                let mut member_indent: Option<u32> = None;
                for inner in lines.iter().take(end + 1).skip(i + 1) {
                    let inner_trimmed = inner.trim();
                    if inner_trimmed.is_empty() {
                        continue;
                    }
                    let inner_indent = Self::indent_of(inner);
                    let level = *member_indent.get_or_insert(inner_indent);
                    if inner_indent != level {
                        continue;
                    }
                    let def_caps = match self.language {
                        Language::Python => PY_DEF.captures(inner_trimmed),
                        _ => RB_DEF.captures(inner_trimmed),
                    };
                    if let Some(def_caps) = def_caps {
                        let name_group = if self.language == Language::Python { 2 } else { 1 };
                        members.push(def_caps[name_group].to_string());
                    }
                }

                if indent == 0 && !explicit_exports && !name.starts_with('_') {
                    out.exports.push(name.clone());
                }
                out.declarations.push(DeclarationFact {
                    kind: DeclarationKind::Class,
                    name,
                    start_line: (i + 1) as u32,
                    end_line: (end + 1) as u32,
                    member_count: members.len() as u32,
                    members,
                    dependencies: deps,
                });
                continue;
            }

            let def_caps = match self.language {
                Language::Python => PY_DEF.captures(trimmed),
                _ => RB_DEF.captures(trimmed),
            };
            if let Some(caps) = def_caps {
                let (name, is_async) = if self.language == Language::Python {
                    (caps[2].to_string(), caps.get(1).is_some())
                } else {
                    (caps[1].to_string(), false)
                };
                let end = self.block_end(&lines, i);
                let body: Vec<&str> = lines[i..=end].to_vec();
                let is_exported = indent == 0 && !name.starts_with('_');
                if is_exported && !explicit_exports {
                    out.exports.push(name.clone());
                }
                out.functions.push(FunctionFact {
                    name,
                    start_line: (i + 1) as u32,
                    end_line: (end + 1) as u32,
                    param_count: Self::count_params(&lines, i),
                    is_async,
                    is_exported,
                    nesting_depth: indent / 4,
                    complexity: estimate_complexity(&body),
                });
                continue;
            }

            let handler = match self.language {
                Language::Python => trimmed.starts_with("except").then_some("except"),
                _ => trimmed.starts_with("rescue").then_some("rescue"),
            };
            if let Some(kind) = handler {
                let end = self.block_end(&lines, i);
                let body: Vec<&str> = if end > i {
                    lines[(i + 1)..=end].to_vec()
                } else {
                    Vec::new()
                };
                let (is_empty, strategy) = classify_handler(&body);
                out.error_handling.push(ErrorHandlingFact {
                    kind: kind.to_string(),
                    line: (i + 1) as u32,
                    is_empty,
                    strategy,
                });
            }
        }

        out
    }
}
