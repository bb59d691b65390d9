//! Brace-Counting Extractor
//!
//! Structural extraction for C-like languages (TypeScript/JavaScript, Rust,
//! Go, Java, C/C++, C#). Blocks are delimited by braces; the extractor
//! tracks brace depth per line and derives declaration spans, member
//! counts, function signatures, and error-handling blocks from it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{
    DeclarationFact, DeclarationKind, ErrorHandlingFact, FunctionFact, Language,
};

use super::{
    classify_handler, collect_signals, count_assertions, detect_tests, estimate_complexity,
    ExtractedStructure, LanguageExtractor,
};

// ── Signature patterns ─────────────────────────────────────────────────

static RUST_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:pub(?:\([^)]*\))?\s+)?(struct|enum|trait)\s+([A-Za-z_]\w*)").expect("valid regex")
});
static RUST_IMPL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^impl(?:<[^>]*>)?\s+(?:([A-Za-z_][\w:]*)\s+for\s+)?([A-Za-z_]\w*)")
        .expect("valid regex")
});
static RUST_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(pub(?:\([^)]*\))?\s+)?(async\s+)?(?:unsafe\s+)?fn\s+([A-Za-z_]\w*)")
        .expect("valid regex")
});
static RUST_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:pub(?:\([^)]*\))?\s+)?([a-z_]\w*)\s*:").expect("valid regex"));
static RUST_USE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:pub\s+)?use\s+([\w:]+)").expect("valid regex"));
static RUST_DERIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\[derive\(([^)]*)\)\]").expect("valid regex"));

static TS_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?(class|interface|enum)\s+([A-Za-z_]\w*)(?:\s+extends\s+([\w.,\s]+?))?(?:\s+implements\s+([\w.,\s]+?))?\s*\{?\s*$",
    )
    .expect("valid regex")
});
static TS_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(export\s+)?(?:default\s+)?(async\s+)?function\s*\*?\s*([A-Za-z_]\w*)")
        .expect("valid regex")
});
static TS_ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(export\s+)?(?:const|let|var)\s+([A-Za-z_]\w*)\s*=\s*(async\s+)?(?:\([^)]*\)|[A-Za-z_]\w*)\s*=>")
        .expect("valid regex")
});
static TS_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:public|private|protected|static|readonly|async|override|get|set)\s+)*([A-Za-z_]\w*)\s*\([^;]*\)?\s*\{?\s*$")
        .expect("valid regex")
});
static TS_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:public|private|protected|readonly|static)\s+)+([A-Za-z_]\w*)")
        .expect("valid regex")
});
static TS_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^import\s+(?:.+\s+from\s+)?['"]([^'"]+)['"]"#).expect("valid regex")
});
static TS_EXPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^export\s+(?:default\s+)?(?:abstract\s+)?(?:async\s+)?(?:function|class|interface|const|let|var|enum|type)\s*\*?\s*([A-Za-z_]\w*)")
        .expect("valid regex")
});

static GO_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^type\s+([A-Za-z_]\w*)\s+(struct|interface)\b").expect("valid regex")
});
static GO_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^func\s+(?:\(\s*\w+\s+\*?([A-Za-z_]\w*)\s*\)\s*)?([A-Za-z_]\w*)\s*\(")
        .expect("valid regex")
});
static GO_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_]\w*)\s+[\[\]*\w]").expect("valid regex"));
static GO_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("valid regex"));

static JVM_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:public|private|protected|internal|abstract|final|static|sealed|partial)\s+)*(class|interface|enum)\s+([A-Za-z_]\w*)(?:\s*(?:extends|implements|:)\s*([\w.,<>\s]+?))?\s*\{?\s*$",
    )
    .expect("valid regex")
});
static JVM_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:(?:public|private|protected|internal|static|final|abstract|override|virtual|async|synchronized)\s+)*)[\w<>\[\],.\s]+?\s+([A-Za-z_]\w*)\s*\([^;]*\)\s*\{?\s*$")
        .expect("valid regex")
});
static JVM_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:import|using)\s+(?:static\s+)?([\w.]+)").expect("valid regex"));

static C_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:typedef\s+)?(struct|class|enum)\s+([A-Za-z_]\w*)").expect("valid regex")
});
static C_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w*\s]+?\b([A-Za-z_]\w*)\s*\([^;]*\)\s*\{").expect("valid regex")
});
static C_INCLUDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^#include\s+[<"]([^>"]+)[>"]"#).expect("valid regex"));

/// Names that look like calls/blocks but are control flow, not functions.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "else", "do", "new", "match", "loop",
    "defer", "select", "try", "using", "lock", "foreach",
];

/// Brace-counting extractor for C-like languages.
pub struct BraceExtractor {
    language: Language,
}

impl BraceExtractor {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Strip line comments and string contents so brace counting is not
    /// confused by braces in literals. Heuristic, not a lexer.
    fn code_portion(line: &str, language: Language) -> String {
        let mut out = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();
        let mut in_string: Option<char> = None;
        while let Some(c) = chars.next() {
            match in_string {
                Some(quote) => {
                    if c == '\\' {
                        chars.next();
                    } else if c == quote {
                        in_string = None;
                    }
                }
                None => match c {
                    '"' | '\'' | '`' => in_string = Some(c),
                    '/' if chars.peek() == Some(&'/')
                        && !matches!(language, Language::Python | Language::Ruby) =>
                    {
                        break;
                    }
                    _ => out.push(c),
                },
            }
        }
        out
    }

    /// Depth at the start of each line, plus one trailing entry for EOF.
    fn compute_depths(&self, lines: &[&str]) -> Vec<u32> {
        let mut depths = Vec::with_capacity(lines.len() + 1);
        let mut depth: i32 = 0;
        for line in lines {
            depths.push(depth.max(0) as u32);
            let code = Self::code_portion(line, self.language);
            for c in code.chars() {
                match c {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
            }
        }
        depths.push(depth.max(0) as u32);
        depths
    }

    /// Find the last line of the block whose opening brace is at or after
    /// `start`. Returns `start` when no block opens (e.g. a signature-only
    /// line).
    fn block_end(&self, lines: &[&str], depths: &[u32], start: usize) -> usize {
        let mut open_line = None;
        for (i, line) in lines.iter().enumerate().skip(start).take(3) {
            if Self::code_portion(line, self.language).contains('{') {
                open_line = Some(i);
                break;
            }
        }
        let open_line = match open_line {
            Some(i) => i,
            None => return start,
        };
        let base = depths[open_line];
        for i in (open_line + 1)..lines.len() {
            if depths[i + 1] <= base {
                return i;
            }
        }
        lines.len() - 1
    }

    fn parse_declaration(&self, trimmed: &str) -> Option<(DeclarationKind, String, Vec<String>)> {
        match self.language {
            Language::Rust => {
                let caps = RUST_DECL.captures(trimmed)?;
                let kind = match &caps[1] {
                    "struct" => DeclarationKind::Struct,
                    "enum" => DeclarationKind::Enum,
                    _ => DeclarationKind::Trait,
                };
                Some((kind, caps[2].to_string(), Vec::new()))
            }
            Language::TypeScript | Language::JavaScript => {
                let caps = TS_DECL.captures(trimmed)?;
                let kind = match &caps[1] {
                    "class" => DeclarationKind::Class,
                    "interface" => DeclarationKind::Interface,
                    _ => DeclarationKind::Enum,
                };
                let mut deps = Vec::new();
                for group in [caps.get(3), caps.get(4)].into_iter().flatten() {
                    deps.extend(split_names(group.as_str()));
                }
                Some((kind, caps[2].to_string(), deps))
            }
            Language::Go => {
                let caps = GO_DECL.captures(trimmed)?;
                let kind = if &caps[2] == "struct" {
                    DeclarationKind::Struct
                } else {
                    DeclarationKind::Interface
                };
                Some((kind, caps[1].to_string(), Vec::new()))
            }
            Language::Java | Language::CSharp => {
                let caps = JVM_DECL.captures(trimmed)?;
                let kind = match &caps[1] {
                    "class" => DeclarationKind::Class,
                    "interface" => DeclarationKind::Interface,
                    _ => DeclarationKind::Enum,
                };
                let deps = caps
                    .get(3)
                    .map(|g| split_names(g.as_str()))
                    .unwrap_or_default();
                Some((kind, caps[2].to_string(), deps))
            }
            Language::C | Language::Cpp => {
                let caps = C_DECL.captures(trimmed)?;
                let kind = match &caps[1] {
                    "class" => DeclarationKind::Class,
                    "enum" => DeclarationKind::Enum,
                    _ => DeclarationKind::Struct,
                };
                Some((kind, caps[2].to_string(), Vec::new()))
            }
            _ => None,
        }
    }

    /// Parse a function signature: (name, is_async, is_exported, receiver).
    /// `receiver` is the Go method receiver type, when present.
    fn parse_function(&self, trimmed: &str) -> Option<(String, bool, bool, Option<String>)> {
        match self.language {
            Language::Rust => {
                let caps = RUST_FN.captures(trimmed)?;
                Some((
                    caps[3].to_string(),
                    caps.get(2).is_some(),
                    caps.get(1).is_some(),
                    None,
                ))
            }
            Language::TypeScript | Language::JavaScript => {
                if let Some(caps) = TS_FN.captures(trimmed) {
                    return Some((
                        caps[3].to_string(),
                        caps.get(2).is_some(),
                        caps.get(1).is_some(),
                        None,
                    ));
                }
                let caps = TS_ARROW.captures(trimmed)?;
                Some((
                    caps[2].to_string(),
                    caps.get(3).is_some(),
                    caps.get(1).is_some(),
                    None,
                ))
            }
            Language::Go => {
                let caps = GO_FN.captures(trimmed)?;
                let name = caps[2].to_string();
                let exported = name.chars().next().is_some_and(|c| c.is_uppercase());
                let receiver = caps.get(1).map(|m| m.as_str().to_string());
                Some((name, false, exported, receiver))
            }
            Language::Java | Language::CSharp => {
                let caps = JVM_METHOD.captures(trimmed)?;
                let name = caps[2].to_string();
                if CONTROL_KEYWORDS.contains(&name.as_str()) {
                    return None;
                }
                let modifiers = caps[1].to_string();
                Some((
                    name,
                    modifiers.contains("async"),
                    modifiers.contains("public"),
                    None,
                ))
            }
            Language::C | Language::Cpp => {
                let caps = C_FN.captures(trimmed)?;
                let name = caps[1].to_string();
                if CONTROL_KEYWORDS.contains(&name.as_str()) {
                    return None;
                }
                Some((name, false, true, None))
            }
            _ => None,
        }
    }

    /// Parse a member line inside a declaration block.
    fn parse_member(&self, trimmed: &str) -> Option<String> {
        match self.language {
            Language::Rust => {
                if let Some(caps) = RUST_FN.captures(trimmed) {
                    return Some(caps[3].to_string());
                }
                RUST_FIELD.captures(trimmed).map(|c| c[1].to_string())
            }
            Language::TypeScript | Language::JavaScript => {
                if let Some(caps) = TS_METHOD.captures(trimmed) {
                    let name = caps[1].to_string();
                    if !CONTROL_KEYWORDS.contains(&name.as_str()) && trimmed.contains('(') {
                        return Some(name);
                    }
                }
                TS_FIELD.captures(trimmed).map(|c| c[1].to_string())
            }
            Language::Go => GO_FIELD
                .captures(trimmed)
                .map(|c| c[1].to_string())
                .filter(|name| !CONTROL_KEYWORDS.contains(&name.as_str())),
            Language::Java | Language::CSharp => JVM_METHOD
                .captures(trimmed)
                .map(|c| c[2].to_string())
                .filter(|name| !CONTROL_KEYWORDS.contains(&name.as_str())),
            Language::C | Language::Cpp => {
                let trimmed = trimmed.trim_end_matches([',', ';']);
                let name = trimmed.split_whitespace().last()?;
                let name = name.trim_start_matches('*');
                if name.chars().all(|c| c.is_alphanumeric() || c == '_') && !name.is_empty() {
                    Some(name.to_string())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn parse_import(&self, trimmed: &str, in_go_import_block: bool) -> Option<String> {
        match self.language {
            Language::Rust => RUST_USE.captures(trimmed).map(|c| c[1].to_string()),
            Language::TypeScript | Language::JavaScript => {
                TS_IMPORT.captures(trimmed).map(|c| c[1].to_string())
            }
            Language::Go => {
                if trimmed.starts_with("import ") || in_go_import_block {
                    GO_IMPORT.captures(trimmed).map(|c| c[1].to_string())
                } else {
                    None
                }
            }
            Language::Java | Language::CSharp => {
                JVM_IMPORT.captures(trimmed).map(|c| c[1].to_string())
            }
            Language::C | Language::Cpp => C_INCLUDE.captures(trimmed).map(|c| c[1].to_string()),
            _ => None,
        }
    }

    /// Count parameters of the signature starting at `start`, following
    /// continuation lines until the parameter list closes.
    fn count_params(&self, lines: &[&str], start: usize) -> u32 {
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
            collected.push(' ');
        }
        let trimmed = collected.trim();
        if trimmed.is_empty() || trimmed == "&self" || trimmed == "self" || trimmed == "&mut self" {
            return 0;
        }
        let mut count = trimmed.split(',').filter(|p| !p.trim().is_empty()).count() as u32;
        // Rust methods: the receiver is not a parameter.
        if self.language == Language::Rust && trimmed.starts_with(['&', 's']) && trimmed.contains("self") {
            count = count.saturating_sub(1);
        }
        count
    }

    /// Detect an error-handling construct on a line, returning its kind.
    fn handler_kind(&self, trimmed: &str) -> Option<&'static str> {
        match self.language {
            Language::Rust => {
                if trimmed.starts_with("if let Err(") {
                    Some("err-check")
                } else if trimmed.contains("Err(") && trimmed.contains("=>") {
                    Some("match-err")
                } else {
                    None
                }
            }
            Language::Go => {
                if trimmed.starts_with("if err != nil") {
                    Some("err-check")
                } else {
                    None
                }
            }
            _ => {
                if trimmed.starts_with("catch")
                    || trimmed.contains("} catch")
                    || trimmed.starts_with(".catch(")
                {
                    Some("catch")
                } else {
                    None
                }
            }
        }
    }
}

impl LanguageExtractor for BraceExtractor {
    fn extract(&self, content: &str) -> ExtractedStructure {
        let lines: Vec<&str> = content.lines().collect();
        let depths = self.compute_depths(&lines);

        let mut out = ExtractedStructure {
            assertion_count: count_assertions(content, self.language),
            has_tests: detect_tests(content, self.language),
            signals: collect_signals(content, self.language),
            ..Default::default()
        };

        let mut pending_derives: Vec<String> = Vec::new();
        let mut in_go_import_block = false;

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Go import blocks span multiple lines.
            if self.language == Language::Go {
                if trimmed.starts_with("import (") {
                    in_go_import_block = true;
                } else if in_go_import_block && trimmed == ")" {
                    in_go_import_block = false;
                }
            }

            if let Some(import) = self.parse_import(trimmed, in_go_import_block) {
                out.imports.push(import);
                continue;
            }

            if self.language == Language::Rust {
                if let Some(caps) = RUST_DERIVE.captures(trimmed) {
                    pending_derives = split_names(&caps[1]);
                    continue;
                }
            }

            if let Some((kind, name, mut deps)) = self.parse_declaration(trimmed) {
                let end = self.block_end(&lines, &depths, i);
                let block_depth = depths[i];
                let mut members = Vec::new();
                for j in (i + 1)..end {
                    if depths[j] == block_depth + 1 {
                        if let Some(member) = self.parse_member(lines[j].trim()) {
                            members.push(member);
                        }
                    }
                }
                if self.language == Language::Rust {
                    deps.append(&mut pending_derives);
                }
                if trimmed.contains("export ")
                    || trimmed.starts_with("pub ")
                    || trimmed.contains("public ")
                {
                    out.exports.push(name.clone());
                }
                out.declarations.push(DeclarationFact {
                    kind,
                    name,
                    start_line: (i + 1) as u32,
                    end_line: (end + 1) as u32,
                    member_count: members.len() as u32,
                    members,
                    dependencies: deps,
                });
                continue;
            }
            pending_derives.clear();

            // Rust impl blocks fold their methods into the type's declaration.
            if self.language == Language::Rust {
                if let Some(caps) = RUST_IMPL.captures(trimmed) {
                    let trait_name = caps.get(1).map(|m| m.as_str().to_string());
                    let type_name = caps[2].to_string();
                    let end = self.block_end(&lines, &depths, i);
                    let block_depth = depths[i];
                    let mut methods = Vec::new();
                    for j in (i + 1)..end {
                        if depths[j] == block_depth + 1 {
                            if let Some(fn_caps) = RUST_FN.captures(lines[j].trim()) {
                                methods.push(fn_caps[3].to_string());
                            }
                        }
                    }
                    if let Some(decl) = out
                        .declarations
                        .iter_mut()
                        .find(|d| d.name == type_name)
                    {
                        decl.member_count += methods.len() as u32;
                        decl.members.extend(methods);
                        if let Some(t) = trait_name {
                            decl.dependencies.push(t);
                        }
                        decl.end_line = decl.end_line.max((end + 1) as u32);
                    }
                    // Fall through: methods inside the impl are still picked
                    // up as functions on their own lines.
                }
            }

            if let Some((name, is_async, is_exported, receiver)) = self.parse_function(trimmed) {
                let end = self.block_end(&lines, &depths, i);
                let body: Vec<&str> = lines[i..=end].to_vec();
                out.functions.push(FunctionFact {
                    name: name.clone(),
                    start_line: (i + 1) as u32,
                    end_line: (end + 1) as u32,
                    param_count: self.count_params(&lines, i),
                    is_async,
                    is_exported,
                    nesting_depth: depths[i],
                    complexity: estimate_complexity(&body),
                });
                if is_exported && depths[i] == 0 {
                    out.exports.push(name.clone());
                }
                // Go methods count as members of their receiver type.
                if let Some(receiver) = receiver {
                    if let Some(decl) =
                        out.declarations.iter_mut().find(|d| d.name == receiver)
                    {
                        decl.member_count += 1;
                        decl.members.push(name);
                    }
                }
            }

            if let Some(kind) = self.handler_kind(trimmed) {
                let end = self.block_end(&lines, &depths, i);
                let (is_empty, strategy) = if end == i {
                    // Inline handler: classify the text between the braces,
                    // or after `=>` for a match arm.
                    let inline = trimmed
                        .split_once('{')
                        .map(|(_, rest)| rest.trim_end_matches(['}', ',']).trim())
                        .or_else(|| trimmed.split_once("=>").map(|(_, rest)| rest.trim()))
                        .unwrap_or("");
                    classify_handler(&[inline])
                } else {
                    classify_handler(&lines[(i + 1)..end])
                };
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

fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('{').trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.split('<').next().unwrap_or(s).trim().to_string())
        .collect()
}
