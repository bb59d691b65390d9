//! Fact Extractor
//!
//! Walks a project tree and produces one `Fact` per supported source file.
//! Pure and stateless: no I/O beyond reading files, and a file that cannot
//! be read or parsed is skipped silently so extraction never aborts a run.

use std::path::Path;

use glob::Pattern;
use ignore::WalkBuilder;
use tracing::debug;

use crate::languages::extractor_for;
use crate::metrics::compute_metrics;
use crate::model::{Fact, Language};

/// Files under this many lines carry no analyzable structure.
const MIN_FILE_LINES: usize = 3;

/// Directory names never worth analyzing, on top of gitignore.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "vendor",
    ".git",
    "__pycache__",
    "venv",
    ".venv",
    "coverage",
    ".next",
    "out",
];

/// Heuristic structural fact extraction over a project tree.
#[derive(Debug, Default)]
pub struct FactExtractor;

impl FactExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract facts for every supported source file under `root`, honoring
    /// gitignore, the built-in directory exclusions, and the host-supplied
    /// ignore patterns (gitignore-style globs matched against paths relative
    /// to `root`).
    pub fn extract(&self, root: &Path, ignore_patterns: &[String]) -> Vec<Fact> {
        let patterns: Vec<Pattern> = ignore_patterns
            .iter()
            .filter_map(|raw| match Pattern::new(raw) {
                Ok(pattern) => Some(pattern),
                Err(err) => {
                    debug!(pattern = %raw, error = %err, "skipping invalid ignore pattern");
                    None
                }
            })
            .collect();

        let walker = WalkBuilder::new(root)
            .standard_filters(true)
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !EXCLUDED_DIRS.contains(&name.as_ref())
            })
            .build();

        let mut facts = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let language = match path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(Language::from_extension)
            {
                Some(language) => language,
                None => continue,
            };

            let rel = path.strip_prefix(root).unwrap_or(path);
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if patterns.iter().any(|p| p.matches(&rel_str)) {
                continue;
            }

            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(err) => {
                    debug!(file = %rel_str, error = %err, "skipping unreadable file");
                    continue;
                }
            };

            let line_count = content.lines().count();
            if line_count < MIN_FILE_LINES {
                continue;
            }

            let structure = extractor_for(language).extract(&content);
            facts.push(Fact {
                file: rel_str,
                language,
                line_count: line_count as u32,
                declarations: structure.declarations,
                functions: structure.functions,
                imports: structure.imports,
                exports: structure.exports,
                error_handling: structure.error_handling,
                assertion_count: structure.assertion_count,
                has_tests: structure.has_tests,
                signals: structure.signals,
                metrics: compute_metrics(&content, language),
            });
        }

        // Walk order is platform-dependent; keep output deterministic.
        facts.sort_by(|a, b| a.file.cmp(&b.file));
        facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_extract_walks_supported_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "src/app.ts",
            "export function main() {\n  return 1;\n}\n",
        );
        write(tmp.path(), "lib/util.py", "def util():\n    x = 1\n    return x\n");
        write(tmp.path(), "README.md", "# readme\nnot code\nat all\n");

        let facts = FactExtractor::new().extract(tmp.path(), &[]);
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].file, "lib/util.py");
        assert_eq!(facts[1].file, "src/app.ts");
    }

    #[test]
    fn test_files_under_three_lines_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "tiny.js", "export const x = 1;\n");
        write(tmp.path(), "ok.js", "const a = 1;\nconst b = 2;\nconst c = 3;\n");

        let facts = FactExtractor::new().extract(tmp.path(), &[]);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].file, "ok.js");
    }

    #[test]
    fn test_dependency_dirs_excluded() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "node_modules/pkg/index.js",
            "module.exports = 1;\n// noise\n// more\n",
        );
        write(
            tmp.path(),
            "target/debug/gen.rs",
            "fn gen() {}\n// build artifact\n// ignore\n",
        );
        write(tmp.path(), "src/main.rs", "fn main() {\n    run();\n}\n");

        let facts = FactExtractor::new().extract(tmp.path(), &[]);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].file, "src/main.rs");
    }

    #[test]
    fn test_ignore_patterns_respected() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "src/a.ts", "export const a = 1;\nconst b = 2;\nconst c = 3;\n");
        write(
            tmp.path(),
            "src/generated.ts",
            "export const g = 1;\nconst h = 2;\nconst i = 3;\n",
        );

        let facts =
            FactExtractor::new().extract(tmp.path(), &["src/generated.ts".to_string()]);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].file, "src/a.ts");
    }

    #[test]
    fn test_invalid_ignore_pattern_does_not_abort() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.go", "package main\n\nfunc main() {\n}\n");

        let facts = FactExtractor::new().extract(tmp.path(), &["[".to_string()]);
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn test_fact_line_count_and_metrics() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "calc.ts",
            "// adds things\nexport function add(a: number, b: number) {\n  return a + b + 4217;\n}\n",
        );

        let facts = FactExtractor::new().extract(tmp.path(), &[]);
        assert_eq!(facts.len(), 1);
        let fact = &facts[0];
        assert_eq!(fact.line_count, 4);
        assert_eq!(fact.functions.len(), 1);
        assert_eq!(fact.functions[0].param_count, 2);
        assert_eq!(fact.metrics.magic_number_count, 1);
        assert!(fact.metrics.comment_ratio > 0.0);
    }
}
