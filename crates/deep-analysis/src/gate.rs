//! Deep Analysis Gate
//!
//! Orchestrates the full pipeline: provider setup under a hard deadline,
//! fact extraction, capping, chunked analysis (sequential or multi-worker),
//! the cross-file pass, verification, and conversion to gate failures.
//! The deep pass is advisory: no failure here ever propagates to the
//! caller as an error, only as an empty result with progress messages.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::timeout;
use tracing::{debug, warn};

use rigour_core::{
    report_stage, CheckCategory, CoreError, CoreResult, DeepConfig, Failure, FailureMetadata,
    GateContext, ProgressEvent, ProgressFn,
};
use rigour_facts::{Fact, FactExtractor};
use rigour_llm::{analyze_options, build_provider, AnalyzeOptions, InferenceProvider};

use crate::chunker::{chunk_facts_with_budget, CHUNK_CHAR_BUDGET};
use crate::finding::{Finding, VerifiedFinding};
use crate::parser;
use crate::prompts::{render_batch, render_cross_file};
use crate::verifier;

/// Gate identifier stamped on every failure this gate produces.
pub const GATE_ID: &str = "deep-analysis";

/// Hard deadline on provider setup; beyond it the pass is skipped.
const SETUP_DEADLINE: Duration = Duration::from_secs(120);

/// Fact ceiling on large repositories; the largest files are kept.
const MAX_FACTS: usize = 500;

/// Character cap on synthesized failure titles.
const TITLE_MAX_CHARS: usize = 60;

/// Constructs one provider session per call. Injected so tests supply
/// mocks and multi-worker mode builds independent sessions.
pub type ProviderFactory =
    Arc<dyn Fn(&DeepConfig) -> CoreResult<Box<dyn InferenceProvider>> + Send + Sync>;

/// The LLM-backed deep analysis gate.
pub struct DeepAnalysisGate {
    factory: ProviderFactory,
    chunk_budget: usize,
}

impl Default for DeepAnalysisGate {
    fn default() -> Self {
        Self::new()
    }
}

impl DeepAnalysisGate {
    pub fn new() -> Self {
        Self::with_factory(Arc::new(build_provider))
    }

    pub fn with_factory(factory: ProviderFactory) -> Self {
        Self {
            factory,
            chunk_budget: CHUNK_CHAR_BUDGET,
        }
    }

    /// Override the per-chunk character budget.
    pub fn with_chunk_budget(mut self, budget: usize) -> Self {
        self.chunk_budget = budget;
        self
    }

    /// Run the deep pass. Always returns a (possibly empty) failure list;
    /// setup and analysis errors are reported through progress only.
    pub async fn run(
        &self,
        ctx: &GateContext,
        config: &DeepConfig,
        progress: ProgressFn,
    ) -> Vec<Failure> {
        if !config.enabled {
            return Vec::new();
        }

        // Setup, under a hard deadline
        let mut provider = match (self.factory)(config) {
            Ok(provider) => provider,
            Err(err) => {
                warn!(error = %err, "provider construction failed");
                report_stage(&progress, format!("Deep analysis skipped: {err}"));
                return Vec::new();
            }
        };
        report_stage(&progress, format!("Setting up {} provider", provider.name()));
        match timeout(SETUP_DEADLINE, provider.setup(progress.clone())).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(error = %err, "provider setup failed");
                report_stage(&progress, format!("Deep analysis skipped: {err}"));
                provider.dispose().await;
                return Vec::new();
            }
            Err(_) => {
                warn!("provider setup deadline elapsed");
                report_stage(&progress, "Deep analysis skipped: setup timed out");
                provider.dispose().await;
                return Vec::new();
            }
        }

        // Extraction
        report_stage(&progress, "Extracting structural facts");
        let mut facts = FactExtractor::new().extract(&ctx.root, &ctx.ignore_patterns);
        if let Some(filter) = &ctx.file_filter {
            facts.retain(|fact| {
                filter
                    .iter()
                    .any(|want| fact.file == *want || fact.file.ends_with(want.as_str()))
            });
        }
        if facts.is_empty() {
            report_stage(&progress, "No analyzable files found");
            provider.dispose().await;
            return Vec::new();
        }
        cap_facts(&mut facts);

        let options = analyze_options(config);
        let checks = config.enabled_checks();
        let chunks = chunk_facts_with_budget(&facts, self.chunk_budget);
        let total_chunks = chunks.len();
        report_stage(
            &progress,
            format!("Analyzing {} files in {} chunks", facts.len(), total_chunks),
        );

        // Chunked analysis: multi-worker only for cloud vendors
        let (mut findings, failed_chunks, mut sessions) =
            if config.uses_cloud() && config.workers > 1 {
                self.run_parallel(provider, chunks, &checks, &options, config, &progress)
                    .await
            } else {
                let (findings, failed) =
                    run_sequential(provider.as_ref(), &chunks, &checks, &options, &progress)
                        .await;
                (findings, failed, vec![provider])
            };
        report_stage(
            &progress,
            format!("Chunk analysis complete: {failed_chunks} of {total_chunks} chunks failed"),
        );

        // Cross-file pass; failure is logged and ignored
        if facts.len() >= 3 && failed_chunks < total_chunks {
            report_stage(&progress, "Running cross-file analysis");
            let prompt = render_cross_file(&facts);
            match analyze_once(sessions[0].as_ref(), &prompt, &options).await {
                Ok(mut cross) => findings.append(&mut cross),
                Err(err) => warn!(error = %err, "cross-file analysis failed"),
            }
        }

        for session in sessions.iter_mut() {
            session.dispose().await;
        }

        // Verification
        let claimed = findings.len();
        let verified = verifier::verify(findings, &facts);
        report_stage(
            &progress,
            format!(
                "Verified {} of {} findings ({} dropped)",
                verified.len(),
                claimed,
                claimed - verified.len()
            ),
        );

        verified.into_iter().map(to_failure).collect()
    }

    /// Round-robin the chunks over independently constructed sessions.
    /// Every worker settles before aggregation; results are re-ordered by
    /// chunk index so output is independent of completion timing.
    async fn run_parallel(
        &self,
        first: Box<dyn InferenceProvider>,
        chunks: Vec<Vec<Fact>>,
        checks: &[CheckCategory],
        options: &AnalyzeOptions,
        config: &DeepConfig,
        progress: &ProgressFn,
    ) -> (Vec<Finding>, usize, Vec<Box<dyn InferenceProvider>>) {
        let workers = config.workers.min(chunks.len()).max(1);
        let buckets = round_robin(chunks, workers);

        let mut sessions: Vec<Option<Box<dyn InferenceProvider>>> = vec![Some(first)];
        for _ in 1..workers {
            let session = match (self.factory)(config) {
                Ok(mut session) => match session.setup(progress.clone()).await {
                    Ok(()) => Some(session),
                    Err(err) => {
                        warn!(error = %err, "worker setup failed");
                        session.dispose().await;
                        None
                    }
                },
                Err(err) => {
                    warn!(error = %err, "worker construction failed");
                    None
                }
            };
            sessions.push(session);
        }

        let tasks = sessions
            .into_iter()
            .zip(buckets)
            .enumerate()
            .map(|(worker, (session, bucket))| {
                let checks = checks.to_vec();
                let options = options.clone();
                let progress = progress.clone();
                async move {
                    let Some(session) = session else {
                        // Whole bucket attributed to the dead worker
                        return (Vec::new(), bucket.len(), None);
                    };
                    let total = bucket.len();
                    let mut results: Vec<(usize, Vec<Finding>)> = Vec::new();
                    let mut failed = 0usize;
                    for (done, (chunk_idx, chunk)) in bucket.into_iter().enumerate() {
                        let prompt = render_batch(&chunk, &checks);
                        match analyze_once(session.as_ref(), &prompt, &options).await {
                            Ok(findings) => results.push((chunk_idx, findings)),
                            Err(err) => {
                                warn!(worker, chunk = chunk_idx, error = %err, "chunk analysis failed");
                                failed += 1;
                            }
                        }
                        progress(ProgressEvent::Worker {
                            worker,
                            completed: done + 1,
                            total,
                        });
                    }
                    (results, failed, Some(session))
                }
            });

        let mut keyed: Vec<(usize, Vec<Finding>)> = Vec::new();
        let mut failed_total = 0usize;
        let mut survivors = Vec::new();
        for (results, failed, session) in join_all(tasks).await {
            keyed.extend(results);
            failed_total += failed;
            if let Some(session) = session {
                survivors.push(session);
            }
        }
        keyed.sort_by_key(|(idx, _)| *idx);
        let findings = keyed.into_iter().flat_map(|(_, f)| f).collect();
        (findings, failed_total, survivors)
    }
}

/// Process chunks strictly in order on one session.
async fn run_sequential(
    provider: &dyn InferenceProvider,
    chunks: &[Vec<Fact>],
    checks: &[CheckCategory],
    options: &AnalyzeOptions,
    progress: &ProgressFn,
) -> (Vec<Finding>, usize) {
    let total = chunks.len();
    let mut findings = Vec::new();
    let mut failed = 0usize;
    for (idx, chunk) in chunks.iter().enumerate() {
        let prompt = render_batch(chunk, checks);
        match analyze_once(provider, &prompt, options).await {
            Ok(mut chunk_findings) => findings.append(&mut chunk_findings),
            Err(err) => {
                warn!(chunk = idx, error = %err, "chunk analysis failed");
                failed += 1;
            }
        }
        progress(ProgressEvent::Chunk {
            completed: idx + 1,
            total,
            failed,
        });
    }
    (findings, failed)
}

/// One analyze call plus tolerant parsing. A response no parser strategy
/// accepts counts as a failed call.
async fn analyze_once(
    provider: &dyn InferenceProvider,
    prompt: &str,
    options: &AnalyzeOptions,
) -> CoreResult<Vec<Finding>> {
    let raw = provider.analyze(prompt, options).await?;
    parser::parse(&raw)
        .ok_or_else(|| CoreError::parse("response matched no parser strategy"))
}

/// Keep the largest files when the fact count exceeds the ceiling; large
/// files are statistically likelier to hold the issues this pass targets.
fn cap_facts(facts: &mut Vec<Fact>) {
    if facts.len() <= MAX_FACTS {
        return;
    }
    debug!(total = facts.len(), kept = MAX_FACTS, "capping fact set");
    facts.sort_by(|a, b| b.line_count.cmp(&a.line_count));
    facts.truncate(MAX_FACTS);
    facts.sort_by(|a, b| a.file.cmp(&b.file));
}

/// Deterministic assignment: item *i* goes to bucket *i mod workers*.
fn round_robin<T>(items: Vec<T>, workers: usize) -> Vec<Vec<(usize, T)>> {
    let mut buckets: Vec<Vec<(usize, T)>> = (0..workers).map(|_| Vec::new()).collect();
    for (idx, item) in items.into_iter().enumerate() {
        buckets[idx % workers].push((idx, item));
    }
    buckets
}

fn to_failure(verified: VerifiedFinding) -> Failure {
    let finding = verified.finding;
    Failure {
        gate: GATE_ID.to_string(),
        title: synthesize_title(&finding.category, &finding.description),
        message: finding.description,
        files: vec![finding.file],
        line: finding.line,
        suggestion: finding.suggestion,
        severity: finding.severity,
        metadata: FailureMetadata {
            confidence: finding.confidence,
            verified: verified.verified,
            category: finding.category,
        },
    }
}

fn synthesize_title(category: &str, description: &str) -> String {
    let mut short: String = description.chars().take(TITLE_MAX_CHARS).collect();
    if description.chars().count() > TITLE_MAX_CHARS {
        short.push_str("...");
    }
    format!("{category}: {short}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rigour_core::Severity;
    use rigour_facts::{Language, QualityMetrics};
    use rigour_llm::{ProviderError, ProviderResult};
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted provider: pops one canned result per analyze call.
    struct MockProvider {
        fail_setup: bool,
        responses: Arc<Mutex<VecDeque<ProviderResult<String>>>>,
        disposed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl InferenceProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn setup(&mut self, _on_progress: ProgressFn) -> ProviderResult<()> {
            if self.fail_setup {
                Err(ProviderError::Setup("mock setup failure".to_string()))
            } else {
                Ok(())
            }
        }

        async fn analyze(
            &self,
            _prompt: &str,
            _options: &AnalyzeOptions,
        ) -> ProviderResult<String> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::EmptyResponse))
        }

        async fn dispose(&mut self) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockHarness {
        responses: Arc<Mutex<VecDeque<ProviderResult<String>>>>,
        disposed: Arc<AtomicUsize>,
        constructed: Arc<AtomicUsize>,
        /// Sessions at or past this construction index fail `setup`
        fail_setup_from: usize,
    }

    impl MockHarness {
        fn new(responses: Vec<ProviderResult<String>>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into_iter().collect())),
                disposed: Arc::new(AtomicUsize::new(0)),
                constructed: Arc::new(AtomicUsize::new(0)),
                fail_setup_from: usize::MAX,
            }
        }

        fn failing_setup() -> Self {
            let mut harness = Self::new(Vec::new());
            harness.fail_setup_from = 0;
            harness
        }

        fn failing_worker_setup(responses: Vec<ProviderResult<String>>) -> Self {
            let mut harness = Self::new(responses);
            harness.fail_setup_from = 1;
            harness
        }

        fn factory(&self) -> ProviderFactory {
            let responses = self.responses.clone();
            let disposed = self.disposed.clone();
            let constructed = self.constructed.clone();
            let fail_setup_from = self.fail_setup_from;
            Arc::new(move |_config| {
                let index = constructed.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MockProvider {
                    fail_setup: index >= fail_setup_from,
                    responses: responses.clone(),
                    disposed: disposed.clone(),
                }))
            })
        }
    }

    fn collecting_progress() -> (ProgressFn, Arc<Mutex<Vec<ProgressEvent>>>) {
        let seen: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(move |event| {
            sink.lock().unwrap().push(event);
        });
        (progress, seen)
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn finding_json(file: &str, description: &str) -> String {
        format!(
            r#"{{"findings": [{{"category": "complexity", "severity": "high",
                "file": "{file}", "description": "{description}", "confidence": 0.9}}]}}"#
        )
    }

    const EMPTY_FINDINGS: &str = r#"{"findings": []}"#;

    fn enabled_config() -> DeepConfig {
        let mut config = DeepConfig::default();
        config.enabled = true;
        config
    }

    fn synthetic_fact(file: &str, line_count: u32) -> Fact {
        Fact {
            file: file.to_string(),
            language: Language::Rust,
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

    #[test]
    fn test_round_robin_is_deterministic() {
        let buckets = round_robin((0..7).collect::<Vec<_>>(), 3);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0], vec![(0, 0), (3, 3), (6, 6)]);
        assert_eq!(buckets[1], vec![(1, 1), (4, 4)]);
        assert_eq!(buckets[2], vec![(2, 2), (5, 5)]);
    }

    #[test]
    fn test_cap_keeps_largest_files() {
        let mut facts: Vec<Fact> = (0..MAX_FACTS + 50)
            .map(|i| synthetic_fact(&format!("f{i:04}.rs"), i as u32))
            .collect();
        cap_facts(&mut facts);
        assert_eq!(facts.len(), MAX_FACTS);
        // The 50 smallest were dropped
        assert!(facts.iter().all(|f| f.line_count >= 50));
        // Re-sorted by path for determinism
        assert!(facts.windows(2).all(|w| w[0].file < w[1].file));
    }

    #[test]
    fn test_synthesize_title_truncates() {
        let long = "a".repeat(200);
        let title = synthesize_title("complexity", &long);
        assert!(title.starts_with("complexity: "));
        assert!(title.len() < 90);
        assert!(title.ends_with("..."));

        assert_eq!(synthesize_title("naming", "short"), "naming: short");
    }

    #[tokio::test]
    async fn test_disabled_config_is_a_no_op() {
        let harness = MockHarness::new(Vec::new());
        let gate = DeepAnalysisGate::with_factory(harness.factory());
        let ctx = GateContext::new("/nonexistent");
        let failures = gate
            .run(&ctx, &DeepConfig::default(), rigour_core::noop_progress())
            .await;
        assert!(failures.is_empty());
    }

    // Complex function in a real project tree produces a verified failure
    #[tokio::test]
    async fn test_verified_finding_survives_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let mut big = String::from("export function processEverything(a, b) {\n");
        for i in 0..50 {
            big.push_str(&format!("  if (a > {i}) {{ b += {i}; }}\n"));
        }
        big.push_str("  return b;\n}\n");
        write(tmp.path(), "src/big.ts", &big);
        for i in 0..9 {
            write(
                tmp.path(),
                &format!("src/mod{i}.ts"),
                "export const a = 1;\nconst b = 2;\nconst c = 3;\n",
            );
        }

        let harness = MockHarness::new(vec![
            Ok(finding_json(
                "src/big.ts",
                "`processEverything` is oversized and deeply branched",
            )),
            Ok(EMPTY_FINDINGS.to_string()),
        ]);
        let gate = DeepAnalysisGate::with_factory(harness.factory());
        let ctx = GateContext::new(tmp.path());
        let failures = gate
            .run(&ctx, &enabled_config(), rigour_core::noop_progress())
            .await;

        assert_eq!(failures.len(), 1);
        let failure = &failures[0];
        assert_eq!(failure.gate, GATE_ID);
        assert_eq!(failure.files, vec!["src/big.ts".to_string()]);
        assert_eq!(failure.severity, Severity::High);
        assert!(failure.title.starts_with("complexity: "));
        assert!(failure.metadata.verified);
        assert_eq!(harness.disposed.load(Ordering::SeqCst), 1);
    }

    // Setup failure: empty result, no panic, provider still disposed
    #[tokio::test]
    async fn test_setup_failure_returns_empty() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.ts", "const a = 1;\nconst b = 2;\nconst c = 3;\n");

        let harness = MockHarness::failing_setup();
        let gate = DeepAnalysisGate::with_factory(harness.factory());
        let ctx = GateContext::new(tmp.path());
        let (progress, seen) = collecting_progress();
        let failures = gate.run(&ctx, &enabled_config(), progress).await;

        assert!(failures.is_empty());
        assert_eq!(harness.disposed.load(Ordering::SeqCst), 1);
        let events = seen.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            ProgressEvent::Stage { message } if message.contains("skipped")
        )));
    }

    // 2 of 5 chunks fail: findings from the other 3 survive, counter == 2
    #[tokio::test]
    async fn test_partial_chunk_failures_keep_going() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..5 {
            write(
                tmp.path(),
                &format!("f{i}.ts"),
                "export const a = 1;\nconst b = 2;\nconst c = 3;\n",
            );
        }

        let harness = MockHarness::new(vec![
            Ok(finding_json("f0.ts", "issue zero")),
            Err(ProviderError::Timeout(Duration::from_secs(1))),
            Ok(finding_json("f2.ts", "issue two")),
            Err(ProviderError::Network("connection reset".to_string())),
            Ok(finding_json("f4.ts", "issue four")),
            Ok(EMPTY_FINDINGS.to_string()),
        ]);
        // Budget of 1 forces one chunk per file
        let gate = DeepAnalysisGate::with_factory(harness.factory()).with_chunk_budget(1);
        let ctx = GateContext::new(tmp.path());
        let (progress, seen) = collecting_progress();
        let failures = gate.run(&ctx, &enabled_config(), progress).await;

        assert_eq!(failures.len(), 3);
        let files: Vec<&str> = failures.iter().map(|f| f.files[0].as_str()).collect();
        assert_eq!(files, vec!["f0.ts", "f2.ts", "f4.ts"]);

        let events = seen.lock().unwrap();
        let last_chunk = events
            .iter()
            .rev()
            .find_map(|e| match e {
                ProgressEvent::Chunk {
                    completed,
                    total,
                    failed,
                } => Some((*completed, *total, *failed)),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_chunk, (5, 5, 2));
    }

    // All chunks fail: no cross-file call is attempted
    #[tokio::test]
    async fn test_all_chunks_failed_skips_cross_file() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..3 {
            write(
                tmp.path(),
                &format!("f{i}.ts"),
                "export const a = 1;\nconst b = 2;\nconst c = 3;\n",
            );
        }

        let harness = MockHarness::new(vec![
            Err(ProviderError::EmptyResponse),
            Err(ProviderError::EmptyResponse),
            Err(ProviderError::EmptyResponse),
        ]);
        let gate = DeepAnalysisGate::with_factory(harness.factory()).with_chunk_budget(1);
        let ctx = GateContext::new(tmp.path());
        let failures = gate
            .run(&ctx, &enabled_config(), rigour_core::noop_progress())
            .await;

        assert!(failures.is_empty());
        // Every queued response was an analyze result; none left means no
        // extra cross-file call was made against an empty queue (which
        // would not fail, but would be observable as a fourth pop).
        assert!(harness.responses.lock().unwrap().is_empty());
    }

    // An unparseable response counts as a chunk failure
    #[tokio::test]
    async fn test_unparseable_response_is_a_chunk_failure() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.ts", "const a = 1;\nconst b = 2;\nconst c = 3;\n");

        let harness = MockHarness::new(vec![Ok("no JSON here, sorry".to_string())]);
        let gate = DeepAnalysisGate::with_factory(harness.factory());
        let ctx = GateContext::new(tmp.path());
        let (progress, seen) = collecting_progress();
        let failures = gate.run(&ctx, &enabled_config(), progress).await;

        assert!(failures.is_empty());
        let events = seen.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            ProgressEvent::Chunk { failed: 1, .. }
        )));
    }

    // Multi-worker mode: cloud config with workers=2 runs to completion
    // and emits ticks for both workers
    #[tokio::test]
    async fn test_multi_worker_run() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..4 {
            write(
                tmp.path(),
                &format!("f{i}.ts"),
                "export const a = 1;\nconst b = 2;\nconst c = 3;\n",
            );
        }

        let harness = MockHarness::new(vec![
            Ok(EMPTY_FINDINGS.to_string()),
            Ok(EMPTY_FINDINGS.to_string()),
            Ok(EMPTY_FINDINGS.to_string()),
            Ok(EMPTY_FINDINGS.to_string()),
            Ok(EMPTY_FINDINGS.to_string()),
        ]);
        let gate = DeepAnalysisGate::with_factory(harness.factory()).with_chunk_budget(1);
        let ctx = GateContext::new(tmp.path());
        let mut config = enabled_config();
        config.vendor = Some("mock".to_string());
        config.workers = 2;
        let (progress, seen) = collecting_progress();
        let failures = gate.run(&ctx, &config, progress).await;

        assert!(failures.is_empty());
        // Both provider sessions were disposed
        assert_eq!(harness.disposed.load(Ordering::SeqCst), 2);
        let events = seen.lock().unwrap();
        let workers_seen: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Worker { worker, .. } => Some(*worker),
                _ => None,
            })
            .collect();
        assert!(workers_seen.contains(&0));
        assert!(workers_seen.contains(&1));
    }

    // A worker whose setup fails loses its whole bucket and is still
    // disposed before being discarded
    #[tokio::test]
    async fn test_failed_worker_session_is_disposed_and_bucket_counted() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..4 {
            write(
                tmp.path(),
                &format!("f{i}.ts"),
                "export const a = 1;\nconst b = 2;\nconst c = 3;\n",
            );
        }

        // Worker 0 serves chunks 0 and 2, then the cross-file call
        let harness = MockHarness::failing_worker_setup(vec![
            Ok(EMPTY_FINDINGS.to_string()),
            Ok(EMPTY_FINDINGS.to_string()),
            Ok(EMPTY_FINDINGS.to_string()),
        ]);
        let gate = DeepAnalysisGate::with_factory(harness.factory()).with_chunk_budget(1);
        let ctx = GateContext::new(tmp.path());
        let mut config = enabled_config();
        config.vendor = Some("mock".to_string());
        config.workers = 2;
        let (progress, seen) = collecting_progress();
        let failures = gate.run(&ctx, &config, progress).await;

        assert!(failures.is_empty());
        // Worker 1's bucket (chunks 1 and 3) is attributed to the failure
        // counter in full
        let events = seen.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            ProgressEvent::Stage { message } if message.contains("2 of 4 chunks failed")
        )));
        // Both the working session and the failed one were disposed
        assert_eq!(harness.disposed.load(Ordering::SeqCst), 2);
        assert!(harness.responses.lock().unwrap().is_empty());
    }

    // File filter narrows the fact set before analysis
    #[tokio::test]
    async fn test_file_filter_restricts_extraction() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "keep.ts", "const a = 1;\nconst b = 2;\nconst c = 3;\n");
        write(tmp.path(), "skip.ts", "const a = 1;\nconst b = 2;\nconst c = 3;\n");

        // One chunk (only keep.ts); fewer than 3 facts so no cross-file call
        let harness = MockHarness::new(vec![Ok(finding_json("keep.ts", "only file"))]);
        let gate = DeepAnalysisGate::with_factory(harness.factory());
        let mut ctx = GateContext::new(tmp.path());
        ctx.file_filter = Some(vec!["keep.ts".to_string()]);
        let failures = gate
            .run(&ctx, &enabled_config(), rigour_core::noop_progress())
            .await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].files, vec!["keep.ts".to_string()]);
        assert!(harness.responses.lock().unwrap().is_empty());
    }
}
