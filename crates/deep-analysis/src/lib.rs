//! Rigour Deep Analysis
//!
//! The fact-grounded LLM analysis gate: extract structural facts, batch
//! them into prompts, run them through an inference provider, salvage
//! whatever JSON the model returns, and keep only findings that the facts
//! corroborate.
//!
//! ## Module Organization
//!
//! - `gate` - The `DeepAnalysisGate` orchestrator
//! - `chunker` - Character-budgeted fact batching
//! - `prompts` - Per-chunk and cross-file prompt rendering
//! - `parser` - Tolerant response parsing and validation
//! - `verifier` - Corroboration of findings against facts
//! - `finding` - `Finding` / `VerifiedFinding` records

pub mod chunker;
pub mod finding;
pub mod gate;
pub mod parser;
pub mod prompts;
pub mod verifier;

// ── Orchestrator ──
pub use gate::{DeepAnalysisGate, ProviderFactory, GATE_ID};

// ── Finding model ──
pub use finding::{Finding, VerifiedFinding};

// ── Pipeline pieces, exposed for hosts that compose their own runs ──
pub use chunker::{chunk_facts, chunk_facts_with_budget, CHUNK_CHAR_BUDGET};
pub use parser::parse;
pub use prompts::{render_batch, render_cross_file, serialize_fact};
pub use verifier::verify;
