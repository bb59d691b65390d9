//! Rigour Core
//!
//! Foundational types for the Rigour quality gate engine. This crate has no
//! dependencies on provider or pipeline code and is consumed by every other
//! crate in the workspace.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `gate` - Gate framework records (`GateContext`, `Failure`, `Severity`)
//! - `config` - Deep analysis run options (`DeepConfig`, `CheckCategory`)
//! - `progress` - Progress event types and callback alias
//! - `paths` - Default per-user cache/install directories

pub mod config;
pub mod error;
pub mod gate;
pub mod paths;
pub mod progress;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Gate Framework Records ─────────────────────────────────────────────
pub use gate::{Failure, FailureMetadata, GateContext, Severity};

// ── Configuration ──────────────────────────────────────────────────────
pub use config::{CheckCategory, DeepConfig};

// ── Progress Reporting ─────────────────────────────────────────────────
pub use progress::{noop_progress, report_stage, ProgressEvent, ProgressFn};

// ── Path Utilities ─────────────────────────────────────────────────────
pub use paths::{ensure_dir, home_dir, model_cache_dir, rigour_dir, sidecar_install_dir};
