//! Chunker
//!
//! Partitions the fact set into character-budgeted batches. The budget is
//! checked after each append, so a chunk may overflow by at most one
//! file's worth of serialization before it is sealed.

use rigour_facts::Fact;

use crate::prompts::serialize_fact;

/// Default per-chunk character budget for serialized facts.
pub const CHUNK_CHAR_BUDGET: usize = 24_000;

/// Partition facts into ordered chunks under the default budget.
pub fn chunk_facts(facts: &[Fact]) -> Vec<Vec<Fact>> {
    chunk_facts_with_budget(facts, CHUNK_CHAR_BUDGET)
}

/// Partition facts into ordered chunks under an explicit budget.
pub fn chunk_facts_with_budget(facts: &[Fact], budget: usize) -> Vec<Vec<Fact>> {
    let mut chunks: Vec<Vec<Fact>> = Vec::new();
    let mut current: Vec<Fact> = Vec::new();
    let mut used = 0usize;

    for fact in facts {
        used += serialize_fact(fact).len();
        current.push(fact.clone());
        if used >= budget {
            chunks.push(std::mem::take(&mut current));
            used = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
