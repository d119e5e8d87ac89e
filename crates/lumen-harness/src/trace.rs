#![forbid(unsafe_code)]

//! Journal traces.
//!
//! A trace is the mutation journal of a run, chunked by the clock time at
//! which it was drained. Traces serialize to JSONL (one mutation per line,
//! tagged with `t_us`) and hash to a stable `blake3:<hex>` digest, so two
//! runs can be compared for determinism without keeping full transcripts.

use lumen_core::document::Mutation;
use web_time::Duration;

use crate::harness::PageHarness;

/// Digest of a mutation sequence.
#[must_use]
pub fn journal_digest(mutations: &[Mutation]) -> String {
    let mut hasher = blake3::Hasher::new();
    for mutation in mutations {
        hash_line(&mut hasher, mutation);
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}

fn hash_line(hasher: &mut blake3::Hasher, mutation: &Mutation) {
    // Mutations are plain data; encoding cannot fail.
    let line = serde_json::to_string(mutation).unwrap_or_default();
    hasher.update(line.as_bytes());
    hasher.update(b"\n");
}

/// Time-stamped mutation journal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalTrace {
    entries: Vec<(Duration, Mutation)>,
}

impl JournalTrace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the harness journal and stamp it with the current time.
    pub fn capture(&mut self, harness: &mut PageHarness) -> usize {
        let now = harness.now();
        let drained = harness.take_journal();
        let count = drained.len();
        self.entries.extend(drained.into_iter().map(|m| (now, m)));
        count
    }

    pub fn push(&mut self, at: Duration, mutation: Mutation) {
        self.entries.push((at, mutation));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mutations(&self) -> impl Iterator<Item = &Mutation> {
        self.entries.iter().map(|(_, m)| m)
    }

    /// Mutations stamped `at`.
    pub fn at(&self, at: Duration) -> impl Iterator<Item = &Mutation> {
        self.entries
            .iter()
            .filter(move |(t, _)| *t == at)
            .map(|(_, m)| m)
    }

    /// One JSON object per mutation: the mutation's fields plus `t_us`.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for (at, mutation) in &self.entries {
            let mut value = serde_json::to_value(mutation).unwrap_or_default();
            if let Some(object) = value.as_object_mut() {
                let t_us = u64::try_from(at.as_micros()).unwrap_or(u64::MAX);
                object.insert("t_us".to_string(), t_us.into());
            }
            out.push_str(&value.to_string());
            out.push('\n');
        }
        out
    }

    /// Digest over times and mutations.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (at, mutation) in &self.entries {
            hasher.update(&at.as_micros().to_le_bytes());
            hash_line(&mut hasher, mutation);
        }
        format!("blake3:{}", hasher.finalize().to_hex())
    }
}
