//! Deduplication ranker
//!
//! Records describing the same real-world asset arrive across independent
//! ingestion sessions. [`DedupRanker::group_duplicates`] buckets them by a
//! caller-supplied dedup key and [`DedupRanker::select_canonical`] picks
//! exactly one winner per group under a closed set of strategies.
//!
//! Selection is deterministic: candidates are sorted by a stable key before
//! any comparison, so identical inputs yield identical winners regardless of
//! arrival order.

use crate::error::{Error, Result};
use crate::record::CandidateRecord;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::warn;

/// Closed set of canonical-selection strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    /// Highest recency marker wins
    Recency,
    /// Most complete attribute bag wins
    Quality,
    /// Defers to an external adjudicator, falling back to Quality
    Learned,
}

/// External adjudication signal for the Learned strategy.
///
/// Implementations typically consult the pattern learning store or a human
/// decision log. Returning `None` means no adjudication is available and the
/// ranker falls back to Quality.
pub trait Adjudicator: Send + Sync {
    /// Index of the preferred candidate within the (stably sorted) slice
    fn adjudicate(&self, key: &str, candidates: &[CandidateRecord]) -> Option<usize>;
}

/// All candidates sharing one dedup key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCandidateSet {
    pub key: String,
    pub candidates: Vec<CandidateRecord>,
}

impl DuplicateCandidateSet {
    /// Number of distinct ingestion sessions represented in this group
    pub fn session_count(&self) -> usize {
        let sessions: AHashSet<&str> = self
            .candidates
            .iter()
            .map(|c| c.session_id.as_str())
            .collect();
        sessions.len()
    }
}

/// The canonical record chosen for one dedup key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalSelection {
    pub key: String,
    pub winner: CandidateRecord,
    pub strategy_used: DedupStrategy,
    pub tie_break_reason: String,
}

/// Summary of one grouping pass, for the reporting collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupReport {
    /// Records supplied to the grouping pass
    pub total_records: usize,
    /// Groups with more than one member
    pub duplicate_groups: usize,
    /// Fraction of usable records that sit in a duplicate group
    pub duplicate_ratio: f32,
    /// Distinct ingestion sessions across all usable records
    pub session_count: usize,
    /// Records excluded for missing or empty dedup keys
    pub excluded_records: usize,
}

/// Result of grouping: the duplicate sets plus the pass summary
#[derive(Debug, Clone)]
pub struct Grouping {
    pub sets: Vec<DuplicateCandidateSet>,
    pub report: DedupReport,
}

/// Groups duplicate candidates and selects canonical records
#[derive(Default, Clone)]
pub struct DedupRanker {
    adjudicator: Option<Arc<dyn Adjudicator>>,
}

impl DedupRanker {
    pub fn new() -> Self {
        Self { adjudicator: None }
    }

    pub fn with_adjudicator(adjudicator: Arc<dyn Adjudicator>) -> Self {
        Self {
            adjudicator: Some(adjudicator),
        }
    }

    /// Group records by dedup key, keeping only groups with more than one
    /// member.
    ///
    /// Records whose extractor yields no key (or an empty one) are excluded
    /// with a data-quality warning; they never fail the batch.
    pub fn group_duplicates<F>(&self, records: Vec<CandidateRecord>, key_fn: F) -> Grouping
    where
        F: Fn(&CandidateRecord) -> Option<String>,
    {
        let total_records = records.len();
        let mut excluded_records = 0usize;
        let mut sessions: AHashSet<String> = AHashSet::new();
        let mut groups: AHashMap<String, Vec<CandidateRecord>> = AHashMap::new();

        for record in records {
            let key = match key_fn(&record) {
                Some(k) if !k.trim().is_empty() => k,
                _ => {
                    warn!(
                        session = %record.session_id,
                        "record excluded from dedup grouping: missing or empty key"
                    );
                    excluded_records += 1;
                    continue;
                }
            };
            sessions.insert(record.session_id.clone());
            groups.entry(key).or_default().push(record);
        }

        let usable = total_records - excluded_records;
        let mut sets: Vec<DuplicateCandidateSet> = groups
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(key, mut candidates)| {
                candidates.sort_by(stable_order);
                DuplicateCandidateSet { key, candidates }
            })
            .collect();
        sets.sort_by(|a, b| a.key.cmp(&b.key));

        let duplicated: usize = sets.iter().map(|s| s.candidates.len()).sum();
        let duplicate_groups = sets.len();
        let duplicate_ratio = if usable == 0 {
            0.0
        } else {
            duplicated as f32 / usable as f32
        };

        Grouping {
            sets,
            report: DedupReport {
                total_records,
                duplicate_groups,
                duplicate_ratio,
                session_count: sessions.len(),
                excluded_records,
            },
        }
    }

    /// Select exactly one canonical record for a duplicate group
    pub fn select_canonical(
        &self,
        set: &DuplicateCandidateSet,
        strategy: DedupStrategy,
    ) -> Result<CanonicalSelection> {
        if set.candidates.is_empty() {
            return Err(Error::EmptyCandidateSet(set.key.clone()));
        }

        let mut candidates = set.candidates.clone();
        candidates.sort_by(stable_order);

        if candidates.len() == 1 {
            return Ok(CanonicalSelection {
                key: set.key.clone(),
                winner: candidates.remove(0),
                strategy_used: strategy,
                tie_break_reason: "sole candidate".to_string(),
            });
        }

        let (index, tie_break_reason) = match strategy {
            DedupStrategy::Recency => select_by_recency(&candidates),
            DedupStrategy::Quality => select_by_quality(&candidates),
            DedupStrategy::Learned => {
                let adjudicated = self
                    .adjudicator
                    .as_ref()
                    .and_then(|a| a.adjudicate(&set.key, &candidates))
                    .filter(|i| *i < candidates.len());
                match adjudicated {
                    Some(i) => (i, "external adjudication".to_string()),
                    None => {
                        let (i, reason) = select_by_quality(&candidates);
                        (i, format!("no adjudication available; {}", reason))
                    }
                }
            }
        };

        Ok(CanonicalSelection {
            key: set.key.clone(),
            winner: candidates.swap_remove(index),
            strategy_used: strategy,
            tie_break_reason,
        })
    }
}

/// Stable total order over candidates, independent of arrival order
fn stable_order(a: &CandidateRecord, b: &CandidateRecord) -> Ordering {
    a.session_id
        .cmp(&b.session_id)
        .then(a.recency.cmp(&b.recency))
        .then(a.raw_key.cmp(&b.raw_key))
}

/// Recency first, then longer (more specific) raw key, then completeness
fn select_by_recency(candidates: &[CandidateRecord]) -> (usize, String) {
    let mut best = 0usize;
    let mut reason = "highest recency marker";
    for (i, c) in candidates.iter().enumerate().skip(1) {
        let b = &candidates[best];
        match c.recency.cmp(&b.recency) {
            Ordering::Greater => {
                best = i;
                reason = "highest recency marker";
            }
            Ordering::Equal => match c.raw_key.len().cmp(&b.raw_key.len()) {
                Ordering::Greater => {
                    best = i;
                    reason = "recency tie broken by more specific key value";
                }
                Ordering::Equal => {
                    if c.non_null_attributes() > b.non_null_attributes() {
                        best = i;
                        reason = "recency and key tie broken by attribute completeness";
                    }
                }
                Ordering::Less => {}
            },
            Ordering::Less => {}
        }
    }
    (best, reason.to_string())
}

/// Completeness first, then recency
fn select_by_quality(candidates: &[CandidateRecord]) -> (usize, String) {
    let mut best = 0usize;
    let mut reason = "most complete attribute bag";
    for (i, c) in candidates.iter().enumerate().skip(1) {
        let b = &candidates[best];
        match c.non_null_attributes().cmp(&b.non_null_attributes()) {
            Ordering::Greater => {
                best = i;
                reason = "most complete attribute bag";
            }
            Ordering::Equal => {
                if c.recency > b.recency {
                    best = i;
                    reason = "completeness tie broken by recency";
                }
            }
            Ordering::Less => {}
        }
    }
    (best, reason.to_string())
}
