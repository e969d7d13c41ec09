//! In-memory pattern store with optimistic versioning
//!
//! The store is the only shared mutable state in the engine. Reads are
//! unrestricted and concurrent; every write is an optimistic
//! read-modify-write keyed by `(tenant_id, signature)` and checked against
//! the stored `version`. A conflicting writer retries against a fresh read
//! up to [`StoreConfig::max_write_retries`] times, then reports the loss as
//! a warning instead of an error - learning is best-effort, never
//! correctness-critical.

use crate::pattern::{FieldSignature, LearnOutcome, LearnedPattern, MappingOutcome};
use ahash::AHashMap;
use chrono::Utc;
use parking_lot::RwLock;
use reconx_similarity::{lexical_similarity, structural_similarity};
use tracing::{debug, warn};
use uuid::Uuid;

/// Tenant-configurable learning parameters.
///
/// The reinforcement threshold and nudge size are heuristics with no derived
/// ideal value, so they are knobs rather than constants.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Minimum signature similarity for retrieval hits
    pub min_retrieve_similarity: f32,
    /// Signature similarity at or above which acceptance reinforces
    /// neighboring patterns with the same target
    pub reinforce_threshold: f32,
    /// Upward confidence nudge applied to reinforced patterns
    pub reinforce_nudge: f32,
    /// Optimistic write retries before giving up
    pub max_write_retries: u32,
    /// Confidence bounds
    pub confidence_floor: f32,
    pub confidence_ceiling: f32,
    /// Confidence after the first acceptance / rejection of a signature
    pub initial_accept_confidence: f32,
    pub initial_reject_confidence: f32,
    /// Weight kept from the previous confidence on each recompute
    pub decay: f32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            min_retrieve_similarity: 0.5,
            reinforce_threshold: 0.7,
            reinforce_nudge: 0.05,
            max_write_retries: 3,
            confidence_floor: 0.1,
            confidence_ceiling: 0.95,
            initial_accept_confidence: 0.8,
            initial_reject_confidence: 0.2,
            decay: 0.5,
        }
    }
}

/// Pattern store boundary: the only persisted state in the engine.
///
/// Both operations are idempotent-safe to retry.
pub trait PatternStore: Send + Sync {
    /// Nearest-signature retrieval, ranked by blended similarity and stored
    /// confidence. Retired patterns are skipped.
    fn retrieve(&self, tenant_id: &str, signature: &FieldSignature)
        -> Vec<(LearnedPattern, f32)>;

    /// Record a confirmed or rejected mapping and return the updated pattern
    fn learn(
        &self,
        tenant_id: &str,
        signature: &FieldSignature,
        target_field: &str,
        outcome: MappingOutcome,
    ) -> LearnOutcome;
}

type PatternKey = (String, String);

/// In-memory [`PatternStore`] backed by a read-write lock
#[derive(Default)]
pub struct InMemoryPatternStore {
    config: StoreConfig,
    patterns: RwLock<AHashMap<PatternKey, LearnedPattern>>,
}

impl InMemoryPatternStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            patterns: RwLock::new(AHashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of patterns stored for a tenant, retired ones included
    pub fn tenant_pattern_count(&self, tenant_id: &str) -> usize {
        self.patterns
            .read()
            .keys()
            .filter(|(t, _)| t.as_str() == tenant_id)
            .count()
    }

    fn signature_similarity(a: &FieldSignature, b: &FieldSignature) -> f32 {
        let lexical = lexical_similarity(&a.normalized_name, &b.normalized_name);
        let structural = structural_similarity(&a.normalized_name, &b.normalized_name);
        0.5 * lexical + 0.5 * structural
    }

    /// Apply one outcome to an existing pattern snapshot
    fn apply_outcome(&self, mut pattern: LearnedPattern, outcome: MappingOutcome) -> LearnedPattern {
        match outcome {
            MappingOutcome::Accepted => pattern.success_count += 1,
            MappingOutcome::Rejected => pattern.failure_count += 1,
        }
        pattern.confidence_score = self.recompute_confidence(
            pattern.success_count,
            pattern.failure_count,
            pattern.confidence_score,
        );
        if outcome == MappingOutcome::Rejected
            && pattern.confidence_score <= self.config.confidence_floor + f32::EPSILON
        {
            pattern.retired = true;
        }
        pattern.last_updated_at = Utc::now();
        pattern.version += 1;
        pattern
    }

    /// Decayed success ratio bounded to the configured range
    fn recompute_confidence(&self, success: u32, failure: u32, previous: f32) -> f32 {
        let total = success + failure;
        if total == 0 {
            return previous;
        }
        let ratio = success as f32 / total as f32;
        let blended = self.config.decay * previous + (1.0 - self.config.decay) * ratio;
        blended.clamp(self.config.confidence_floor, self.config.confidence_ceiling)
    }

    fn fresh_pattern(
        &self,
        tenant_id: &str,
        signature: &FieldSignature,
        target_field: &str,
        outcome: MappingOutcome,
    ) -> LearnedPattern {
        let (success, failure, confidence) = match outcome {
            MappingOutcome::Accepted => (1, 0, self.config.initial_accept_confidence),
            MappingOutcome::Rejected => (0, 1, self.config.initial_reject_confidence),
        };
        LearnedPattern {
            pattern_id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            signature: signature.clone(),
            target_field: target_field.to_string(),
            confidence_score: confidence,
            success_count: success,
            failure_count: failure,
            last_updated_at: Utc::now(),
            version: 1,
            retired: false,
        }
    }

    /// Nudge same-target neighbors of an accepted signature upward
    fn reinforce_neighbors(
        &self,
        tenant_id: &str,
        signature: &FieldSignature,
        target_field: &str,
        accepted_id: &str,
    ) {
        let mut guard = self.patterns.write();
        for ((tenant, _), pattern) in guard.iter_mut() {
            if tenant.as_str() != tenant_id
                || pattern.pattern_id == accepted_id
                || pattern.target_field != target_field
                || pattern.retired
            {
                continue;
            }
            let similarity = Self::signature_similarity(&pattern.signature, signature);
            if similarity < self.config.reinforce_threshold {
                continue;
            }
            let nudged = (pattern.confidence_score + self.config.reinforce_nudge)
                .min(self.config.confidence_ceiling);
            if nudged > pattern.confidence_score {
                debug!(
                    pattern = %pattern.pattern_id,
                    from = pattern.confidence_score,
                    to = nudged,
                    "reinforcing neighboring pattern"
                );
                pattern.confidence_score = nudged;
                pattern.last_updated_at = Utc::now();
                pattern.version += 1;
            }
        }
    }
}

impl PatternStore for InMemoryPatternStore {
    fn retrieve(
        &self,
        tenant_id: &str,
        signature: &FieldSignature,
    ) -> Vec<(LearnedPattern, f32)> {
        let guard = self.patterns.read();
        let mut hits: Vec<(LearnedPattern, f32)> = guard
            .iter()
            .filter(|((tenant, _), pattern)| tenant.as_str() == tenant_id && !pattern.retired)
            .filter_map(|(_, pattern)| {
                let similarity = Self::signature_similarity(&pattern.signature, signature);
                if similarity >= self.config.min_retrieve_similarity {
                    // Blend similarity with stored confidence into one rank
                    let effective = (similarity + pattern.confidence_score) / 2.0;
                    Some((pattern.clone(), effective))
                } else {
                    None
                }
            })
            .collect();
        drop(guard);

        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.pattern_id.cmp(&b.0.pattern_id))
        });
        hits
    }

    fn learn(
        &self,
        tenant_id: &str,
        signature: &FieldSignature,
        target_field: &str,
        outcome: MappingOutcome,
    ) -> LearnOutcome {
        let key: PatternKey = (tenant_id.to_string(), signature.key());

        let mut attempts = 0u32;
        let committed = loop {
            let snapshot = self.patterns.read().get(&key).cloned();
            let updated = match &snapshot {
                Some(existing) if existing.target_field == target_field => {
                    self.apply_outcome(existing.clone(), outcome)
                }
                Some(existing) => {
                    // Feedback naming a different target supersedes the stored
                    // association and starts a fresh history; the old target's
                    // counts and confidence must not carry over.
                    let mut pattern =
                        self.fresh_pattern(tenant_id, signature, target_field, outcome);
                    pattern.version = existing.version + 1;
                    pattern
                }
                None => self.fresh_pattern(tenant_id, signature, target_field, outcome),
            };

            let mut guard = self.patterns.write();
            let current_version = guard.get(&key).map(|p| p.version);
            let snapshot_version = snapshot.as_ref().map(|p| p.version);
            if current_version == snapshot_version {
                guard.insert(key.clone(), updated.clone());
                break Some(updated);
            }
            drop(guard);

            attempts += 1;
            if attempts > self.config.max_write_retries {
                warn!(
                    tenant = tenant_id,
                    signature = %signature,
                    "pattern not persisted: optimistic retries exhausted"
                );
                break None;
            }
        };

        match committed {
            Some(pattern) => {
                if outcome == MappingOutcome::Accepted {
                    self.reinforce_neighbors(
                        tenant_id,
                        signature,
                        target_field,
                        &pattern.pattern_id,
                    );
                }
                LearnOutcome {
                    pattern,
                    persisted: true,
                }
            }
            None => {
                // Hand back the would-be pattern so the caller's mapping
                // decision can proceed unaffected
                let pattern = self.fresh_pattern(tenant_id, signature, target_field, outcome);
                LearnOutcome {
                    pattern,
                    persisted: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconx_core::FieldObservation;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn signature(name: &str, samples: &[&str]) -> FieldSignature {
        FieldSignature::from_observation(&FieldObservation::with_samples(
            name,
            strings(samples),
        ))
    }

    fn store() -> InMemoryPatternStore {
        InMemoryPatternStore::new(StoreConfig::default())
    }

    #[test]
    fn test_first_acceptance_sets_initial_confidence() {
        let store = store();
        let sig = signature("srvr_nm", &["web01"]);
        let outcome = store.learn("t1", &sig, "hostname", MappingOutcome::Accepted);
        assert!(outcome.persisted);
        assert_eq!(outcome.pattern.confidence_score, 0.8);
        assert_eq!(outcome.pattern.success_count, 1);
        assert_eq!(outcome.pattern.version, 1);
    }

    #[test]
    fn test_first_rejection_sets_initial_confidence() {
        let store = store();
        let sig = signature("srvr_nm", &["web01"]);
        let outcome = store.learn("t1", &sig, "os_version", MappingOutcome::Rejected);
        assert_eq!(outcome.pattern.confidence_score, 0.2);
        assert_eq!(outcome.pattern.failure_count, 1);
    }

    #[test]
    fn test_repeated_acceptance_is_monotonic_and_bounded() {
        let store = store();
        let sig = signature("srvr_nm", &["web01"]);
        let mut previous = 0.0f32;
        for i in 0..10 {
            let outcome = store.learn("t1", &sig, "hostname", MappingOutcome::Accepted);
            assert!(
                outcome.pattern.confidence_score >= previous,
                "confidence decreased at step {}",
                i
            );
            assert!(outcome.pattern.confidence_score <= 0.95);
            previous = outcome.pattern.confidence_score;
        }
        assert_eq!(previous, 0.95);
    }

    #[test]
    fn test_rejection_floors_and_retires() {
        let store = store();
        let sig = signature("srvr_nm", &["web01"]);
        let mut last = store.learn("t1", &sig, "os_version", MappingOutcome::Rejected);
        for _ in 0..12 {
            last = store.learn("t1", &sig, "os_version", MappingOutcome::Rejected);
        }
        assert_eq!(last.pattern.confidence_score, 0.1);
        assert!(last.pattern.retired);
        // Retired patterns are invisible to retrieval but still stored
        assert!(store.retrieve("t1", &sig).is_empty());
        assert_eq!(store.tenant_pattern_count("t1"), 1);
    }

    #[test]
    fn test_retrieval_ranks_by_blended_score() {
        let store = store();
        let exact = signature("srvr_nm", &["web01"]);
        let near = signature("srvr_name", &["web01"]);
        let far = signature("purchase_cost", &["120.50"]);
        store.learn("t1", &exact, "hostname", MappingOutcome::Accepted);
        store.learn("t1", &near, "hostname", MappingOutcome::Accepted);
        store.learn("t1", &far, "cost", MappingOutcome::Accepted);

        let hits = store.retrieve("t1", &signature("srvr_nm", &["app02"]));
        assert_eq!(hits.len(), 2, "dissimilar signature must be filtered out");
        assert_eq!(hits[0].0.signature.normalized_name, "srvr_nm");
        assert!(hits[0].1 >= hits[1].1);
    }

    #[test]
    fn test_retrieval_is_tenant_scoped() {
        let store = store();
        let sig = signature("srvr_nm", &["web01"]);
        store.learn("t1", &sig, "hostname", MappingOutcome::Accepted);
        assert!(store.retrieve("t2", &sig).is_empty());
    }

    #[test]
    fn test_acceptance_reinforces_similar_same_target_patterns() {
        let config = StoreConfig::default();
        let nudge = config.reinforce_nudge;
        let store = InMemoryPatternStore::new(config);

        let neighbor = signature("server_nm", &["web01"]);
        let learned = store.learn("t1", &neighbor, "hostname", MappingOutcome::Accepted);
        let before = learned.pattern.confidence_score;

        // Accepting a highly similar signature with the same target nudges
        // the neighbor upward
        let sig = signature("srvr_nm", &["web01"]);
        store.learn("t1", &sig, "hostname", MappingOutcome::Accepted);

        let hits = store.retrieve("t1", &neighbor);
        let refreshed = hits
            .iter()
            .find(|(p, _)| p.signature.normalized_name == "server_nm")
            .map(|(p, _)| p.confidence_score)
            .unwrap_or_default();
        assert!((refreshed - (before + nudge)).abs() < 1e-5);
    }

    #[test]
    fn test_different_target_is_not_reinforced() {
        let store = store();
        let neighbor = signature("server_nm", &["web01"]);
        let before = store
            .learn("t1", &neighbor, "asset_name", MappingOutcome::Accepted)
            .pattern
            .confidence_score;

        let sig = signature("srvr_nm", &["web01"]);
        store.learn("t1", &sig, "hostname", MappingOutcome::Accepted);

        let hits = store.retrieve("t1", &neighbor);
        let refreshed = hits
            .iter()
            .find(|(p, _)| p.signature.normalized_name == "server_nm")
            .map(|(p, _)| p.confidence_score)
            .unwrap_or_default();
        assert_eq!(refreshed, before);
    }

    #[test]
    fn test_cross_target_feedback_starts_fresh_history() {
        let store = store();
        let sig = signature("srvr_nm", &["web01"]);
        for _ in 0..5 {
            store.learn("t1", &sig, "hostname", MappingOutcome::Accepted);
        }

        // Rejecting a different target must not inherit hostname's record
        let rejected = store.learn("t1", &sig, "os_version", MappingOutcome::Rejected);
        assert_eq!(rejected.pattern.target_field, "os_version");
        assert_eq!(rejected.pattern.confidence_score, 0.2);
        assert_eq!(rejected.pattern.success_count, 0);
        assert_eq!(rejected.pattern.failure_count, 1);

        // And the just-rejected target must not lead retrieval
        let hits = store.retrieve("t1", &sig);
        assert!(hits
            .iter()
            .all(|(p, _)| p.target_field != "os_version" || p.confidence_score <= 0.2));
    }

    #[test]
    fn test_cross_target_acceptance_uses_initial_confidence() {
        let store = store();
        let sig = signature("srvr_nm", &["web01"]);
        let first = store.learn("t1", &sig, "hostname", MappingOutcome::Rejected);
        assert_eq!(first.pattern.confidence_score, 0.2);

        let rebound = store.learn("t1", &sig, "asset_name", MappingOutcome::Accepted);
        assert_eq!(rebound.pattern.target_field, "asset_name");
        assert_eq!(rebound.pattern.confidence_score, 0.8);
        assert_eq!(rebound.pattern.success_count, 1);
        assert_eq!(rebound.pattern.failure_count, 0);
        // Version stays monotonic across the rebinding
        assert!(rebound.pattern.version > first.pattern.version);
    }

    #[test]
    fn test_versions_bump_on_every_write() {
        let store = store();
        let sig = signature("srvr_nm", &["web01"]);
        let v1 = store
            .learn("t1", &sig, "hostname", MappingOutcome::Accepted)
            .pattern
            .version;
        let v2 = store
            .learn("t1", &sig, "hostname", MappingOutcome::Accepted)
            .pattern
            .version;
        assert!(v2 > v1);
    }

    #[test]
    fn test_concurrent_learning_never_corrupts() {
        use std::sync::Arc;
        let store = Arc::new(store());
        let sig = signature("srvr_nm", &["web01"]);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let sig = sig.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.learn("t1", &sig, "hostname", MappingOutcome::Accepted);
                    }
                })
            })
            .collect();
        for handle in handles {
            let _ = handle.join();
        }

        let hits = store.retrieve("t1", &sig);
        assert_eq!(hits.len(), 1);
        let pattern = &hits[0].0;
        // Every committed write is atomic per pattern
        assert!(pattern.success_count <= 400);
        assert!(pattern.confidence_score <= 0.95);
        assert!((0.1..=0.95).contains(&pattern.confidence_score));
    }
}
