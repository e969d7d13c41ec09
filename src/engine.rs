//! Reconciliation engine facade
//!
//! Wires the suggestion ranker to the pattern learning store: retrieval
//! gives learned shortcuts a seat at the head of the suggestion list, and
//! accepted/rejected decisions flow back into the store.

use reconx_core::{FieldObservation, TargetField};
use reconx_similarity::{MappingSuggestion, SuggestionRanker};
use reconx_store::{FieldSignature, LearnOutcome, MappingOutcome, PatternStore};
use std::sync::Arc;
use tracing::debug;

/// Engine-level configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Effective pattern rank needed to surface a learned shortcut
    pub pattern_shortcut_threshold: f32,
    /// Worker-pool bound for batch reconciliation
    pub batch_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pattern_shortcut_threshold: 0.75,
            batch_concurrency: 8,
        }
    }
}

/// Ties scoring, ranking and pattern learning together for one tenant base
#[derive(Clone)]
pub struct ReconcileEngine {
    ranker: SuggestionRanker,
    store: Arc<dyn PatternStore>,
    config: EngineConfig,
}

impl ReconcileEngine {
    pub fn new(
        ranker: SuggestionRanker,
        store: Arc<dyn PatternStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            ranker,
            store,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PatternStore> {
        &self.store
    }

    /// Rank catalog candidates for a source field, consulting the pattern
    /// store for a learned shortcut first.
    pub async fn suggest(
        &self,
        tenant_id: &str,
        source: &FieldObservation,
        catalog: &[TargetField],
        max_suggestions: usize,
    ) -> Vec<MappingSuggestion> {
        let signature = FieldSignature::from_observation(source);
        let shortcut = self
            .store
            .retrieve(tenant_id, &signature)
            .into_iter()
            .find(|(pattern, effective)| {
                *effective >= self.config.pattern_shortcut_threshold
                    && catalog.iter().any(|t| t.name == pattern.target_field)
            });

        let mut suggestions = self.ranker.suggest(source, catalog, max_suggestions).await;

        if let Some((pattern, effective)) = shortcut {
            debug!(
                tenant = tenant_id,
                target = %pattern.target_field,
                effective,
                "learned pattern shortcut applies"
            );
            suggestions.retain(|s| s.target_field != pattern.target_field);
            suggestions.insert(
                0,
                MappingSuggestion {
                    target_field: pattern.target_field.clone(),
                    confidence: effective.clamp(0.0, 1.0),
                    rationale: format!(
                        "learned pattern: '{}' was previously confirmed for '{}'",
                        pattern.target_field, pattern.signature.normalized_name
                    ),
                    supporting_pattern_id: Some(pattern.pattern_id.clone()),
                    sample_matches: Vec::new(),
                },
            );
            suggestions.truncate(max_suggestions.max(1));
        }

        suggestions
    }

    /// Feed a mapping decision back into the pattern store.
    ///
    /// Best-effort: a lost write is reported on the outcome, never raised.
    pub fn record_feedback(
        &self,
        tenant_id: &str,
        source: &FieldObservation,
        target_field: &str,
        outcome: MappingOutcome,
    ) -> LearnOutcome {
        let signature = FieldSignature::from_observation(source);
        self.store
            .learn(tenant_id, &signature, target_field, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconx_similarity::{RankerConfig, ScorerConfig, SimilarityScorer};
    use reconx_store::{InMemoryPatternStore, StoreConfig};

    fn engine() -> ReconcileEngine {
        ReconcileEngine::new(
            SuggestionRanker::new(
                SimilarityScorer::new(ScorerConfig::default()),
                RankerConfig::default(),
            ),
            Arc::new(InMemoryPatternStore::new(StoreConfig::default())),
            EngineConfig::default(),
        )
    }

    fn catalog(names: &[&str]) -> Vec<TargetField> {
        names.iter().map(|n| TargetField::new(*n)).collect()
    }

    #[tokio::test]
    async fn test_learned_shortcut_leads_the_list() {
        let engine = engine();
        let source = FieldObservation::with_samples(
            "SRVR_NM",
            vec!["web01".to_string(), "web02".to_string()],
        );
        let targets = catalog(&["hostname", "ip_address", "os_version"]);

        // Confirm the mapping a few times so the learned rank is decisive
        for _ in 0..3 {
            engine.record_feedback("t1", &source, "hostname", MappingOutcome::Accepted);
        }

        let suggestions = engine.suggest("t1", &source, &targets, 3).await;
        assert_eq!(suggestions[0].target_field, "hostname");
        assert!(suggestions[0].supporting_pattern_id.is_some());
        assert!(suggestions[0].rationale.contains("learned pattern"));
    }

    #[tokio::test]
    async fn test_shortcut_requires_catalog_membership() {
        let engine = engine();
        let source = FieldObservation::new("srvr_nm");
        for _ in 0..3 {
            engine.record_feedback("t1", &source, "hostname", MappingOutcome::Accepted);
        }

        // Catalog without the learned target: no shortcut applies
        let targets = catalog(&["ip_address", "os_version"]);
        let suggestions = engine.suggest("t1", &source, &targets, 3).await;
        assert!(suggestions
            .iter()
            .all(|s| s.supporting_pattern_id.is_none()));
    }

    #[tokio::test]
    async fn test_feedback_is_tenant_isolated() {
        let engine = engine();
        let source = FieldObservation::new("srvr_nm");
        let targets = catalog(&["hostname", "ip_address"]);
        for _ in 0..3 {
            engine.record_feedback("t1", &source, "hostname", MappingOutcome::Accepted);
        }

        let other_tenant = engine.suggest("t2", &source, &targets, 3).await;
        assert!(other_tenant
            .iter()
            .all(|s| s.supporting_pattern_id.is_none()));
    }
}
