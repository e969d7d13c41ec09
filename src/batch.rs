//! Bounded batch reconciliation
//!
//! Fans a set of source fields across a worker pool bounded by a semaphore
//! so a large ingestion cannot overload the embedding dependency or the
//! pattern store. Every completed per-field result is final and
//! independently valid; cancelling the batch future simply stops further
//! results without corrupting any state.

use crate::engine::ReconcileEngine;
use reconx_core::{FieldObservation, TargetField};
use reconx_similarity::MappingSuggestion;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Suggestions for one source field within a batch
#[derive(Debug, Clone)]
pub struct FieldReconciliation {
    pub field_name: String,
    pub suggestions: Vec<MappingSuggestion>,
}

/// Reconcile a batch of source fields against one catalog.
///
/// Results come back in input order regardless of completion order; the
/// concurrency bound comes from [`crate::EngineConfig::batch_concurrency`].
pub async fn reconcile_batch(
    engine: Arc<ReconcileEngine>,
    tenant_id: &str,
    fields: Vec<FieldObservation>,
    catalog: Arc<Vec<TargetField>>,
    max_suggestions: usize,
) -> Vec<FieldReconciliation> {
    let concurrency = engine.config().batch_concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let tenant: Arc<str> = Arc::from(tenant_id);

    let mut join_set = JoinSet::new();
    let total = fields.len();
    for (index, field) in fields.into_iter().enumerate() {
        let engine = Arc::clone(&engine);
        let semaphore = Arc::clone(&semaphore);
        let catalog = Arc::clone(&catalog);
        let tenant = Arc::clone(&tenant);
        join_set.spawn(async move {
            // Closed semaphore only happens on shutdown; skip the field
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return (index, None),
            };
            let suggestions = engine
                .suggest(&tenant, &field, &catalog, max_suggestions)
                .await;
            (
                index,
                Some(FieldReconciliation {
                    field_name: field.name,
                    suggestions,
                }),
            )
        });
    }

    let mut slots: Vec<Option<FieldReconciliation>> = (0..total).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = result,
            Err(err) => warn!(error = %err, "batch reconciliation task failed"),
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use reconx_similarity::{RankerConfig, ScorerConfig, SimilarityScorer, SuggestionRanker};
    use reconx_store::{InMemoryPatternStore, StoreConfig};

    fn engine(concurrency: usize) -> Arc<ReconcileEngine> {
        Arc::new(ReconcileEngine::new(
            SuggestionRanker::new(
                SimilarityScorer::new(ScorerConfig::default()),
                RankerConfig::default(),
            ),
            Arc::new(InMemoryPatternStore::new(StoreConfig::default())),
            EngineConfig {
                batch_concurrency: concurrency,
                ..EngineConfig::default()
            },
        ))
    }

    fn catalog() -> Arc<Vec<TargetField>> {
        Arc::new(vec![
            TargetField::new("hostname"),
            TargetField::new("ip_address"),
            TargetField::new("os_version"),
        ])
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let fields = vec![
            FieldObservation::new("srvr_nm"),
            FieldObservation::new("mgmt_ip"),
            FieldObservation::new("os_ver"),
        ];
        let results =
            reconcile_batch(engine(2), "t1", fields, catalog(), 2).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].field_name, "srvr_nm");
        assert_eq!(results[1].field_name, "mgmt_ip");
        assert_eq!(results[2].field_name, "os_ver");
        for result in &results {
            assert!(!result.suggestions.is_empty());
        }
    }

    #[tokio::test]
    async fn test_batch_with_concurrency_one_is_sequentially_safe() {
        let fields: Vec<FieldObservation> = (0..10)
            .map(|i| FieldObservation::new(format!("field_{}", i)))
            .collect();
        let results =
            reconcile_batch(engine(1), "t1", fields, catalog(), 1).await;
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn test_empty_batch_is_fine() {
        let results =
            reconcile_batch(engine(4), "t1", Vec::new(), catalog(), 3).await;
        assert!(results.is_empty());
    }
}
