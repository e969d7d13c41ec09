//! # reconx
//!
//! A field reconciliation and confidence engine for heterogeneous asset
//! inventories.
//!
//! Inventory exports from different tools disagree about everything: field
//! names, naming conventions, completeness. reconx maps unfamiliar source
//! fields onto a canonical target schema, quantifies how trustworthy that
//! mapping and the downstream pipeline stages are, and collapses duplicate
//! records that describe the same real-world asset across ingestion
//! sessions.
//!
//! ## Quick Start
//!
//! ```rust
//! use reconx::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let engine = ReconcileEngine::new(
//!     SuggestionRanker::new(
//!         SimilarityScorer::new(ScorerConfig::default()),
//!         RankerConfig::default(),
//!     ),
//!     Arc::new(InMemoryPatternStore::new(StoreConfig::default())),
//!     EngineConfig::default(),
//! );
//!
//! let source = FieldObservation::with_samples(
//!     "SRVR_NM",
//!     vec!["web01".to_string(), "web02".to_string()],
//! );
//! let catalog = vec![
//!     TargetField::new("hostname"),
//!     TargetField::new("ip_address"),
//!     TargetField::new("os_version"),
//! ];
//!
//! let suggestions = engine.suggest("tenant-a", &source, &catalog, 3).await;
//! assert_eq!(suggestions[0].target_field, "hostname");
//!
//! // Confirming the mapping teaches the store for next time
//! engine.record_feedback("tenant-a", &source, "hostname", MappingOutcome::Accepted);
//! # });
//! ```
//!
//! ## Crate Structure
//!
//! reconx is composed of several crates:
//!
//! - [`reconx-core`](https://docs.rs/reconx-core) - data model, confidence aggregation, deduplication
//! - [`reconx-similarity`](https://docs.rs/reconx-similarity) - six-signal scorer and suggestion ranker
//! - [`reconx-store`](https://docs.rs/reconx-store) - learned-pattern cache with optimistic versioning
//!
//! ## Design
//!
//! - **Degrade, never fail**: unavailable signals are omitted and weights
//!   renormalize; lost pattern writes downgrade to warnings; bad dedup keys
//!   are excluded, not fatal.
//! - **Deterministic**: suggestion ordering and canonical selection are
//!   stable under input reordering.
//! - **No ambient state**: tenants, catalogs and stores are passed into
//!   every call.

pub mod batch;
pub mod engine;

// Re-export core types
pub use reconx_core::{
    AggregateConfidence, AggregationContext, Adjudicator, AttributeLookup, CandidateRecord,
    CanonicalSelection, ConfidenceAggregator, ConfidenceLevel, ConfidenceSample, DedupRanker,
    DedupReport, DedupStrategy, DuplicateCandidateSet, Error, EscalationConfig,
    EscalationPriority, FieldObservation, Grouping, Result, TargetField,
};

// Re-export similarity
pub use reconx_similarity::{
    EmbeddingClient, MappingSuggestion, RankerConfig, ScorerConfig, Signal, SignalWeights,
    SimilarityResult, SimilarityScorer, SuggestionRanker,
};

// Re-export store
pub use reconx_store::{
    FieldSignature, InMemoryPatternStore, LearnOutcome, LearnedPattern, MappingOutcome,
    PatternStore, StoreConfig,
};

pub use batch::{reconcile_batch, FieldReconciliation};
pub use engine::{EngineConfig, ReconcileEngine};

/// Convenient glob import for the common API surface
pub mod prelude {
    pub use crate::batch::{reconcile_batch, FieldReconciliation};
    pub use crate::engine::{EngineConfig, ReconcileEngine};
    pub use reconx_core::{
        AggregationContext, CandidateRecord, ConfidenceAggregator, ConfidenceSample,
        DedupRanker, DedupStrategy, DuplicateCandidateSet, FieldObservation, TargetField,
    };
    pub use reconx_similarity::{
        MappingSuggestion, RankerConfig, ScorerConfig, SimilarityScorer, SuggestionRanker,
    };
    pub use reconx_store::{
        FieldSignature, InMemoryPatternStore, MappingOutcome, PatternStore, StoreConfig,
    };
}
