//! # reconx Similarity
//!
//! Multi-signal field similarity scoring and mapping-suggestion ranking.
//!
//! This crate answers one question: how likely is it that an unfamiliar
//! source field (name plus optional sample values) means the same thing as a
//! candidate target field? It computes up to six independent signals and a
//! weighted, renormalized overall score, then ranks catalog candidates into
//! explainable suggestions.
//!
//! ## Signals
//!
//! - **lexical** - edit distance, containment, word overlap over normalized names
//! - **structural** - naming-convention agreement, length and character-class blend
//! - **phonetic** - simplified Soundex equality
//! - **contextual** - sample-value types, shape categories and raw overlap
//! - **pattern** - shared semantic categories (identifier/name/date/...)
//! - **semantic** - embedding cosine with a synonym-table fallback
//!
//! ## Example
//!
//! ```rust
//! use reconx_similarity::{SimilarityScorer, ScorerConfig, SuggestionRanker, RankerConfig};
//! use reconx_core::{FieldObservation, TargetField};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let scorer = SimilarityScorer::new(ScorerConfig::default());
//! let ranker = SuggestionRanker::new(scorer, RankerConfig::default());
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
//! let suggestions = ranker.suggest(&source, &catalog, 3).await;
//! assert_eq!(suggestions[0].target_field, "hostname");
//! # });
//! ```

pub mod contextual;
pub mod rank;
pub mod scorer;
pub mod semantic;
pub mod signals;

// Re-export main types for convenience
pub use contextual::{contextual_similarity, dominant_shape, value_shape, ValueShape};
pub use rank::{MappingSuggestion, RankerConfig, SuggestionRanker};
pub use scorer::{ScorerConfig, Signal, SignalWeights, SimilarityResult, SimilarityScorer};
pub use semantic::{
    cosine_similarity, expand_abbreviations, semantic_similarity, synonym_similarity,
    EmbeddingClient,
};
pub use signals::{
    detect_convention, lexical_similarity, levenshtein, pattern_similarity,
    phonetic_similarity, semantic_categories, soundex, structural_similarity,
    NamingConvention,
};
