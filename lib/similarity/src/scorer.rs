//! Multi-signal similarity scorer
//!
//! Computes up to six independent [0,1] signals between a source field
//! observation and a candidate target, then combines them into a weighted
//! overall score. A signal whose dependency or input basis is missing is
//! omitted and the weights renormalize over whatever is present; only when
//! every signal is absent does the scorer return an unscoreable result.

use crate::contextual::contextual_similarity;
use crate::semantic::{semantic_similarity, EmbeddingClient};
use crate::signals::{
    lexical_similarity, pattern_similarity, phonetic_similarity, structural_similarity,
};
use reconx_core::{FieldObservation, TargetField};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The six similarity algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Lexical,
    Structural,
    Phonetic,
    Contextual,
    Pattern,
    Semantic,
}

impl Signal {
    pub const ALL: [Signal; 6] = [
        Signal::Lexical,
        Signal::Structural,
        Signal::Phonetic,
        Signal::Contextual,
        Signal::Pattern,
        Signal::Semantic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Lexical => "lexical",
            Signal::Structural => "structural",
            Signal::Phonetic => "phonetic",
            Signal::Contextual => "contextual",
            Signal::Pattern => "pattern",
            Signal::Semantic => "semantic",
        }
    }
}

/// Per-signal weights used in the overall combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeights {
    pub lexical: f32,
    pub structural: f32,
    pub phonetic: f32,
    pub contextual: f32,
    pub pattern: f32,
    pub semantic: f32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            lexical: 0.25,
            structural: 0.15,
            phonetic: 0.10,
            contextual: 0.15,
            pattern: 0.20,
            semantic: 0.30,
        }
    }
}

impl SignalWeights {
    pub fn weight(&self, signal: Signal) -> f32 {
        match signal {
            Signal::Lexical => self.lexical,
            Signal::Structural => self.structural,
            Signal::Phonetic => self.phonetic,
            Signal::Contextual => self.contextual,
            Signal::Pattern => self.pattern,
            Signal::Semantic => self.semantic,
        }
    }
}

/// Scorer configuration
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub weights: SignalWeights,
    /// Timeout for one embedding round-trip
    pub semantic_timeout: Duration,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            semantic_timeout: Duration::from_millis(800),
        }
    }
}

/// Result of scoring one source field against one target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Per-signal scores, only signals actually computed
    pub scores: HashMap<Signal, f32>,
    /// Weighted combination over present signals, in [0, 1]
    pub overall_score: f32,
    /// Coverage times consistency, in [0, 1]
    pub confidence: f32,
    /// Set when no signal could be computed at all
    pub unscoreable: bool,
}

impl SimilarityResult {
    fn unscoreable() -> Self {
        Self {
            scores: HashMap::new(),
            overall_score: 0.0,
            confidence: 0.0,
            unscoreable: true,
        }
    }

    pub fn score(&self, signal: Signal) -> Option<f32> {
        self.scores.get(&signal).copied()
    }
}

/// Computes similarity between source fields and target candidates.
///
/// Pure over its inputs apart from the optional embedding call; safe to
/// share across worker tasks.
#[derive(Clone, Default)]
pub struct SimilarityScorer {
    config: ScorerConfig,
    embedder: Option<Arc<dyn EmbeddingClient>>,
}

impl SimilarityScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self {
            config,
            embedder: None,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingClient>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score a source observation against one candidate target.
    ///
    /// Never fails: missing signal bases degrade to omission, and total
    /// signal loss yields a flagged zero-confidence result.
    pub async fn score(
        &self,
        source: &FieldObservation,
        target: &TargetField,
    ) -> SimilarityResult {
        let source_norm = &source.normalized_name;
        let target_norm = reconx_core::normalize_field_name(&target.name);

        let mut scores: HashMap<Signal, f32> = HashMap::new();

        if !source_norm.is_empty() || !target_norm.is_empty() {
            scores.insert(
                Signal::Lexical,
                lexical_similarity(source_norm, &target_norm),
            );
            scores.insert(
                Signal::Structural,
                structural_similarity(&source.name, &target.name),
            );
            scores.insert(
                Signal::Phonetic,
                phonetic_similarity(source_norm, &target_norm),
            );
            let semantic = semantic_similarity(
                self.embedder.as_deref(),
                source_norm,
                &target_norm,
                self.config.semantic_timeout,
            )
            .await;
            scores.insert(Signal::Semantic, semantic);
        }

        if let Some(pattern) = pattern_similarity(source_norm, &target_norm) {
            scores.insert(Signal::Pattern, pattern);
        }
        if let Some(contextual) = contextual_similarity(source, target) {
            scores.insert(Signal::Contextual, contextual);
        }

        if scores.is_empty() {
            debug!(source = %source.name, target = %target.name, "no signal could be computed");
            return SimilarityResult::unscoreable();
        }

        let overall_score = self.combine(&scores);
        let confidence = self.confidence(&scores);

        SimilarityResult {
            scores,
            overall_score,
            confidence,
            unscoreable: false,
        }
    }

    /// Weighted mean over present signals, weights renormalized.
    ///
    /// Sums in the fixed [`Signal::ALL`] order so the float result is
    /// bit-identical across runs regardless of map iteration order.
    fn combine(&self, scores: &HashMap<Signal, f32>) -> f32 {
        let mut weighted_sum = 0.0f32;
        let mut weight_sum = 0.0f32;
        for signal in Signal::ALL {
            let Some(score) = scores.get(&signal) else {
                continue;
            };
            let weight = self.config.weights.weight(signal);
            weighted_sum += score.clamp(0.0, 1.0) * weight;
            weight_sum += weight;
        }
        if weight_sum == 0.0 {
            return 0.0;
        }
        (weighted_sum / weight_sum).clamp(0.0, 1.0)
    }

    /// Coverage (present / 6) times consistency (1 - variance, clamped)
    fn confidence(&self, scores: &HashMap<Signal, f32>) -> f32 {
        let present: Vec<f32> = Signal::ALL
            .iter()
            .filter_map(|signal| scores.get(signal).copied())
            .collect();
        let n = present.len() as f32;
        let coverage = n / Signal::ALL.len() as f32;
        let mean: f32 = present.iter().sum::<f32>() / n;
        let variance: f32 =
            present.iter().map(|s| (s - mean) * (s - mean)).sum::<f32>() / n;
        let consistency = (1.0 - variance).clamp(0.0, 1.0);
        (coverage * consistency).clamp(0.0, 1.0)
    }
}
