//! Cross-stage confidence aggregation and escalation
//!
//! Later pipeline stages (parsing, mapping, enrichment, validation, ...)
//! each report a [0,100] confidence score with a weight. The aggregator
//! combines the stages actually present into one weighted score, classifies
//! it, and decides whether the run should be escalated for additional
//! automated or human review.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-stage confidence score fed into the aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceSample {
    pub stage_id: String,
    /// Raw confidence in [0, 100]; out-of-range values are clamped
    pub raw_score: f32,
    /// Relative weight of this stage; zero-weight stages are excluded
    pub weight: f32,
}

impl ConfidenceSample {
    pub fn new(stage_id: impl Into<String>, raw_score: f32, weight: f32) -> Self {
        Self {
            stage_id: stage_id.into(),
            raw_score,
            weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Thresholds and override knobs for one tenant's escalation policy.
///
/// The level thresholds are policy, not constants; the priority bands in
/// [`priority_for`] are fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Aggregate score at or above this is `high`
    pub high_threshold: f32,
    /// Aggregate score at or above this is `medium`
    pub medium_threshold: f32,
    /// Scores below this (overall or per stage) recommend escalation
    pub low_threshold: f32,
    /// Signed shift applied to `low_threshold` when a context override fires.
    ///
    /// The default is positive: high-value or complex contexts raise the bar
    /// and escalate more. Operators who instead want risky contexts to
    /// tolerate lower confidence set a negative delta.
    pub override_delta: f32,
    /// High-value-asset count above which the override fires
    pub high_value_asset_cutoff: u64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            high_threshold: 90.0,
            medium_threshold: 75.0,
            low_threshold: 60.0,
            override_delta: 10.0,
            high_value_asset_cutoff: 100,
        }
    }
}

/// Evaluation-scoped context that can tighten the escalation policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationContext {
    /// Number of high-value assets touched by this run, when known
    pub high_value_asset_count: Option<u64>,
    /// Set when the environment is known to be unusually complex
    pub high_environment_complexity: bool,
}

/// Aggregated confidence over all stages present in one evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfidence {
    pub overall_score: f32,
    pub level: ConfidenceLevel,
    pub escalation_recommended: bool,
    /// Stages individually below the effective low threshold
    pub low_confidence_stages: Vec<String>,
    pub priority: EscalationPriority,
    /// Remediation advice keyed by low-confidence stage
    pub recommendations: AHashMap<String, String>,
}

/// Fixed priority bands over the aggregate score
pub fn priority_for(overall_score: f32) -> EscalationPriority {
    if overall_score < 40.0 {
        EscalationPriority::Critical
    } else if overall_score < 60.0 {
        EscalationPriority::High
    } else if overall_score < 75.0 {
        EscalationPriority::Medium
    } else {
        EscalationPriority::Low
    }
}

/// Combines per-stage scores and applies the escalation policy
#[derive(Debug, Clone, Default)]
pub struct ConfidenceAggregator {
    config: EscalationConfig,
}

impl ConfidenceAggregator {
    pub fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Aggregate the supplied stage scores.
    ///
    /// Absent stages are simply not in the input; zero-weight stages are
    /// excluded and the remaining weights renormalized. Supplying no usable
    /// samples yields a conservative neutral default that favors review
    /// instead of failing.
    pub fn aggregate(
        &self,
        samples: &[ConfidenceSample],
        context: &AggregationContext,
    ) -> AggregateConfidence {
        let usable: Vec<&ConfidenceSample> =
            samples.iter().filter(|s| s.weight > 0.0).collect();

        if usable.is_empty() {
            warn!("confidence aggregation with no stage scores; defaulting to review");
            return AggregateConfidence {
                overall_score: 50.0,
                level: ConfidenceLevel::Medium,
                escalation_recommended: true,
                low_confidence_stages: Vec::new(),
                priority: priority_for(50.0),
                recommendations: AHashMap::new(),
            };
        }

        let mut weighted_sum = 0.0f32;
        let mut weight_sum = 0.0f32;
        for sample in &usable {
            let score = clamp_score(sample);
            weighted_sum += score * sample.weight;
            weight_sum += sample.weight;
        }
        let overall_score = weighted_sum / weight_sum;

        let effective_low = self.effective_low_threshold(context);

        let mut low_confidence_stages = Vec::new();
        let mut recommendations = AHashMap::new();
        for sample in &usable {
            if clamp_score(sample) < effective_low {
                low_confidence_stages.push(sample.stage_id.clone());
                recommendations.insert(
                    sample.stage_id.clone(),
                    format!(
                        "stage '{}' scored {:.1}, below threshold {:.1}; review its input data and rerun",
                        sample.stage_id, sample.raw_score, effective_low
                    ),
                );
            }
        }
        low_confidence_stages.sort();

        let escalation_recommended =
            overall_score < effective_low || !low_confidence_stages.is_empty();

        let level = if overall_score >= self.config.high_threshold {
            ConfidenceLevel::High
        } else if overall_score >= self.config.medium_threshold {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        };

        AggregateConfidence {
            overall_score,
            level,
            escalation_recommended,
            low_confidence_stages,
            priority: priority_for(overall_score),
            recommendations,
        }
    }

    fn effective_low_threshold(&self, context: &AggregationContext) -> f32 {
        let override_fires = context
            .high_value_asset_count
            .map(|n| n > self.config.high_value_asset_cutoff)
            .unwrap_or(false)
            || context.high_environment_complexity;

        if override_fires {
            self.config.low_threshold + self.config.override_delta
        } else {
            self.config.low_threshold
        }
    }
}

fn clamp_score(sample: &ConfidenceSample) -> f32 {
    if !(0.0..=100.0).contains(&sample.raw_score) {
        warn!(
            stage = %sample.stage_id,
            score = sample.raw_score,
            "stage score outside [0, 100]; clamping"
        );
    }
    sample.raw_score.clamp(0.0, 100.0)
}
