//! Mapping suggestion ranker
//!
//! Scores every catalog candidate for a source field, applies domain bias
//! rules, and returns an ordered, deduplicated list of suggestions. The
//! ranker never returns an empty list: when nothing scores well it falls
//! back to a deterministic abbreviation rule table and, as a last resort, a
//! generic low-confidence default.

use crate::scorer::{SimilarityScorer, Signal};
use crate::signals::semantic_categories;
use reconx_core::{FieldObservation, TargetField};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// One ranked mapping suggestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingSuggestion {
    pub target_field: String,
    pub confidence: f32,
    /// Human-readable explanation of why this target was suggested
    pub rationale: String,
    /// Learned pattern backing this suggestion, when one applies
    pub supporting_pattern_id: Option<String>,
    /// Sample values shared between source and target, as evidence
    pub sample_matches: Vec<String>,
}

/// Ranker configuration
#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// Default cap on returned suggestions
    pub max_suggestions: usize,
    /// Best score below this triggers the abbreviation fallback table
    pub fallback_threshold: f32,
    /// Multiplier applied to scores of very short source names
    pub short_name_penalty: f32,
    /// Source names shorter than this count as very short
    pub min_name_len: usize,
    /// Catch-all target that absorbs unmapped fields
    pub generic_target: String,
    /// Multiplier applied to the generic target when the source name
    /// carries real signal
    pub generic_penalty: f32,
    /// Evidence values attached per suggestion, at most
    pub max_sample_matches: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            max_suggestions: 5,
            fallback_threshold: 0.3,
            short_name_penalty: 0.6,
            min_name_len: 3,
            generic_target: "custom_attributes".to_string(),
            generic_penalty: 0.5,
            max_sample_matches: 3,
        }
    }
}

/// Deterministic abbreviation rules: (abbreviation, canonical target, confidence)
const ABBREVIATION_RULES: &[(&str, &str, f32)] = &[
    ("id", "asset_id", 0.60),
    ("name", "asset_name", 0.60),
    ("host", "hostname", 0.70),
    ("ip", "ip_address", 0.70),
    ("os", "os_version", 0.65),
    ("cpu", "cpu_model", 0.60),
    ("mem", "memory_gb", 0.55),
    ("memory", "memory_gb", 0.60),
    ("disk", "storage_gb", 0.55),
    ("storage", "storage_gb", 0.60),
    ("env", "environment", 0.65),
    ("owner", "owner", 0.60),
    ("serial", "serial_number", 0.65),
    ("loc", "location", 0.55),
];

/// Ranks target-field candidates for a source field
#[derive(Clone, Default)]
pub struct SuggestionRanker {
    scorer: SimilarityScorer,
    config: RankerConfig,
}

impl SuggestionRanker {
    pub fn new(scorer: SimilarityScorer, config: RankerConfig) -> Self {
        Self { scorer, config }
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Produce an ordered list of at most `max_suggestions` suggestions.
    ///
    /// Ordering is deterministic: descending by score, ties broken by
    /// target name.
    pub async fn suggest(
        &self,
        source: &FieldObservation,
        catalog: &[TargetField],
        max_suggestions: usize,
    ) -> Vec<MappingSuggestion> {
        let max = max_suggestions.max(1);
        let mut scored: Vec<MappingSuggestion> = Vec::with_capacity(catalog.len());

        let name_has_signal = self.source_has_signal(source);

        for target in catalog {
            let result = self.scorer.score(source, target).await;
            if result.unscoreable {
                continue;
            }
            let mut score = result.overall_score;
            let mut notes: Vec<String> = Vec::new();

            if source.normalized_name.chars().count() < self.config.min_name_len {
                score *= self.config.short_name_penalty;
                notes.push("short source name".to_string());
            }
            if target.name == self.config.generic_target && name_has_signal {
                score *= self.config.generic_penalty;
                notes.push("generic catch-all target".to_string());
            }

            let rationale = build_rationale(&result.scores, score, &notes);
            scored.push(MappingSuggestion {
                target_field: target.name.clone(),
                confidence: score.clamp(0.0, 1.0),
                rationale,
                supporting_pattern_id: None,
                sample_matches: self.sample_matches(source, target),
            });
        }

        sort_suggestions(&mut scored);
        dedupe_by_target(&mut scored);

        let best = scored.first().map(|s| s.confidence).unwrap_or(0.0);
        if best < self.config.fallback_threshold {
            debug!(
                source = %source.name,
                best_score = best,
                "best score below fallback threshold; consulting abbreviation rules"
            );
            let mut fallback = self.abbreviation_fallback(source, catalog);
            fallback.extend(scored);
            scored = fallback;
            sort_suggestions(&mut scored);
            dedupe_by_target(&mut scored);
        }

        if scored.is_empty() {
            scored.push(self.generic_default(source, catalog));
        }

        scored.truncate(max);
        scored
    }

    /// Whether the source name carries more signal than a bare catch-all
    fn source_has_signal(&self, source: &FieldObservation) -> bool {
        source.normalized_name.chars().count() >= self.config.min_name_len
            && !semantic_categories(&source.normalized_name).is_empty()
    }

    /// Deterministic rule-table fallback, restricted to catalog members
    fn abbreviation_fallback(
        &self,
        source: &FieldObservation,
        catalog: &[TargetField],
    ) -> Vec<MappingSuggestion> {
        let tokens: Vec<&str> = source.normalized_name.split('_').collect();
        let mut out = Vec::new();
        for (abbrev, canonical, confidence) in ABBREVIATION_RULES {
            let hit = source.normalized_name == *abbrev || tokens.contains(abbrev);
            if !hit {
                continue;
            }
            if !catalog.iter().any(|t| t.name == *canonical) {
                continue;
            }
            out.push(MappingSuggestion {
                target_field: canonical.to_string(),
                confidence: *confidence,
                rationale: format!(
                    "abbreviation rule: '{}' commonly maps to '{}'",
                    abbrev, canonical
                ),
                supporting_pattern_id: None,
                sample_matches: Vec::new(),
            });
        }
        sort_suggestions(&mut out);
        out
    }

    /// Last-resort suggestion so callers always get at least one
    fn generic_default(
        &self,
        source: &FieldObservation,
        catalog: &[TargetField],
    ) -> MappingSuggestion {
        let target = catalog
            .iter()
            .find(|t| t.name == self.config.generic_target)
            .map(|t| t.name.clone())
            .or_else(|| {
                let mut names: Vec<&str> =
                    catalog.iter().map(|t| t.name.as_str()).collect();
                names.sort();
                names.first().map(|n| n.to_string())
            })
            .unwrap_or_else(|| self.config.generic_target.clone());
        MappingSuggestion {
            target_field: target,
            confidence: 0.1,
            rationale: format!(
                "no confident match for '{}'; defaulting to catch-all target",
                source.name
            ),
            supporting_pattern_id: None,
            sample_matches: Vec::new(),
        }
    }

    /// Shared raw values between source samples and target samples
    fn sample_matches(&self, source: &FieldObservation, target: &TargetField) -> Vec<String> {
        if source.sample_values.is_empty() || target.sample_values.is_empty() {
            return Vec::new();
        }
        let mut matches: Vec<String> = source
            .sample_values
            .iter()
            .filter(|s| {
                target
                    .sample_values
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(s))
            })
            .cloned()
            .collect();
        matches.sort();
        matches.dedup();
        matches.truncate(self.config.max_sample_matches);
        matches
    }
}

/// Stable sort: descending score, then target name
fn sort_suggestions(suggestions: &mut [MappingSuggestion]) {
    suggestions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.target_field.cmp(&b.target_field))
    });
}

/// Keep only the best suggestion per target; input must already be sorted
fn dedupe_by_target(suggestions: &mut Vec<MappingSuggestion>) {
    let mut seen = ahash::AHashSet::new();
    suggestions.retain(|s| seen.insert(s.target_field.clone()));
}

fn build_rationale(
    scores: &std::collections::HashMap<Signal, f32>,
    final_score: f32,
    notes: &[String],
) -> String {
    let mut parts: Vec<(Signal, f32)> = scores.iter().map(|(s, v)| (*s, *v)).collect();
    parts.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    let top: Vec<String> = parts
        .iter()
        .take(3)
        .map(|(s, v)| format!("{} {:.2}", s.as_str(), v))
        .collect();
    let mut rationale = format!("score {:.2} from {}", final_score, top.join(", "));
    if !notes.is_empty() {
        rationale.push_str(&format!(" (penalized: {})", notes.join(", ")));
    }
    rationale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::ScorerConfig;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn ranker() -> SuggestionRanker {
        SuggestionRanker::new(
            SimilarityScorer::new(ScorerConfig::default()),
            RankerConfig::default(),
        )
    }

    fn catalog(names: &[&str]) -> Vec<TargetField> {
        names.iter().map(|n| TargetField::new(*n)).collect()
    }

    #[tokio::test]
    async fn test_server_name_maps_to_hostname() {
        let source = FieldObservation::with_samples(
            "SRVR_NM",
            strings(&["web01", "web02"]),
        );
        let targets = catalog(&["hostname", "ip_address", "os_version"]);
        let suggestions = ranker().suggest(&source, &targets, 3).await;
        assert_eq!(suggestions[0].target_field, "hostname");
        assert!(
            suggestions[0].confidence > 0.5,
            "got {}",
            suggestions[0].confidence
        );
    }

    #[tokio::test]
    async fn test_ordering_is_deterministic() {
        let source = FieldObservation::new("device_name");
        let targets = catalog(&["os_version", "hostname", "asset_name", "ip_address"]);
        let first = ranker().suggest(&source, &targets, 4).await;
        let mut reversed: Vec<TargetField> = targets.clone();
        reversed.reverse();
        let second = ranker().suggest(&source, &reversed, 4).await;
        let names_a: Vec<&str> = first.iter().map(|s| s.target_field.as_str()).collect();
        let names_b: Vec<&str> = second.iter().map(|s| s.target_field.as_str()).collect();
        assert_eq!(names_a, names_b);
    }

    #[tokio::test]
    async fn test_never_returns_empty() {
        let source = FieldObservation::new("zzqx");
        let targets = catalog(&["alpha", "beta"]);
        let suggestions = ranker().suggest(&source, &targets, 3).await;
        assert!(!suggestions.is_empty());

        let none = ranker().suggest(&source, &[], 3).await;
        assert_eq!(none.len(), 1);
        assert!(none[0].confidence <= 0.3);
    }

    #[tokio::test]
    async fn test_short_abbreviation_still_ranks() {
        let source = FieldObservation::new("ip");
        let targets = catalog(&["warranty_expiry", "purchase_cost", "ip_address"]);
        let suggestions = ranker().suggest(&source, &targets, 3).await;
        let top = &suggestions[0];
        assert_eq!(top.target_field, "ip_address");
        assert!((0.3..=0.7).contains(&top.confidence));
    }

    #[test]
    fn test_abbreviation_rule_table() {
        let r = ranker();
        let source = FieldObservation::new("mem_total");
        let targets = catalog(&["memory_gb", "hostname"]);
        let fallback = r.abbreviation_fallback(&source, &targets);
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].target_field, "memory_gb");
        assert!((0.5..=0.7).contains(&fallback[0].confidence));
        assert!(fallback[0].rationale.contains("abbreviation rule"));

        // Rules never suggest targets missing from the catalog
        let empty = r.abbreviation_fallback(&source, &catalog(&["hostname"]));
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_short_name_penalty() {
        let short = FieldObservation::new("os");
        let long = FieldObservation::new("os_version");
        let targets = catalog(&["os_version"]);
        let r = ranker();
        let short_suggestions = r.suggest(&short, &targets, 1).await;
        let long_suggestions = r.suggest(&long, &targets, 1).await;
        assert!(short_suggestions[0].confidence < long_suggestions[0].confidence);
    }

    #[tokio::test]
    async fn test_generic_target_is_penalized() {
        let source = FieldObservation::new("serial_number");
        let targets = catalog(&["custom_attributes", "serial_number"]);
        let suggestions = ranker().suggest(&source, &targets, 2).await;
        assert_eq!(suggestions[0].target_field, "serial_number");
    }

    #[tokio::test]
    async fn test_sample_matches_are_attached() {
        let source = FieldObservation::with_samples(
            "srvr_nm",
            strings(&["web01", "web02", "db01"]),
        );
        let targets = vec![TargetField::new("hostname")
            .with_samples(strings(&["WEB01", "db01", "app05"]))];
        let suggestions = ranker().suggest(&source, &targets, 1).await;
        assert_eq!(
            suggestions[0].sample_matches,
            vec!["db01".to_string(), "web01".to_string()]
        );
    }
}
