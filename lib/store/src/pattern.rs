//! Learned patterns and field signatures
//!
//! A [`FieldSignature`] is the cache key for learned mappings: the
//! normalized source name plus a compact digest of what the sample values
//! look like. Two fields with the same name but wildly different value
//! shapes get distinct signatures.

use chrono::{DateTime, Utc};
use reconx_core::FieldObservation;
use reconx_similarity::value_shape;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Stable cache key for a source field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSignature {
    /// Normalized (lowercase snake_case) source field name
    pub normalized_name: String,
    /// Hex digest of the sample-shape set; empty samples hash to a fixed value
    pub shape_digest: String,
}

impl FieldSignature {
    /// Derive the signature for an observation.
    ///
    /// The digest covers the *set* of shape categories seen in the samples,
    /// not the values themselves, so it is stable across ingestion runs that
    /// carry different concrete values of the same kind.
    pub fn from_observation(obs: &FieldObservation) -> Self {
        let shapes: BTreeSet<&'static str> = obs
            .sample_values
            .iter()
            .map(|v| value_shape(v).as_str())
            .collect();

        let mut hasher = Sha256::new();
        for shape in &shapes {
            hasher.update(shape.as_bytes());
            hasher.update(b"|");
        }
        let digest = hasher.finalize();
        let shape_digest = digest
            .iter()
            .take(6)
            .map(|b| format!("{:02x}", b))
            .collect::<String>();

        Self {
            normalized_name: obs.normalized_name.clone(),
            shape_digest,
        }
    }

    /// Canonical string form used as the storage key
    pub fn key(&self) -> String {
        format!("{}#{}", self.normalized_name, self.shape_digest)
    }
}

impl fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Outcome of a mapping decision fed back into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingOutcome {
    Accepted,
    Rejected,
}

/// A cached, confidence-weighted mapping learned from past decisions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub pattern_id: String,
    pub tenant_id: String,
    pub signature: FieldSignature,
    pub target_field: String,
    /// Bounded to [0.1, 0.95]
    pub confidence_score: f32,
    pub success_count: u32,
    pub failure_count: u32,
    pub last_updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version, bumped on every committed write
    pub version: u64,
    /// Soft-retired when confidence floors out; retired patterns are kept
    /// but skipped by retrieval
    pub retired: bool,
}

/// Result of a learn call.
///
/// `persisted` is false when optimistic retries were exhausted; the mapping
/// decision itself is unaffected, only the cache update was lost.
#[derive(Debug, Clone)]
pub struct LearnOutcome {
    pub pattern: LearnedPattern,
    pub persisted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_signature_is_stable_across_equivalent_samples() {
        let a = FieldObservation::with_samples("SRVR_NM", strings(&["web01", "web02"]));
        let b = FieldObservation::with_samples("srvr-nm", strings(&["app07", "db03"]));
        let sig_a = FieldSignature::from_observation(&a);
        let sig_b = FieldSignature::from_observation(&b);
        // Same normalized name, same alphanumeric shape set
        assert_eq!(sig_a, sig_b);
    }

    #[test]
    fn test_signature_distinguishes_value_shapes() {
        let names = FieldObservation::with_samples("addr", strings(&["web01", "db02"]));
        let ips = FieldObservation::with_samples("addr", strings(&["10.0.0.1", "10.0.0.2"]));
        let sig_names = FieldSignature::from_observation(&names);
        let sig_ips = FieldSignature::from_observation(&ips);
        assert_eq!(sig_names.normalized_name, sig_ips.normalized_name);
        assert_ne!(sig_names.shape_digest, sig_ips.shape_digest);
    }

    #[test]
    fn test_signature_key_roundtrip() {
        let obs = FieldObservation::new("hostName");
        let sig = FieldSignature::from_observation(&obs);
        assert!(sig.key().starts_with("host_name#"));
        assert_eq!(sig.to_string(), sig.key());
    }
}
