//! Field observations and target catalog entries
//!
//! A [`FieldObservation`] is the per-call snapshot of a source field handed
//! in by the ingestion collaborator: raw name, normalized name, a bounded
//! set of sample values, and free-form source annotations. Observations are
//! immutable and never persisted.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Maximum number of sample values retained per observation.
///
/// Sample-driven signals only ever look at the first 100 values, so anything
/// beyond that is dropped at construction time.
pub const MAX_SAMPLE_VALUES: usize = 100;

/// A source field as observed during one reconciliation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldObservation {
    /// Raw field name exactly as it appeared in the source
    pub name: String,
    /// Normalized (lowercase snake_case) form of the name
    pub normalized_name: String,
    /// Bounded sequence of raw sample values, may be empty
    pub sample_values: Vec<String>,
    /// Free-form annotations from the source (file name, sheet, column index, ...)
    pub source_context: AHashMap<String, String>,
}

impl FieldObservation {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = normalize_field_name(&name);
        Self {
            name,
            normalized_name,
            sample_values: Vec::new(),
            source_context: AHashMap::new(),
        }
    }

    /// Create an observation with sample values, truncated to [`MAX_SAMPLE_VALUES`]
    pub fn with_samples(name: impl Into<String>, mut samples: Vec<String>) -> Self {
        samples.truncate(MAX_SAMPLE_VALUES);
        let mut obs = Self::new(name);
        obs.sample_values = samples;
        obs
    }

    /// Attach a source-context annotation
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.source_context.insert(key.into(), value.into());
        self
    }
}

/// A candidate target field from the canonical catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetField {
    /// Canonical field name
    pub name: String,
    /// Declared data type, when the catalog knows it ("string", "integer", "date", ...)
    pub data_type: Option<String>,
    /// Human-readable description from the catalog
    pub description: Option<String>,
    /// Representative values already stored under this target, may be empty
    pub sample_values: Vec<String>,
}

impl TargetField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            description: None,
            sample_values: Vec::new(),
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_samples(mut self, mut samples: Vec<String>) -> Self {
        samples.truncate(MAX_SAMPLE_VALUES);
        self.sample_values = samples;
        self
    }
}

/// Normalize a raw field name to lowercase snake_case.
///
/// Camel and Pascal case boundaries become underscores, any run of
/// non-alphanumeric characters collapses to a single underscore, and
/// leading/trailing underscores are stripped.
pub fn normalize_field_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower_or_digit = false;
    for ch in raw.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else if ch.is_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            prev_lower_or_digit = true;
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower_or_digit = false;
        }
    }
    out.trim_matches('_').to_string()
}
