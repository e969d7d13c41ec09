//! Sample-value driven (contextual) similarity
//!
//! When the ingestion collaborator supplies sample values, the contextual
//! signal compares what the values look like: inferred type, regex-derived
//! shape categories, and raw value overlap. At most the first
//! [`reconx_core::MAX_SAMPLE_VALUES`] samples are inspected per side so the
//! signal stays cheap and deterministic.

use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;
use regex::Regex;
use reconx_core::{FieldObservation, TargetField, MAX_SAMPLE_VALUES};

/// Regex-derived shape categories for raw values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Numeric,
    DateLike,
    IpLike,
    EmailLike,
    UuidLike,
    UrlLike,
    BooleanLike,
    Alphanumeric,
    FreeText,
}

impl ValueShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueShape::Numeric => "numeric",
            ValueShape::DateLike => "date",
            ValueShape::IpLike => "ip",
            ValueShape::EmailLike => "email",
            ValueShape::UuidLike => "uuid",
            ValueShape::UrlLike => "url",
            ValueShape::BooleanLike => "boolean",
            ValueShape::Alphanumeric => "alphanumeric",
            ValueShape::FreeText => "text",
        }
    }

    /// Map a catalog-declared data type onto the shape it implies
    pub fn from_declared_type(data_type: &str) -> Option<ValueShape> {
        match data_type.to_ascii_lowercase().as_str() {
            "int" | "integer" | "float" | "double" | "decimal" | "number" | "numeric" => {
                Some(ValueShape::Numeric)
            }
            "date" | "datetime" | "timestamp" => Some(ValueShape::DateLike),
            "ip" | "ipv4" | "ipv6" | "inet" => Some(ValueShape::IpLike),
            "email" => Some(ValueShape::EmailLike),
            "uuid" | "guid" => Some(ValueShape::UuidLike),
            "url" | "uri" => Some(ValueShape::UrlLike),
            "bool" | "boolean" => Some(ValueShape::BooleanLike),
            "string" | "text" | "varchar" => Some(ValueShape::FreeText),
            _ => None,
        }
    }
}

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}([ T]\d{2}:\d{2}(:\d{2})?)?$|^\d{1,2}[-/]\d{1,2}[-/]\d{2,4}$")
        .expect("static regex")
});
static IP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$|^[0-9a-fA-F:]+::[0-9a-fA-F:]*$").expect("static regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"));
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("static regex")
});
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://").expect("static regex"));
static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("static regex"));
static ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+\d+[A-Za-z0-9]*$|^\d+[A-Za-z]+[A-Za-z0-9]*$").expect("static regex"));

/// Infer the shape category of one raw value
pub fn value_shape(raw: &str) -> ValueShape {
    let v = raw.trim();
    if NUMERIC_RE.is_match(v) {
        ValueShape::Numeric
    } else if DATE_RE.is_match(v) {
        ValueShape::DateLike
    } else if IP_RE.is_match(v) {
        ValueShape::IpLike
    } else if EMAIL_RE.is_match(v) {
        ValueShape::EmailLike
    } else if UUID_RE.is_match(v) {
        ValueShape::UuidLike
    } else if URL_RE.is_match(v) {
        ValueShape::UrlLike
    } else if matches!(
        v.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "y" | "n"
    ) {
        ValueShape::BooleanLike
    } else if ALNUM_RE.is_match(v) {
        ValueShape::Alphanumeric
    } else {
        ValueShape::FreeText
    }
}

/// Dominant shape across a sample slice, with its frequency fraction
pub fn dominant_shape(samples: &[String]) -> Option<(ValueShape, f32)> {
    let capped = &samples[..samples.len().min(MAX_SAMPLE_VALUES)];
    if capped.is_empty() {
        return None;
    }
    let mut counts: AHashMap<ValueShape, usize> = AHashMap::new();
    for sample in capped {
        *counts.entry(value_shape(sample)).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(shape, count)| (*count, shape.as_str()))
        .map(|(shape, count)| (shape, count as f32 / capped.len() as f32))
}

/// Contextual similarity between a source observation and a target field.
///
/// Best of three sub-scores: inferred-type agreement, shape-category set
/// overlap, and raw value overlap. `None` when the source carries no samples
/// or the target offers neither samples nor a declared type.
pub fn contextual_similarity(source: &FieldObservation, target: &TargetField) -> Option<f32> {
    let source_samples = &source.sample_values;
    if source_samples.is_empty() {
        return None;
    }
    let target_samples = &target.sample_values;
    let declared = target
        .data_type
        .as_deref()
        .and_then(ValueShape::from_declared_type);
    if target_samples.is_empty() && declared.is_none() {
        return None;
    }

    let mut best: f32 = 0.0;

    // Inferred-type agreement
    if let Some((source_shape, source_frac)) = dominant_shape(source_samples) {
        let target_shape = if !target_samples.is_empty() {
            dominant_shape(target_samples).map(|(s, _)| s)
        } else {
            declared
        };
        if let Some(target_shape) = target_shape {
            if source_shape == target_shape {
                best = best.max(source_frac);
            }
        }
    }

    if !target_samples.is_empty() {
        best = best.max(shape_set_overlap(source_samples, target_samples));
        best = best.max(raw_value_overlap(source_samples, target_samples));
    }

    Some(best.clamp(0.0, 1.0))
}

fn shape_set_overlap(a: &[String], b: &[String]) -> f32 {
    let shapes = |samples: &[String]| -> AHashSet<ValueShape> {
        samples
            .iter()
            .take(MAX_SAMPLE_VALUES)
            .map(|s| value_shape(s))
            .collect()
    };
    let set_a = shapes(a);
    let set_b = shapes(b);
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f32 / union as f32
}

fn raw_value_overlap(a: &[String], b: &[String]) -> f32 {
    let values = |samples: &[String]| -> AHashSet<String> {
        samples
            .iter()
            .take(MAX_SAMPLE_VALUES)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    };
    let set_a = values(a);
    let set_b = values(b);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let union = set_a.union(&set_b).count();
    set_a.intersection(&set_b).count() as f32 / union as f32
}
