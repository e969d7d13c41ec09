//! # reconx Core
//!
//! Core library for the reconx field reconciliation engine.
//!
//! This crate provides the shared data model and the two pure decision
//! components that need no similarity signals:
//!
//! - [`FieldObservation`] / [`TargetField`] - per-call field snapshots
//! - [`CandidateRecord`] - dedup candidates with the [`AttributeLookup`] capability
//! - [`ConfidenceAggregator`] - cross-stage confidence aggregation and escalation
//! - [`DedupRanker`] - canonical-record selection over duplicate groups
//!
//! ## Example
//!
//! ```rust
//! use reconx_core::{ConfidenceAggregator, ConfidenceSample, AggregationContext};
//!
//! let aggregator = ConfidenceAggregator::default();
//! let samples = vec![
//!     ConfidenceSample::new("parse", 92.0, 1.0),
//!     ConfidenceSample::new("map", 81.0, 2.0),
//! ];
//! let result = aggregator.aggregate(&samples, &AggregationContext::default());
//! assert!(!result.escalation_recommended);
//! ```

pub mod confidence;
pub mod dedup;
pub mod error;
pub mod field;
pub mod record;

pub use confidence::{
    AggregateConfidence, AggregationContext, ConfidenceAggregator, ConfidenceLevel,
    ConfidenceSample, EscalationConfig, EscalationPriority,
};
pub use dedup::{
    Adjudicator, CanonicalSelection, DedupRanker, DedupReport, DedupStrategy,
    DuplicateCandidateSet, Grouping,
};
pub use error::{Error, Result};
pub use field::{normalize_field_name, FieldObservation, TargetField, MAX_SAMPLE_VALUES};
pub use record::{AttributeLookup, CandidateRecord};
