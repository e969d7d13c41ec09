//! # reconx Store
//!
//! Pattern learning store for the reconx reconciliation engine.
//!
//! Confirmed and rejected mapping decisions are cached per tenant, keyed by
//! a stable [`FieldSignature`], so future reconciliations of similar fields
//! can shortcut straight to a learned target. Confidence adjusts with every
//! outcome and never leaves [0.1, 0.95]; patterns whose confidence floors
//! out are soft-retired, never deleted.
//!
//! ## Example
//!
//! ```rust
//! use reconx_store::{InMemoryPatternStore, PatternStore, StoreConfig, FieldSignature, MappingOutcome};
//! use reconx_core::FieldObservation;
//!
//! let store = InMemoryPatternStore::new(StoreConfig::default());
//! let obs = FieldObservation::with_samples("SRVR_NM", vec!["web01".to_string()]);
//! let signature = FieldSignature::from_observation(&obs);
//!
//! let outcome = store.learn("tenant-a", &signature, "hostname", MappingOutcome::Accepted);
//! assert!(outcome.persisted);
//!
//! let hits = store.retrieve("tenant-a", &signature);
//! assert_eq!(hits[0].0.target_field, "hostname");
//! ```

pub mod memory;
pub mod pattern;

pub use memory::{InMemoryPatternStore, PatternStore, StoreConfig};
pub use pattern::{FieldSignature, LearnOutcome, LearnedPattern, MappingOutcome};
