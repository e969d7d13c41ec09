//! Candidate records for deduplication
//!
//! Records arriving from different ingestion sessions are heterogeneous;
//! rather than reflecting over arbitrary shapes, every record exposes the
//! [`AttributeLookup`] capability: a typed, optional attribute read over a
//! JSON attribute bag.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Typed optional attribute lookup over a record's attribute bag
pub trait AttributeLookup {
    /// Look up an attribute by name; `None` when the attribute is absent
    fn attribute(&self, name: &str) -> Option<&Value>;

    /// Names of all attributes carried by this record
    fn attribute_names(&self) -> Vec<&str>;
}

/// One candidate record inside a duplicate group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    /// Identifier of the ingestion session that produced this record
    pub session_id: String,
    /// Monotonic recency marker; higher means more recently ingested
    pub recency: u64,
    /// Raw dedup-key value as it appeared in this record
    pub raw_key: String,
    /// Attribute bag
    pub attributes: Map<String, Value>,
}

impl CandidateRecord {
    pub fn new(
        session_id: impl Into<String>,
        recency: u64,
        raw_key: impl Into<String>,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            recency,
            raw_key: raw_key.into(),
            attributes,
        }
    }

    /// Count attributes with a meaningful value.
    ///
    /// Null and empty-string values do not count; they are placeholders
    /// emitted by sparse exports.
    pub fn non_null_attributes(&self) -> usize {
        self.attributes
            .values()
            .filter(|v| match v {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
            .count()
    }
}

impl AttributeLookup for CandidateRecord {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    fn attribute_names(&self) -> Vec<&str> {
        self.attributes.keys().map(|k| k.as_str()).collect()
    }
}
