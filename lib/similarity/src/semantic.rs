//! Semantic (embedding-based) similarity with graceful degradation
//!
//! The semantic signal compares vector embeddings of the two
//! normalized-and-expanded names. The embedding dependency is behind the
//! [`EmbeddingClient`] trait and carries a timeout; any failure degrades to
//! a small synonym-table lookup instead of failing the scoring call.

use ahash::AHashMap;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reconx_core::Result;
use std::time::Duration;
use tracing::warn;

/// Pluggable embedding dependency.
///
/// Implementations call an external embedding service and may be slow or
/// unavailable; callers always wrap invocations in a timeout.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Per-token abbreviation expansions applied before embedding
static ABBREVIATION_EXPANSIONS: Lazy<AHashMap<&'static str, &'static str>> = Lazy::new(|| {
    AHashMap::from_iter([
        ("srvr", "server"),
        ("svr", "server"),
        ("nm", "name"),
        ("addr", "address"),
        ("num", "number"),
        ("qty", "quantity"),
        ("desc", "description"),
        ("env", "environment"),
        ("cfg", "config"),
        ("mgmt", "management"),
        ("os", "operating_system"),
        ("mem", "memory"),
        ("hd", "disk"),
        ("loc", "location"),
        ("dept", "department"),
        ("mfr", "manufacturer"),
        ("ver", "version"),
    ])
});

/// Small synonym groups used when the embedding service is unavailable
static SYNONYM_GROUPS: Lazy<Vec<&'static [&'static str]>> = Lazy::new(|| {
    vec![
        &["name", "title", "label"],
        &["host", "hostname", "server", "machine", "server_name"],
        &["ip", "ip_address", "address"],
        &["owner", "contact", "responsible"],
        &["created", "created_at", "creation_date"],
        &["type", "kind", "category"],
        &["status", "state", "condition"],
        &["environment", "env", "stage"],
    ]
});

/// Score yielded by a synonym-table hit
const SYNONYM_HIT_SCORE: f32 = 0.8;

/// Expand known abbreviations token-by-token in a normalized name
pub fn expand_abbreviations(normalized: &str) -> String {
    normalized
        .split('_')
        .map(|token| *ABBREVIATION_EXPANSIONS.get(token).unwrap_or(&token))
        .collect::<Vec<&str>>()
        .join("_")
}

/// Synonym-table fallback: 0.8 on a shared group, else 0.0
pub fn synonym_similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return SYNONYM_HIT_SCORE;
    }
    for group in SYNONYM_GROUPS.iter() {
        let hit_a = group.iter().any(|t| a == *t || a.split('_').any(|tok| tok == *t));
        let hit_b = group.iter().any(|t| b == *t || b.split('_').any(|tok| tok == *t));
        if hit_a && hit_b {
            return SYNONYM_HIT_SCORE;
        }
    }
    0.0
}

/// Cosine similarity clamped into [0, 1]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

/// Semantic similarity between two normalized names.
///
/// `client` is optional; without one (or on timeout/error) the synonym
/// fallback answers instead.
pub async fn semantic_similarity(
    client: Option<&dyn EmbeddingClient>,
    a: &str,
    b: &str,
    timeout: Duration,
) -> f32 {
    let expanded_a = expand_abbreviations(a);
    let expanded_b = expand_abbreviations(b);

    if let Some(client) = client {
        let both = async {
            let va = client.embed(&expanded_a).await?;
            let vb = client.embed(&expanded_b).await?;
            Ok::<_, reconx_core::Error>((va, vb))
        };
        match tokio::time::timeout(timeout, both).await {
            Ok(Ok((va, vb))) => return cosine_similarity(&va, &vb),
            Ok(Err(err)) => {
                warn!(error = %err, "embedding call failed; using synonym fallback");
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "embedding call timed out; using synonym fallback");
            }
        }
    }

    synonym_similarity(&expanded_a, &expanded_b)
}
