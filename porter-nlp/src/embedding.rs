//! Embedding provider seam
//!
//! The sentence-embedding model is an external collaborator. Everything that
//! needs an embedding goes through [`EmbeddingProvider`], so the engine can
//! run against the in-process hashing embedder, a fixture provider in tests,
//! or a real model server without touching the callers.

use std::collections::HashMap;

use crate::error::{NlpError, NlpResult};

/// Produces fixed-dimension sentence embeddings.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a text into a dense vector.
    fn embed(&self, text: &str) -> NlpResult<Vec<f32>>;

    /// Whether the provider can currently serve embeddings.
    fn is_available(&self) -> bool {
        true
    }
}

/// Cosine similarity between two vectors.
///
/// Empty, zero-norm, or length-mismatched inputs yield 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Deterministic character n-gram feature-hashing embedder.
///
/// Stands in for the external sentence-transformer: texts sharing character
/// trigrams land in the same buckets, so related names score a high cosine.
/// Hashing uses FNV-1a, so the vector for a given text is stable across
/// processes.
pub struct HashingEmbedder {
    dim: usize,
}

const NGRAM: usize = 3;

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> NlpResult<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();
        let chars: Vec<char> = normalized.chars().collect();
        if chars.is_empty() {
            return Ok(vector);
        }
        let mut buf = String::new();
        for window in chars.windows(NGRAM.min(chars.len())) {
            buf.clear();
            buf.extend(window.iter());
            let hash = fnv1a(buf.as_bytes());
            let bucket = (hash % self.dim as u64) as usize;
            // Signed hashing keeps unrelated texts near-orthogonal.
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

/// Fixture provider with preset vectors, keyed by exact text.
///
/// Unknown texts are an embedding error, which callers degrade to a zero
/// semantic score, and `availability` can be flipped off to exercise the
/// model-unavailable paths.
#[derive(Default)]
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    unavailable: bool,
}

impl FixedEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that reports itself unavailable.
    pub fn offline() -> Self {
        Self {
            vectors: HashMap::new(),
            unavailable: true,
        }
    }

    pub fn insert(&mut self, text: impl Into<String>, vector: Vec<f32>) -> &mut Self {
        self.vectors.insert(text.into(), vector);
        self
    }
}

impl EmbeddingProvider for FixedEmbedder {
    fn embed(&self, text: &str) -> NlpResult<Vec<f32>> {
        if self.unavailable {
            return Err(NlpError::ModelUnavailable("fixture offline".to_string()));
        }
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| NlpError::Embedding(format!("no fixture vector for '{text}'")))
    }

    fn is_available(&self) -> bool {
        !self.unavailable
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.5, 0.5, 0.1];
        assert!((cosine(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_of_empty_or_mismatched_inputs_is_zero() {
        assert_eq!(cosine(&[], &[]), 0.0);
        assert_eq!(cosine(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn hashing_embedder_is_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("bubble tea delivery").unwrap();
        let b = embedder.embed("bubble tea delivery").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hashing_embedder_relates_similar_texts() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("calculus textbook").unwrap();
        let b = embedder.embed("calculus book").unwrap();
        let c = embedder.embed("electric kettle").unwrap();
        assert!(cosine(&a, &b) > cosine(&a, &c));
    }

    #[test]
    fn fixed_embedder_errors_on_unknown_text() {
        let embedder = FixedEmbedder::new();
        assert!(embedder.embed("missing").is_err());
    }
}
