//! Resource text classification
//!
//! Maps a posting's (name, description) to a category plus extracted
//! specifications. Broad categories come from centroid cosine similarity
//! over the embedding space; errand postings are refined into a granular
//! errand bucket by keyword scoring, and that bucket becomes the category.

use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::embedding::{cosine, EmbeddingProvider};
use crate::error::{NlpError, NlpResult};
use crate::extract::{extract_errand_specs, extract_specs_for_category};

/// Broad categories scored against the text embedding.
pub const BROAD_CATEGORIES: [&str; 4] = ["Electronics", "Books", "Errands", "Furniture"];

/// Category returned when classification fails outright.
pub const CLASSIFICATION_ERROR: &str = "ClassificationError";

/// Fallback errand bucket and the model-unavailable fallback category.
pub const MISC: &str = "misc";

/// Ordered errand buckets with their keyword lists. Ties resolve to the
/// first bucket reached.
const ERRAND_BUCKETS: [(&str, &[&str]); 6] = [
    ("takeout", &["food", "takeout", "meal", "lunch", "dinner", "奶茶", "外卖"]),
    ("package", &["package", "express", "parcel", "快递", "取件"]),
    ("documents", &["document", "paper", "report", "打印", "文档", "资料"]),
    ("ride", &["ride", "car", "pickup", "接送", "顺风车", "代步"]),
    ("purchase", &["buy", "purchase", "带", "买", "帮我买", "便利店", "纸", "厕纸", "超市", "矿泉水"]),
    (MISC, &[]),
];

const STOP_WORDS: [&str; 24] = [
    "a", "an", "the", "to", "for", "of", "and", "or", "in", "on", "at", "is", "are", "be", "me",
    "my", "i", "you", "please", "with", "from", "的", "了", "是",
];

/// Result of classifying a posting.
#[derive(Debug, Clone)]
pub struct Classification {
    pub category: String,
    pub specifications: Map<String, Value>,
}

/// Text classifier over an embedding provider.
///
/// Category centroids are the embeddings of the category names, computed
/// once the provider is available and cached for the classifier's lifetime.
pub struct Classifier {
    provider: Arc<dyn EmbeddingProvider>,
    centroids: RwLock<Option<Vec<(String, Vec<f32>)>>>,
}

impl Classifier {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            centroids: RwLock::new(None),
        }
    }

    /// Compute the category centroids now instead of on first use.
    pub fn warm_up(&self) -> NlpResult<()> {
        if self.centroids().is_some() {
            Ok(())
        } else {
            Err(NlpError::ModelUnavailable(
                "category centroids could not be computed".to_string(),
            ))
        }
    }

    fn centroids(&self) -> Option<Vec<(String, Vec<f32>)>> {
        if let Ok(guard) = self.centroids.read() {
            if let Some(existing) = guard.as_ref() {
                return Some(existing.clone());
            }
        }
        if !self.provider.is_available() {
            return None;
        }
        let mut computed = Vec::with_capacity(BROAD_CATEGORIES.len());
        for category in BROAD_CATEGORIES {
            match self.provider.embed(category) {
                Ok(vector) => computed.push((category.to_string(), vector)),
                Err(err) => {
                    warn!(category, %err, "failed to embed category centroid");
                    return None;
                }
            }
        }
        if let Ok(mut guard) = self.centroids.write() {
            *guard = Some(computed.clone());
        }
        Some(computed)
    }

    /// Classify a posting and merge extracted specifications with the
    /// poster-supplied ones. Poster values win on key collision.
    ///
    /// Failure modes: an unavailable embedding model degrades to `misc`
    /// with the poster specifications untouched; an internal stage failure
    /// returns `ClassificationError`, also with untouched specifications.
    pub fn classify(
        &self,
        name: &str,
        description: &str,
        user_specs: &Map<String, Value>,
    ) -> Classification {
        let text = format!("{name} {description}");
        let text = text.trim().to_string();
        debug!(text = %text.chars().take(100).collect::<String>(), "classifying resource text");

        let broad = match self.broad_category(&text) {
            Some(category) => category,
            None => {
                debug!("embedding model unavailable, falling back to misc");
                return Classification {
                    category: MISC.to_string(),
                    specifications: user_specs.clone(),
                };
            }
        };

        match self.refine(&broad, name, description, &text) {
            Ok((category, extracted)) => {
                // Extracted keys first, poster keys overwrite on collision.
                let mut merged = extracted;
                for (key, value) in user_specs {
                    merged.insert(key.clone(), value.clone());
                }
                Classification {
                    category,
                    specifications: merged,
                }
            }
            Err(err) => {
                warn!(%err, "classification stage failed");
                Classification {
                    category: CLASSIFICATION_ERROR.to_string(),
                    specifications: user_specs.clone(),
                }
            }
        }
    }

    fn broad_category(&self, text: &str) -> Option<String> {
        let centroids = self.centroids()?;
        let embedding = match self.provider.embed(text) {
            Ok(vector) => vector,
            Err(NlpError::ModelUnavailable(_)) => return None,
            Err(err) => {
                warn!(%err, "failed to embed resource text");
                return None;
            }
        };
        let mut best: Option<(&str, f64)> = None;
        for (category, centroid) in &centroids {
            let similarity = cosine(centroid, &embedding);
            match best {
                Some((_, score)) if similarity <= score => {}
                _ => best = Some((category, similarity)),
            }
        }
        best.map(|(category, _)| category.to_string())
    }

    fn refine(
        &self,
        broad: &str,
        name: &str,
        description: &str,
        text: &str,
    ) -> NlpResult<(String, Map<String, Value>)> {
        if broad == "Errands" {
            let bucket = classify_errand_bucket(text);
            let extracted = extract_errand_specs(text);
            Ok((bucket.to_string(), extracted))
        } else {
            let extracted = extract_specs_for_category(broad, name, description);
            Ok((broad.to_string(), extracted))
        }
    }
}

/// Score the text against the errand keyword buckets.
///
/// Tokens are lowercased, whitespace-split, and stop-word filtered; a
/// bucket earns a point for every (token, keyword) pair where the token
/// contains the keyword. `misc` when nothing scores.
pub fn classify_errand_bucket(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split_whitespace()
        .filter(|token| !STOP_WORDS.contains(token))
        .collect();

    let mut best = MISC;
    let mut best_score = 0usize;
    for (bucket, keywords) in ERRAND_BUCKETS {
        let mut score = 0usize;
        for token in &tokens {
            for keyword in keywords {
                if token.contains(keyword) {
                    score += 1;
                }
            }
        }
        if score > best_score {
            best = bucket;
            best_score = score;
        }
    }
    best
}
