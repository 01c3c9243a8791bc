//! Embedding and text-generation providers.
//!
//! The pipeline never reaches for a global client: callers construct a
//! provider and pass it in. Providers own their resilience policy (retries,
//! timeouts); the pipeline propagates whatever error they return.

pub mod mock;
pub mod openai;
mod types;

use log::debug;
use rayon::prelude::*;

use crate::error::{GenSurvError, Result};

/// Turns text into a fixed-length vector.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text. Must fail rather than return a placeholder vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str;
}

/// Produces free-form text from a system instruction and a user prompt.
pub trait GenerationProvider: Send + Sync {
    fn generate(&self, system: &str, user: &str) -> Result<String>;
}

/// Embed every text, one provider call each, fanned out across the rayon pool.
///
/// Results come back in input order. All vectors must be non-empty and share
/// a dimension.
pub fn embed_all<E>(embedder: &E, texts: &[String]) -> Result<Vec<Vec<f32>>>
where
    E: EmbeddingProvider + ?Sized,
{
    debug!("Embedding {} texts with {}", texts.len(), embedder.model_name());

    let embeddings = texts
        .par_iter()
        .map(|text| embedder.embed(text))
        .collect::<Result<Vec<_>>>()?;

    if let Some(first) = embeddings.first() {
        let dimension = first.len();
        if dimension == 0 {
            return Err(GenSurvError::Embedding("provider returned an empty vector".to_string()));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(GenSurvError::Embedding(format!(
                "dimension mismatch: expected {}, got {}",
                dimension,
                bad.len()
            )));
        }
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::mock::StaticEmbedder;
    use super::*;

    #[test]
    fn test_embed_all_preserves_order() {
        let embedder = StaticEmbedder::new()
            .with("a", vec![1.0, 0.0])
            .with("b", vec![0.0, 1.0])
            .with("c", vec![0.5, 0.5]);
        let texts: Vec<String> = ["c", "a", "b"].iter().map(|s| s.to_string()).collect();

        let embeddings = embed_all(&embedder, &texts).unwrap();
        assert_eq!(embeddings, vec![vec![0.5, 0.5], vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(embedder.calls(), 3);
    }

    #[test]
    fn test_embed_all_propagates_failure() {
        let embedder = StaticEmbedder::new().with("a", vec![1.0]);
        let texts = vec!["a".to_string(), "missing".to_string()];
        assert!(matches!(embed_all(&embedder, &texts), Err(GenSurvError::Embedding(_))));
    }

    #[test]
    fn test_embed_all_rejects_dimension_mismatch() {
        let embedder = StaticEmbedder::new()
            .with("a", vec![1.0, 0.0])
            .with("b", vec![1.0, 0.0, 0.0]);
        let texts = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(embed_all(&embedder, &texts), Err(GenSurvError::Embedding(_))));
    }

    #[test]
    fn test_embed_all_empty_input() {
        let embedder = StaticEmbedder::new();
        assert!(embed_all(&embedder, &[]).unwrap().is_empty());
        assert_eq!(embedder.calls(), 0);
    }
}
