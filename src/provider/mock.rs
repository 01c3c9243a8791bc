//! In-memory providers for tests and offline runs.
//!
//! ```rust
//! use gensurv::provider::mock::{ScriptedGenerator, StaticEmbedder};
//! use gensurv::provider::{EmbeddingProvider, GenerationProvider};
//!
//! let embedder = StaticEmbedder::new().with("graph", vec![1.0, 0.0]);
//! assert_eq!(embedder.embed("graph").unwrap(), vec![1.0, 0.0]);
//!
//! let generator = ScriptedGenerator::new(["1. Reward modelling"]);
//! assert_eq!(generator.generate("sys", "user").unwrap(), "1. Reward modelling");
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{EmbeddingProvider, GenerationProvider};
use crate::error::{GenSurvError, Result};

/// Embedder backed by a fixed text → vector table. Unknown text is an error.
#[derive(Debug, Default)]
pub struct StaticEmbedder {
    table: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.table.insert(text.into(), embedding);
        self
    }

    /// Number of `embed` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for StaticEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| GenSurvError::Embedding(format!("no embedding registered for '{}'", text)))
    }

    fn model_name(&self) -> &str {
        "static"
    }
}

/// Embedder whose dimensions count keyword occurrences (case-insensitive).
///
/// Text sharing no keyword embeds to the zero vector, which has zero
/// similarity to everything.
#[derive(Debug, Clone)]
pub struct KeywordEmbedder {
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(|k| k.into().to_lowercase()).collect(),
        }
    }
}

impl EmbeddingProvider for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .map(|keyword| text.matches(keyword.as_str()).count() as f32)
            .collect())
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}

/// Generator that replays canned responses in order.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failure after the responses already scripted.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(message.into()));
        }
        self
    }

    /// `(system, user)` pairs received so far.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl GenerationProvider for ScriptedGenerator {
    fn generate(&self, system: &str, user: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((system.to_string(), user.to_string()));
        }
        let next = self
            .responses
            .lock()
            .map_err(|_| GenSurvError::Generation("scripted generator poisoned".to_string()))?
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenSurvError::Generation(message)),
            None => Err(GenSurvError::Generation("no scripted response left".to_string())),
        }
    }
}
