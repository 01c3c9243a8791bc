pub mod classifier;
pub mod generator;
pub mod ordering;
pub mod parser;
pub mod refiner;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::Paper;
use crate::provider::{embed_all, EmbeddingProvider, GenerationProvider};

pub use classifier::{classify_papers, classify_with_embeddings, pick_category};
pub use generator::generate_initial_categories;
pub use ordering::{order_categories, order_with_embeddings, SimilarityGraph, SpanningTree};
pub use parser::{parse_category_list, truncate_label};
pub use refiner::refine_categories;

/// Cosine similarity `(u·v) / (‖u‖·‖v‖)`. Zero-norm vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product / (norm_a * norm_b)
}

/// Title/abstract JSON for the leading `sample_size` papers, as shown to the model.
pub(crate) fn sample_papers_json(papers: &[Paper], sample_size: usize) -> Result<String> {
    let sample: Vec<_> = papers
        .iter()
        .take(sample_size)
        .map(|p| json!({ "title": p.title(), "abstract": p.abstract_text().unwrap_or("") }))
        .collect();
    Ok(serde_json::to_string_pretty(&sample)?)
}

/// One heading and the papers filed under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub heading: String,
    pub papers: Vec<Paper>,
}

/// Ordered heading → papers mapping.
///
/// Serializes as an array of `{"heading", "papers"}` objects so the order
/// survives a round trip through JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headings {
    entries: Vec<Heading>,
}

impl Headings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty bucket for `label` unless one exists.
    pub fn ensure(&mut self, label: &str) {
        if !self.entries.iter().any(|h| h.heading == label) {
            self.entries.push(Heading {
                heading: label.to_string(),
                papers: Vec::new(),
            });
        }
    }

    /// Append a paper to the bucket for `label`, creating it if needed.
    pub fn push(&mut self, label: &str, paper: Paper) {
        match self.entries.iter_mut().find(|h| h.heading == label) {
            Some(heading) => heading.papers.push(paper),
            None => self.entries.push(Heading {
                heading: label.to_string(),
                papers: vec![paper],
            }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&[Paper]> {
        self.entries
            .iter()
            .find(|h| h.heading == label)
            .map(|h| h.papers.as_slice())
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|h| h.heading.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Heading> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_papers(&self) -> usize {
        self.entries.iter().map(|h| h.papers.len()).sum()
    }

    pub fn remove_empty(&mut self) {
        self.entries.retain(|h| !h.papers.is_empty());
    }

    pub fn into_entries(self) -> Vec<Heading> {
        self.entries
    }
}

/// Run the full heading pipeline: generate, refine, order, classify.
///
/// Papers without an abstract are left out. If refinement yields nothing the
/// initial categories are used. A category that collides with the
/// unclassified label is dropped. Any provider error aborts the run and is
/// returned as-is. Headings with no papers are dropped from the result.
pub fn generate_headings<E, G>(
    papers: &[Paper],
    embedder: &E,
    generator: &G,
    config: &PipelineConfig,
) -> Result<Headings>
where
    E: EmbeddingProvider + ?Sized,
    G: GenerationProvider + ?Sized,
{
    config.validate()?;

    let usable: Vec<Paper> = papers.iter().filter(|p| p.has_abstract()).cloned().collect();
    if usable.len() < papers.len() {
        warn!("Skipping {} papers without an abstract", papers.len() - usable.len());
    }

    let initial = generate_initial_categories(generator, &usable, config)
        .inspect_err(|e| error!("Category generation failed: {}", e))?;

    let refined = refine_categories(generator, &initial, &usable, config)
        .inspect_err(|e| error!("Category refinement failed: {}", e))?;
    let categories = if refined.is_empty() {
        warn!("Refinement produced no categories, keeping the initial set");
        initial
    } else {
        if refined == initial {
            warn!("Refinement echoed the initial categories unchanged");
        }
        refined
    };

    let categories: Vec<String> = categories
        .iter()
        .map(|c| truncate_label(c, config.max_label_chars))
        .filter(|c| {
            let reserved = *c == config.unclassified_label;
            if reserved {
                warn!("Dropping category '{}': it names the unclassified bucket", c);
            }
            !reserved
        })
        .collect();

    // Embedded once; ordering and classification share the vectors.
    let embeddings = if categories.is_empty() {
        Vec::new()
    } else {
        embed_all(embedder, &categories).inspect_err(|e| error!("Category embedding failed: {}", e))?
    };
    let (ordered, embeddings) = order_with_embeddings(categories, embeddings);
    info!("Ordered {} categories", ordered.len());

    let mut headings = classify_with_embeddings(embedder, &usable, &ordered, &embeddings, config)
        .inspect_err(|e| error!("Paper classification failed: {}", e))?;
    headings.remove_empty();

    info!("Classification results:");
    for heading in headings.iter() {
        info!("  {} ({} papers)", heading.heading, heading.papers.len());
        for paper in &heading.papers {
            debug!("    - {}", paper.title());
        }
    }

    Ok(headings)
}
