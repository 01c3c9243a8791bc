use log::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{GenSurvError, Result};
use crate::headings::{cosine_similarity, Headings};
use crate::models::Paper;
use crate::provider::{embed_all, EmbeddingProvider};

/// Index of the best-scoring category, or `None` when the best score is below
/// `min_confidence`. Ties go to the earlier category.
pub fn pick_category(similarities: &[f32], min_confidence: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in similarities.iter().enumerate() {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ if score.is_nan() => {}
            _ => best = Some((i, score)),
        }
    }

    best.filter(|&(_, score)| score >= min_confidence).map(|(i, _)| i)
}

/// First occurrence of each category, leaving out the unclassified label.
fn distinct_categories(categories: &[String], config: &PipelineConfig) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(categories.len());
    for (i, category) in categories.iter().enumerate() {
        if *category == config.unclassified_label {
            warn!("Category '{}' collides with the unclassified label, dropping it", category);
            continue;
        }
        if !kept.iter().any(|&k| categories[k] == *category) {
            kept.push(i);
        }
    }
    kept
}

/// Assign each paper to its nearest category by embedding similarity.
///
/// Every category gets a bucket (possibly empty) in the given order, followed
/// by the unclassified bucket. Each paper is decided on its own; no balancing
/// across buckets is attempted. A category named like the unclassified bucket
/// is dropped so the two never merge.
pub fn classify_papers<E>(
    embedder: &E,
    papers: &[Paper],
    categories: &[String],
    config: &PipelineConfig,
) -> Result<Headings>
where
    E: EmbeddingProvider + ?Sized,
{
    let labels: Vec<String> = distinct_categories(categories, config)
        .into_iter()
        .map(|i| categories[i].clone())
        .collect();

    let category_embeddings = if papers.is_empty() {
        vec![Vec::new(); labels.len()]
    } else {
        embed_all(embedder, &labels)?
    };
    classify_with_embeddings(embedder, papers, &labels, &category_embeddings, config)
}

/// Same as [`classify_papers`], reusing category embeddings computed earlier
/// in the run. `category_embeddings[i]` belongs to `categories[i]`.
pub fn classify_with_embeddings<E>(
    embedder: &E,
    papers: &[Paper],
    categories: &[String],
    category_embeddings: &[Vec<f32>],
    config: &PipelineConfig,
) -> Result<Headings>
where
    E: EmbeddingProvider + ?Sized,
{
    if categories.len() != category_embeddings.len() {
        return Err(GenSurvError::Embedding(format!(
            "{} categories but {} category embeddings",
            categories.len(),
            category_embeddings.len()
        )));
    }

    let kept = distinct_categories(categories, config);

    let mut headings = Headings::new();
    for &i in &kept {
        headings.ensure(&categories[i]);
    }
    headings.ensure(&config.unclassified_label);

    if papers.is_empty() {
        return Ok(headings);
    }

    let paper_texts: Vec<String> = papers.iter().map(Paper::embedding_text).collect();
    let paper_embeddings = embed_all(embedder, &paper_texts)?;

    let mut unclassified = 0;
    for (paper, paper_embedding) in papers.iter().zip(&paper_embeddings) {
        let similarities: Vec<f32> = kept
            .iter()
            .map(|&i| cosine_similarity(paper_embedding, &category_embeddings[i]))
            .collect();

        let label = match pick_category(&similarities, config.min_confidence) {
            Some(k) => &categories[kept[k]],
            None => {
                unclassified += 1;
                debug!("Paper '{}' fell below the confidence floor", paper.title());
                &config.unclassified_label
            }
        };
        headings.push(label, paper.clone());
    }

    info!(
        "Classified {} papers into {} categories ({} unclassified)",
        papers.len(),
        kept.len(),
        unclassified
    );
    Ok(headings)
}
