//! Scoring generated headings against a hand-curated reference set.
//!
//! Each generated heading is matched to the reference heading whose paper
//! titles overlap it most (Jaccard index), so the comparison rests on how
//! papers are grouped rather than on how the headings are worded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{GenSurvError, Result};
use crate::headings::Headings;

/// A reference heading listing the titles of the papers filed under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceHeading {
    pub heading: String,
    pub papers: Vec<String>,
}

#[derive(Deserialize)]
struct ReferenceFile {
    headings: Vec<ReferenceHeading>,
}

/// Load reference headings from a `{"headings": [...]}` JSON file.
pub fn load_reference_headings(path: &Path) -> Result<Vec<ReferenceHeading>> {
    let content = fs::read_to_string(path)?;
    let file: ReferenceFile = serde_json::from_str(&content).map_err(|e| {
        GenSurvError::Config(format!("reference headings in {:?} are malformed: {}", path, e))
    })?;
    Ok(file.headings)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingMatch {
    pub generated_heading: String,
    pub best_reference: Option<String>,
    pub score: f64,
    pub generated_titles: Vec<String>,
    pub reference_titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub average_score: f64,
    pub matches: Vec<HeadingMatch>,
}

/// |a ∩ b| / |a ∪ b|; two empty sets score 0.
pub fn jaccard(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

pub fn evaluate_headings(generated: &Headings, reference: &[ReferenceHeading]) -> EvaluationReport {
    let matches: Vec<HeadingMatch> = generated
        .iter()
        .map(|heading| {
            let generated_titles: BTreeSet<&str> = heading.papers.iter().map(|p| p.title()).collect();

            let mut best: Option<(&ReferenceHeading, f64)> = None;
            for candidate in reference {
                let reference_titles: BTreeSet<&str> = candidate.papers.iter().map(String::as_str).collect();
                let score = jaccard(&generated_titles, &reference_titles);
                if score > best.map(|(_, s)| s).unwrap_or(0.0) {
                    best = Some((candidate, score));
                }
            }

            let reference_titles: Vec<String> = best
                .map(|(r, _)| {
                    let titles: BTreeSet<&str> = r.papers.iter().map(String::as_str).collect();
                    titles.into_iter().map(str::to_string).collect()
                })
                .unwrap_or_default();

            HeadingMatch {
                generated_heading: heading.heading.clone(),
                best_reference: best.map(|(r, _)| r.heading.clone()),
                score: best.map(|(_, s)| s).unwrap_or(0.0),
                generated_titles: generated_titles.into_iter().map(str::to_string).collect(),
                reference_titles,
            }
        })
        .collect();

    let average_score = if matches.is_empty() {
        0.0
    } else {
        matches.iter().map(|m| m.score).sum::<f64>() / matches.len() as f64
    };

    EvaluationReport { average_score, matches }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== Evaluation Results =====")?;
        for m in &self.matches {
            writeln!(f)?;
            writeln!(f, "### Generated Heading: {}", m.generated_heading)?;
            writeln!(f, "### Best Matching Reference Heading: {}", m.best_reference.as_deref().unwrap_or("(none)"))?;
            writeln!(f, "### Matching Score: {:.2}", m.score)?;
            writeln!(f, "---- Papers under Generated Heading ----")?;
            for title in &m.generated_titles {
                writeln!(f, "  - {}", title)?;
            }
            writeln!(f, "---- Papers under Best Matching Reference Heading ----")?;
            for title in &m.reference_titles {
                writeln!(f, "  - {}", title)?;
            }
        }
        writeln!(f)?;
        write!(f, "Average matching score: {:.2}", self.average_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaperCounts {
    pub generated: usize,
    pub reference: usize,
}

impl PaperCounts {
    pub fn matches(&self) -> bool {
        self.generated == self.reference
    }
}

/// Total papers filed on each side, to spot papers lost or double-counted.
pub fn compare_paper_counts(generated: &Headings, reference: &[ReferenceHeading]) -> PaperCounts {
    PaperCounts {
        generated: generated.total_papers(),
        reference: reference.iter().map(|r| r.papers.len()).sum(),
    }
}
