use crate::error::{GenSurvError, Result};

pub const DEFAULT_SAMPLE_SIZE: usize = 20;
pub const DEFAULT_NUM_CATEGORIES: usize = 10;
pub const DEFAULT_MAX_LABEL_CHARS: usize = 40;
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;
pub const DEFAULT_UNCLASSIFIED_LABEL: &str = "Error";

/// Tunables for one run of the heading pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of leading papers shown to the language model.
    pub sample_size: usize,
    /// Target number of categories requested from the generator.
    pub num_categories: usize,
    /// Labels longer than this (in characters) are truncated.
    pub max_label_chars: usize,
    /// Papers whose best similarity is below this go to the unclassified bucket.
    pub min_confidence: f32,
    pub unclassified_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            num_categories: DEFAULT_NUM_CATEGORIES,
            max_label_chars: DEFAULT_MAX_LABEL_CHARS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            unclassified_label: DEFAULT_UNCLASSIFIED_LABEL.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_categories == 0 {
            return Err(GenSurvError::Config("num_categories must be at least 1".to_string()));
        }
        if self.max_label_chars == 0 {
            return Err(GenSurvError::Config("max_label_chars must be at least 1".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.min_confidence) {
            return Err(GenSurvError::Config(format!(
                "min_confidence must be within [-1, 1], got {}",
                self.min_confidence
            )));
        }
        if self.unclassified_label.trim().is_empty() {
            return Err(GenSurvError::Config("unclassified_label must not be empty".to_string()));
        }
        Ok(())
    }
}
