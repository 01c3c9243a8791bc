use log::{debug, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::headings::parser::{parse_category_list, truncate_label};
use crate::headings::sample_papers_json;
use crate::models::Paper;
use crate::provider::GenerationProvider;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates research categories based on academic papers.";

fn build_prompt(papers_json: &str, num_categories: usize, max_chars: usize) -> String {
    format!(
        r#"Generate exactly {num_categories} research categories that best represent the content of the following papers.
Return them as a numbered list, one category per line.

Each category must:
1. Be between 20 and {max_chars} characters long
2. End on a complete word or concept, never mid-word
3. Use abbreviations where needed to stay within {max_chars} characters
4. Say something meaningful about the specific research area
5. Be specific enough to separate neighbouring subfields
6. Reflect the methods, technologies or key concepts in the papers
7. Avoid generic terms such as "Artificial Intelligence" or "Machine Learning"
8. Use technical terminology appropriate for the field

Examples of good categories:
- "Metabolic network modeling"
- "Genome-scale flux analysis"
- "Synthetic biology automation"
- "Multi-omics data integration"

Papers:
{papers_json}

Categories:"#
    )
}

/// Ask the generator for an initial set of category labels.
///
/// Only the first `config.sample_size` papers are shown to the model. The
/// model may return more or fewer than `config.num_categories` labels; the
/// caller gets whatever parses.
pub fn generate_initial_categories<G>(generator: &G, papers: &[Paper], config: &PipelineConfig) -> Result<Vec<String>>
where
    G: GenerationProvider + ?Sized,
{
    let papers_json = sample_papers_json(papers, config.sample_size)?;
    let prompt = build_prompt(&papers_json, config.num_categories, config.max_label_chars);

    info!(
        "Generating {} initial categories from {} sampled papers",
        config.num_categories,
        papers.len().min(config.sample_size)
    );
    let raw_output = generator.generate(SYSTEM_PROMPT, &prompt)?;
    debug!("Raw category output:\n{}", raw_output);

    let categories: Vec<String> = parse_category_list(&raw_output)
        .iter()
        .map(|category| truncate_label(category, config.max_label_chars))
        .filter(|category| !category.is_empty())
        .collect();

    info!("Generated {} initial categories", categories.len());
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenSurvError;
    use crate::provider::mock::ScriptedGenerator;

    fn paper(id: usize) -> Paper {
        Paper::builder(format!("p{}", id), format!("Title {}", id))
            .abstract_text(format!("Abstract {}", id))
            .build()
            .unwrap()
    }

    #[test]
    fn test_parses_and_truncates() {
        let generator = ScriptedGenerator::new([
            "1. Reward modeling from human preference data\n2. Circuit-level interpretability",
        ]);
        let config = PipelineConfig::default();
        let categories = generate_initial_categories(&generator, &[paper(1)], &config).unwrap();
        assert_eq!(categories, vec!["Reward modeling from human preference da", "Circuit-level interpretability"]);
    }

    #[test]
    fn test_only_samples_leading_papers() {
        let generator = ScriptedGenerator::new(["1. Anything goes here today"]);
        let config = PipelineConfig { sample_size: 2, ..Default::default() };
        let papers: Vec<Paper> = (0..5).map(paper).collect();
        generate_initial_categories(&generator, &papers, &config).unwrap();

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].1.contains("Title 1"));
        assert!(!prompts[0].1.contains("Title 2"));
        assert!(prompts[0].1.contains("Generate exactly 10 research categories"));
    }

    #[test]
    fn test_empty_papers_still_issue_request() {
        let generator = ScriptedGenerator::new(["1. Orphan category label here"]);
        let config = PipelineConfig::default();
        let categories = generate_initial_categories(&generator, &[], &config).unwrap();
        assert_eq!(categories, vec!["Orphan category label here"]);
        assert!(generator.prompts()[0].1.contains("[]"));
    }

    #[test]
    fn test_generation_failure_propagates() {
        let generator = ScriptedGenerator::new(Vec::<String>::new()).then_fail("quota exceeded");
        let config = PipelineConfig::default();
        let result = generate_initial_categories(&generator, &[paper(1)], &config);
        assert!(matches!(result, Err(GenSurvError::Generation(msg)) if msg == "quota exceeded"));
    }
}
