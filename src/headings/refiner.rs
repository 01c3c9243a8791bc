use log::{debug, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::headings::parser::{parse_category_list, truncate_label};
use crate::headings::sample_papers_json;
use crate::models::Paper;
use crate::provider::GenerationProvider;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that refines research categories based on academic papers.";

fn build_prompt(categories_json: &str, papers_json: &str, target: usize, max_chars: usize) -> String {
    format!(
        r#"Below are initial research categories and a sample of papers. Substantially refine the categories so they better represent the research areas.
Repeating the initial categories unchanged is not acceptable.

Your task:
1. Critically evaluate each initial category
2. Merge categories that overlap or duplicate each other
3. Split categories that are too broad
4. Introduce new categories where the papers call for them
5. Make every category distinct and non-overlapping
6. Return exactly {target} refined categories

Each refined category must:
1. Be between 20 and {max_chars} characters long
2. End on a complete word or concept, never mid-word
3. Use abbreviations where needed to stay within {max_chars} characters
4. Give deeper insight into the specific research area
5. Be more specific and distinctive than the initial categories
6. Reflect advanced methods, technologies or key concepts
7. Use precise terminology an expert in the field would use

Initial Categories:
{categories_json}

Sample Papers:
{papers_json}

Return the refined categories as a numbered list, one per line.

Refined Categories:"#
    )
}

/// Ask the generator to rework an initial category list.
///
/// The result aims at the same cardinality as `categories`. An empty result
/// is returned as-is; falling back to the initial list is the caller's call.
pub fn refine_categories<G>(
    generator: &G,
    categories: &[String],
    papers: &[Paper],
    config: &PipelineConfig,
) -> Result<Vec<String>>
where
    G: GenerationProvider + ?Sized,
{
    let categories_json = serde_json::to_string_pretty(categories)?;
    let papers_json = sample_papers_json(papers, config.sample_size)?;
    let prompt = build_prompt(&categories_json, &papers_json, categories.len(), config.max_label_chars);

    info!("Refining {} categories", categories.len());
    let raw_output = generator.generate(SYSTEM_PROMPT, &prompt)?;
    debug!("Raw refinement output:\n{}", raw_output);

    let refined: Vec<String> = parse_category_list(&raw_output)
        .iter()
        .map(|category| truncate_label(category, config.max_label_chars))
        .filter(|category| !category.is_empty())
        .collect();

    for (i, (initial, new)) in categories.iter().zip(refined.iter()).enumerate() {
        debug!("{:2}. {} -> {}", i + 1, initial, new);
    }

    info!("Refinement produced {} categories", refined.len());
    Ok(refined)
}
