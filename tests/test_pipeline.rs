use gensurv::provider::mock::{KeywordEmbedder, ScriptedGenerator, StaticEmbedder};
use gensurv::{generate_headings, GenSurvError, Paper, PipelineConfig};
use std::collections::HashSet;

const CATEGORIES: &str = "1. Feedback\n2. Mechanistic Interpretability";

fn paper(id: &str, title: &str, abstract_text: &str) -> Paper {
    Paper::builder(id, title)
        .abstract_text(abstract_text)
        .build()
        .unwrap()
}

fn corpus() -> Vec<Paper> {
    vec![
        paper("rlhf-1", "Training language models with human feedback", "We fine-tune policies on human feedback comparisons."),
        paper("rlhf-2", "Scaling laws for reward model overoptimization", "Reward models trained from human feedback can be gamed."),
        paper("rlhf-3", "Constitutional methods", "Replacing human feedback with AI feedback for harmlessness."),
        paper("rlhf-4", "Direct preference optimization", "An alternative to RL from human feedback without a reward model."),
        paper("interp-1", "Toy models of superposition", "Mechanistic interpretability of features stored in superposition."),
        paper("interp-2", "Towards monosemanticity", "Dictionary learning as a path to interpretability of transformers."),
    ]
}

fn embedder() -> KeywordEmbedder {
    KeywordEmbedder::new(["feedback", "interpretab"])
}

#[test]
fn test_end_to_end_feedback_and_interpretability() {
    let generator = ScriptedGenerator::new([CATEGORIES, CATEGORIES]);
    let papers = corpus();

    let headings = generate_headings(&papers, &embedder(), &generator, &PipelineConfig::default()).unwrap();

    assert_eq!(headings.labels(), vec!["Feedback", "Mechanistic Interpretability"]);
    let feedback: Vec<&str> = headings.get("Feedback").unwrap().iter().map(|p| p.id()).collect();
    assert_eq!(feedback, vec!["rlhf-1", "rlhf-2", "rlhf-3", "rlhf-4"]);
    let interp: Vec<&str> = headings
        .get("Mechanistic Interpretability")
        .unwrap()
        .iter()
        .map(|p| p.id())
        .collect();
    assert_eq!(interp, vec!["interp-1", "interp-2"]);
    assert!(headings.get("Error").is_none());
    assert_eq!(generator.prompts().len(), 2);
}

#[test]
fn test_partition_and_no_empty_buckets() {
    let generator = ScriptedGenerator::new([
        "1. Feedback\n2. Mechanistic Interpretability\n3. Robotics and embodied agents",
        "1. Feedback\n2. Mechanistic Interpretability\n3. Robotics and embodied agents",
    ]);
    let mut papers = corpus();
    papers.push(paper("offtopic", "Protein folding", "Structure prediction from sequence."));
    papers.push(Paper::builder("no-abstract", "A paper with human feedback in the title").build().unwrap());

    let headings = generate_headings(&papers, &embedder(), &generator, &PipelineConfig::default()).unwrap();

    let mut seen = HashSet::new();
    for heading in headings.iter() {
        assert!(!heading.papers.is_empty(), "bucket {} is empty", heading.heading);
        for paper in &heading.papers {
            assert!(seen.insert(paper.id().to_string()), "{} filed twice", paper.id());
        }
    }
    let expected: HashSet<String> = papers
        .iter()
        .filter(|p| p.has_abstract())
        .map(|p| p.id().to_string())
        .collect();
    assert_eq!(seen, expected);

    assert_eq!(headings.get("Error").unwrap()[0].id(), "offtopic");
    assert!(headings.get("Robotics and embodied agents").is_none());
    assert_eq!(headings.labels().last(), Some(&"Error"));
}

#[test]
fn test_empty_refinement_falls_back_to_initial_categories() {
    let generator = ScriptedGenerator::new([CATEGORIES, "Refined Categories:\n\n"]);
    let papers = corpus();

    let headings = generate_headings(&papers, &embedder(), &generator, &PipelineConfig::default()).unwrap();

    let labels: HashSet<&str> = headings.labels().into_iter().collect();
    assert_eq!(labels, HashSet::from(["Feedback", "Mechanistic Interpretability"]));
    assert_eq!(headings.total_papers(), 6);
}

#[test]
fn test_generation_failure_aborts_run() {
    let generator = ScriptedGenerator::new(Vec::<String>::new()).then_fail("rate limited");
    let result = generate_headings(&corpus(), &embedder(), &generator, &PipelineConfig::default());
    assert!(matches!(result, Err(GenSurvError::Generation(_))));
}

#[test]
fn test_refinement_failure_is_not_masked_by_fallback() {
    let generator = ScriptedGenerator::new([CATEGORIES]).then_fail("timeout");
    let result = generate_headings(&corpus(), &embedder(), &generator, &PipelineConfig::default());
    assert!(matches!(result, Err(GenSurvError::Generation(msg)) if msg == "timeout"));
}

#[test]
fn test_embedding_failure_aborts_run() {
    let generator = ScriptedGenerator::new([CATEGORIES, CATEGORIES]);
    let result = generate_headings(&corpus(), &StaticEmbedder::new(), &generator, &PipelineConfig::default());
    assert!(matches!(result, Err(GenSurvError::Embedding(_))));
}

#[test]
fn test_empty_corpus_is_handled() {
    let generator = ScriptedGenerator::new([CATEGORIES, CATEGORIES]);
    let headings = generate_headings(&[], &embedder(), &generator, &PipelineConfig::default()).unwrap();
    assert!(headings.is_empty());
    assert!(generator.prompts()[0].1.contains("[]"));
}

#[test]
fn test_unusable_generation_output_degrades_to_unclassified() {
    let generator = ScriptedGenerator::new(["Sorry, I cannot help with that:", ""]);
    let headings = generate_headings(&corpus(), &embedder(), &generator, &PipelineConfig::default()).unwrap();
    assert_eq!(headings.labels(), vec!["Error"]);
    assert_eq!(headings.total_papers(), 6);
}

#[test]
fn test_long_labels_are_truncated() {
    let long = "1. Feedback-driven policy optimisation for large language models";
    let generator = ScriptedGenerator::new([long, long]);
    let headings = generate_headings(&corpus(), &embedder(), &generator, &PipelineConfig::default()).unwrap();
    assert_eq!(headings.labels()[0], "Feedback-driven policy optimisation for");
    assert!(headings.labels().iter().all(|l| l.chars().count() <= 40));
}

#[test]
fn test_custom_unclassified_label() {
    let generator = ScriptedGenerator::new([CATEGORIES, CATEGORIES]);
    let mut papers = corpus();
    papers.push(paper("offtopic", "Protein folding", "Structure prediction."));
    let config = PipelineConfig {
        unclassified_label: "Other".to_string(),
        ..Default::default()
    };
    let headings = generate_headings(&papers, &embedder(), &generator, &config).unwrap();
    assert_eq!(headings.get("Other").unwrap().len(), 1);
}

#[test]
fn test_category_named_like_unclassified_bucket_is_dropped() {
    let generator = ScriptedGenerator::new(["1. Feedback\n2. Other", "1. Feedback\n2. Other"]);
    let papers = vec![
        paper("a", "RLHF", "human feedback"),
        paper("c", "Protein folding", "structure prediction"),
    ];
    // No vector for "Other": embedding it as a category would fail the run.
    let embedder = StaticEmbedder::new()
        .with("Feedback", vec![1.0, 0.0])
        .with("RLHF human feedback", vec![0.9, 0.1])
        .with("Protein folding structure prediction", vec![0.0, 1.0]);
    let config = PipelineConfig {
        unclassified_label: "Other".to_string(),
        ..Default::default()
    };

    let headings = generate_headings(&papers, &embedder, &generator, &config).unwrap();

    assert_eq!(headings.labels(), vec!["Feedback", "Other"]);
    assert_eq!(headings.get("Feedback").unwrap()[0].id(), "a");
    let other: Vec<&str> = headings.get("Other").unwrap().iter().map(|p| p.id()).collect();
    assert_eq!(other, vec!["c"]);
}

#[test]
fn test_categories_are_embedded_once_per_run() {
    let generator = ScriptedGenerator::new([CATEGORIES, CATEGORIES]);
    let papers = vec![
        paper("a", "RLHF", "human feedback"),
        paper("b", "Circuits", "interpretability"),
    ];
    let embedder = StaticEmbedder::new()
        .with("Feedback", vec![1.0, 0.0])
        .with("Mechanistic Interpretability", vec![0.0, 1.0])
        .with("RLHF human feedback", vec![0.9, 0.1])
        .with("Circuits interpretability", vec![0.1, 0.9]);

    let headings = generate_headings(&papers, &embedder, &generator, &PipelineConfig::default()).unwrap();

    assert_eq!(headings.labels(), vec!["Feedback", "Mechanistic Interpretability"]);
    assert_eq!(embedder.calls(), 4);
}
