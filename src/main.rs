use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

use gensurv::evaluate::{compare_paper_counts, evaluate_headings, load_reference_headings};
use gensurv::{generate_headings, load_papers, OpenAIClient, PipelineConfig};

/// CLI app for grouping a paper corpus under generated survey headings
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with the paper corpus
    #[arg(short, long)]
    papers: PathBuf,
    /// Reference headings to evaluate the result against
    #[arg(short, long)]
    eval_headings: Option<PathBuf>,
    /// Output file (prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Number of categories to ask for
    #[arg(short = 'n', long, default_value_t = gensurv::config::DEFAULT_NUM_CATEGORIES)]
    num_categories: usize,
    /// Number of leading papers shown to the language model
    #[arg(long, default_value_t = gensurv::config::DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,
    /// Minimum similarity for a paper to be filed under a heading
    #[arg(short, long, default_value_t = gensurv::config::DEFAULT_MIN_CONFIDENCE)]
    threshold: f32,
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Configure logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let papers = load_papers(&args.papers)
        .with_context(|| format!("Failed to load papers from {:?}", args.papers))?;
    if papers.is_empty() {
        anyhow::bail!("No papers found in {:?}", args.papers);
    }

    let config = PipelineConfig {
        num_categories: args.num_categories,
        sample_size: args.sample_size,
        min_confidence: args.threshold,
        ..Default::default()
    };
    config.validate()?;

    let client = OpenAIClient::from_env().context("Failed to configure the OpenAI client")?;

    info!("Generating headings for {} papers", papers.len());
    let headings = generate_headings(&papers, &client, &client, &config)?;

    if let Some(eval_path) = &args.eval_headings {
        let reference = load_reference_headings(eval_path)
            .with_context(|| format!("Failed to load reference headings from {:?}", eval_path))?;
        let report = evaluate_headings(&headings, &reference);
        eprintln!("{}", report);

        let counts = compare_paper_counts(&headings, &reference);
        eprintln!("Total papers in generated headings: {}", counts.generated);
        eprintln!("Total papers in reference headings: {}", counts.reference);
        if !counts.matches() {
            warn!("Paper counts differ between generated and reference headings");
        }
    }

    let output = serde_json::to_string_pretty(&headings)?;
    if let Some(output_file) = &args.output {
        fs::write(output_file, output)
            .with_context(|| format!("Failed to write output to {:?}", output_file))?;
        info!("Output written to {:?}", output_file);
    } else {
        println!("{}", output);
    }

    Ok(())
}
