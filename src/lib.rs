//! Heading generation and paper classification for literature-survey drafts.
//!
//! Given a corpus of papers, the pipeline asks a language model for candidate
//! section headings, refines them, orders them so related topics sit next to
//! each other, and files every paper under its closest heading by embedding
//! similarity.
//!
//! ```no_run
//! use gensurv::{generate_headings, OpenAIClient, PipelineConfig};
//! use std::path::Path;
//!
//! # fn main() -> gensurv::Result<()> {
//! let papers = gensurv::load_papers(Path::new("papers.json"))?;
//! let client = OpenAIClient::from_env()?;
//! let headings = generate_headings(&papers, &client, &client, &PipelineConfig::default())?;
//! for heading in headings.iter() {
//!     println!("{} ({} papers)", heading.heading, heading.papers.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod evaluate;
pub mod headings;
pub mod models;
pub mod provider;

pub use config::PipelineConfig;
pub use error::{GenSurvError, Result};
pub use headings::{generate_headings, Heading, Headings};
pub use models::{load_papers, Author, Paper};
pub use provider::openai::{OpenAIClient, OpenAIConfig};
pub use provider::{EmbeddingProvider, GenerationProvider};
