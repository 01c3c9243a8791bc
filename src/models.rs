//! Paper and author records consumed by the heading pipeline.
//!
//! Records are validated on construction and immutable afterwards. The JSON
//! form accepted here matches what the retrieval layer exports, which is
//! loose about optional fields (empty strings for a missing year or venue).

use log::info;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{GenSurvError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

impl Author {
    pub fn new(id: Option<String>, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// A single paper record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPaper")]
pub struct Paper {
    id: String,
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    authors: Vec<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    citation_styles: Option<BTreeMap<String, String>>,
}

impl Paper {
    /// Start building a paper with its required fields.
    pub fn builder(id: impl Into<String>, title: impl Into<String>) -> PaperBuilder {
        PaperBuilder::new(id, title)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    pub fn venue(&self) -> Option<&str> {
        self.venue.as_deref()
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// Formatted citation for a style such as `"bibtex"`, if the record carries one.
    pub fn citation(&self, style: &str) -> Option<&str> {
        self.citation_styles
            .as_ref()
            .and_then(|styles| styles.get(style))
            .map(String::as_str)
    }

    pub fn has_abstract(&self) -> bool {
        self.abstract_text.is_some()
    }

    /// Text used to embed the paper: title and abstract joined by a space.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.abstract_text.as_deref().unwrap_or(""))
    }
}

/// Builder for [`Paper`]; `build` validates the record.
pub struct PaperBuilder {
    id: String,
    title: String,
    abstract_text: Option<String>,
    venue: Option<String>,
    year: Option<i32>,
    authors: Vec<Author>,
    citation_styles: Option<BTreeMap<String, String>>,
}

impl PaperBuilder {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            abstract_text: None,
            venue: None,
            year: None,
            authors: Vec::new(),
            citation_styles: None,
        }
    }

    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }

    pub fn citation_style(mut self, style: impl Into<String>, formatted: impl Into<String>) -> Self {
        self.citation_styles
            .get_or_insert_with(BTreeMap::new)
            .insert(style.into(), formatted.into());
        self
    }

    pub fn build(self) -> Result<Paper> {
        if self.id.trim().is_empty() {
            return Err(GenSurvError::InvalidPaper(format!(
                "paper '{}' has an empty id",
                self.title
            )));
        }
        Ok(Paper {
            id: self.id,
            title: self.title,
            abstract_text: self.abstract_text,
            venue: self.venue.filter(|v| !v.trim().is_empty()),
            year: self.year,
            authors: self.authors,
            citation_styles: self.citation_styles,
        })
    }
}

/// Loosely-typed JSON shape, validated into a [`Paper`].
#[derive(Deserialize)]
struct RawPaper {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    venue: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    year: Option<i32>,
    #[serde(default)]
    authors: Vec<Author>,
    #[serde(default)]
    citation_styles: Option<BTreeMap<String, String>>,
}

impl TryFrom<RawPaper> for Paper {
    type Error = GenSurvError;

    fn try_from(raw: RawPaper) -> Result<Self> {
        let mut builder = PaperBuilder::new(raw.id, raw.title.unwrap_or_default());
        builder.abstract_text = raw.abstract_text;
        builder.venue = raw.venue;
        builder.year = raw.year;
        builder.authors = raw.authors;
        builder.citation_styles = raw.citation_styles;
        builder.build()
    }
}

/// Accepts an integer, a numeric string, an empty string or null.
fn lenient_year<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YearField {
        Number(i64),
        Text(String),
    }

    match Option::<YearField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(YearField::Number(n)) => i32::try_from(n).map(Some).map_err(D::Error::custom),
        Some(YearField::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(YearField::Text(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid year '{}'", s))),
    }
}

/// Load a JSON array of papers, rejecting duplicate ids.
pub fn load_papers(path: &Path) -> Result<Vec<Paper>> {
    let content = fs::read_to_string(path)?;
    let papers: Vec<Paper> = serde_json::from_str(&content)?;

    let mut seen = HashSet::new();
    for paper in &papers {
        if !seen.insert(paper.id()) {
            return Err(GenSurvError::InvalidPaper(format!(
                "duplicate paper id '{}'",
                paper.id()
            )));
        }
    }

    info!("Loaded {} papers from {:?}", papers.len(), path);
    Ok(papers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_empty_id() {
        let result = Paper::builder("  ", "Some title").build();
        assert!(matches!(result, Err(GenSurvError::InvalidPaper(_))));
    }

    #[test]
    fn test_embedding_text_without_abstract() {
        let paper = Paper::builder("p1", "Reward models").build().unwrap();
        assert_eq!(paper.embedding_text(), "Reward models ");
        assert!(!paper.has_abstract());
    }

    #[test]
    fn test_deserialize_lenient_fields() {
        let json = r#"{
            "id": "1",
            "title": "Single-cell microbiology",
            "abstract": "Population level studies...",
            "venue": "",
            "year": "",
            "authors": [{"id": "", "name": ""}]
        }"#;
        let paper: Paper = serde_json::from_str(json).unwrap();
        assert_eq!(paper.year(), None);
        assert_eq!(paper.venue(), None);
        assert_eq!(paper.authors().len(), 1);
        assert_eq!(paper.citation("bibtex"), None);
    }

    #[test]
    fn test_deserialize_year_variants() {
        let numeric: Paper = serde_json::from_str(r#"{"id": "a", "title": "t", "year": 2023}"#).unwrap();
        assert_eq!(numeric.year(), Some(2023));

        let text: Paper = serde_json::from_str(r#"{"id": "b", "title": "t", "year": "2021"}"#).unwrap();
        assert_eq!(text.year(), Some(2021));

        let bad = serde_json::from_str::<Paper>(r#"{"id": "c", "title": "t", "year": "soon"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_citation_styles() {
        let paper = Paper::builder("p", "t")
            .citation_style("bibtex", "@article{p, title={t}}")
            .build()
            .unwrap();
        assert_eq!(paper.citation("bibtex"), Some("@article{p, title={t}}"));
        assert_eq!(paper.citation("apa"), None);
    }

    #[test]
    fn test_serialize_roundtrip_keeps_abstract_key() {
        let paper = Paper::builder("p", "t").abstract_text("a").year(2020).build().unwrap();
        let value = serde_json::to_value(&paper).unwrap();
        assert_eq!(value["abstract"], "a");
        let back: Paper = serde_json::from_value(value).unwrap();
        assert_eq!(back, paper);
    }
}
