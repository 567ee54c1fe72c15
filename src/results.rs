//! Search results delivered by the external search collaborator.
//!
//! A [`SearchResultSet`] is produced once per search request and replaced
//! wholesale on the next one; nothing in this crate mutates it. Exact
//! offsets are deserialized leniently (missing, null or negative values
//! survive parsing) because the locator is responsible for discarding
//! them, not the parser.

use std::path::Path;

use serde::Deserialize;

use crate::error::ResultsError;

/// A match location reported by the search service, in chars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ExactMatch {
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub length: Option<i64>,
}

impl ExactMatch {
    pub fn new(position: i64, length: i64) -> Self {
        Self {
            position: Some(position),
            length: Some(length),
        }
    }
}

/// One relevant page in a result set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageMatch {
    pub page: usize,
    /// Relevance in `[0, 1]`.
    #[serde(alias = "similarity", default)]
    pub score: f64,
    /// Short snippet of the page.
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "fullText")]
    pub full_text: Option<String>,
    #[serde(default, alias = "exactMatches")]
    pub exact_matches: Option<Vec<ExactMatch>>,
}

impl PageMatch {
    /// Score as a whole percentage, rounded half away from zero.
    pub fn score_percent(&self) -> u32 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u32
    }

    /// Exact offsets, if the service sent a non-empty list.
    pub fn exact(&self) -> Option<&[ExactMatch]> {
        self.exact_matches
            .as_deref()
            .filter(|matches| !matches.is_empty())
    }
}

/// The complete answer to one search request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResultSet {
    #[serde(default)]
    pub query: String,
    #[serde(default, alias = "totalPages")]
    pub total_pages: usize,
    #[serde(default)]
    pub results: Vec<PageMatch>,
}

impl SearchResultSet {
    /// Parse the search collaborator's JSON response.
    pub fn from_json_str(json: &str) -> Result<Self, ResultsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a results JSON file.
    pub fn load(path: &Path) -> Result<Self, ResultsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ResultsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Page of the first (most relevant) result.
    pub fn first_page(&self) -> Option<usize> {
        self.results.first().map(|r| r.page)
    }

    /// Distinct result pages in result order. The first entry for a page
    /// wins; later duplicates are ignored.
    pub fn distinct_pages(&self) -> Vec<&PageMatch> {
        let mut seen = Vec::new();
        let mut pages = Vec::new();
        for result in &self.results {
            if !seen.contains(&result.page) {
                seen.push(result.page);
                pages.push(result);
            }
        }
        pages
    }

    /// All result entries for a page, in result order.
    pub fn for_page(&self, page: usize) -> impl Iterator<Item = &PageMatch> {
        self.results.iter().filter(move |r| r.page == page)
    }

    /// Returns `true` if `page` appears in the results.
    pub fn contains_page(&self, page: usize) -> bool {
        self.results.iter().any(|r| r.page == page)
    }

    /// Human-readable summary, e.g. `Found 3 results for "cat"`.
    pub fn summary(&self) -> String {
        let count = self.results.len();
        format!(
            "Found {} result{} for \"{}\"",
            count,
            if count == 1 { "" } else { "s" },
            self.query
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "query": "catdog",
        "total_pages": 2,
        "results": [
            {"page": 2, "score": 0.91, "text": "catdog", "full_text": "catdog",
             "exact_matches": [{"position": 0, "length": 6}]},
            {"page": 1, "score": 0.456, "text": "catdog catdog..."}
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let set = SearchResultSet::from_json_str(SAMPLE).unwrap();
        assert_eq!(set.query, "catdog");
        assert_eq!(set.total_pages, 2);
        assert_eq!(set.results.len(), 2);
        assert_eq!(set.first_page(), Some(2));
        assert_eq!(set.results[0].exact().unwrap(), &[ExactMatch::new(0, 6)]);
        assert!(set.results[1].exact().is_none());
        assert!(set.results[1].full_text.is_none());
    }

    #[test]
    fn test_parse_similarity_alias_and_camel_case() {
        let json = r#"{"query": "x", "totalPages": 1, "results": [
            {"page": 1, "similarity": 0.5, "text": "x", "fullText": "x",
             "exactMatches": [{"position": 0, "length": 1}]}
        ]}"#;
        let set = SearchResultSet::from_json_str(json).unwrap();
        assert_eq!(set.total_pages, 1);
        assert_eq!(set.results[0].score, 0.5);
        assert_eq!(set.results[0].full_text.as_deref(), Some("x"));
        assert!(set.results[0].exact().is_some());
    }

    #[test]
    fn test_parse_lenient_exact_matches() {
        let json = r#"{"query": "x", "results": [
            {"page": 1, "text": "", "exact_matches": [
                {"position": null, "length": 3},
                {"position": -4, "length": 2},
                {"length": 1},
                {}
            ]}
        ]}"#;
        let set = SearchResultSet::from_json_str(json).unwrap();
        let exact = set.results[0].exact().unwrap();
        assert_eq!(exact.len(), 4);
        assert_eq!(exact[0].position, None);
        assert_eq!(exact[1].position, Some(-4));
        assert_eq!(exact[3], ExactMatch::default());
    }

    #[test]
    fn test_empty_exact_list_is_none() {
        let json = r#"{"query": "x", "results": [{"page": 1, "exact_matches": []}]}"#;
        let set = SearchResultSet::from_json_str(json).unwrap();
        assert!(set.results[0].exact().is_none());
    }

    #[test]
    fn test_distinct_pages_keeps_first_occurrence() {
        let json = r#"{"query": "x", "results": [
            {"page": 3, "score": 0.9},
            {"page": 1, "score": 0.8},
            {"page": 3, "score": 0.7}
        ]}"#;
        let set = SearchResultSet::from_json_str(json).unwrap();
        let pages: Vec<(usize, f64)> = set
            .distinct_pages()
            .iter()
            .map(|r| (r.page, r.score))
            .collect();
        assert_eq!(pages, vec![(3, 0.9), (1, 0.8)]);
        assert_eq!(set.for_page(3).count(), 2);
        assert!(set.contains_page(1));
        assert!(!set.contains_page(2));
    }

    #[test]
    fn test_score_percent_rounds() {
        let set = SearchResultSet::from_json_str(SAMPLE).unwrap();
        assert_eq!(set.results[0].score_percent(), 91);
        assert_eq!(set.results[1].score_percent(), 46);
    }

    #[test]
    fn test_summary() {
        let set = SearchResultSet::from_json_str(SAMPLE).unwrap();
        assert_eq!(set.summary(), "Found 2 results for \"catdog\"");
        let single = SearchResultSet {
            query: "q".to_string(),
            total_pages: 1,
            results: vec![set.results[0].clone()],
        };
        assert_eq!(single.summary(), "Found 1 result for \"q\"");
    }

    #[test]
    fn test_malformed_results() {
        assert!(matches!(
            SearchResultSet::from_json_str("[1, 2"),
            Err(ResultsError::Parse(_))
        ));
    }
}
