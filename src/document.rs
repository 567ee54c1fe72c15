//! The paginated document being viewed.
//!
//! A [`Document`] is delivered once by the ingestion collaborator as JSON
//! (`{"filename", "total_pages", "pages": [{"page", "text"}]}`) and is
//! immutable afterwards. Page text is NFC-normalized at construction, so
//! every span computed by the engine indexes the text that is displayed.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::DocumentError;
use crate::normalize::normalize;

/// A single page of extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    /// NFC-normalized page text.
    pub text: String,
}

/// An ordered, contiguous sequence of pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    filename: Option<String>,
    pages: Vec<Page>,
}

// Wire shape of the ingestion collaborator's response.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    total_pages: Option<usize>,
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    page: usize,
    #[serde(default)]
    text: String,
}

impl Document {
    /// Build a document from `(page_number, text)` pairs.
    ///
    /// Pages may arrive in any order but must number exactly `1..=N`.
    pub fn from_pages<I, S>(filename: Option<String>, pages: I) -> Result<Self, DocumentError>
    where
        I: IntoIterator<Item = (usize, S)>,
        S: AsRef<str>,
    {
        let mut pages: Vec<Page> = pages
            .into_iter()
            .map(|(number, text)| Page {
                number,
                text: normalize(text.as_ref()),
            })
            .collect();

        if pages.is_empty() {
            return Err(DocumentError::EmptyDocument);
        }

        pages.sort_by_key(|p| p.number);
        for (idx, page) in pages.iter().enumerate() {
            let expected = idx + 1;
            if page.number != expected {
                return Err(DocumentError::NonContiguousPages {
                    expected,
                    found: page.number,
                });
            }
        }

        debug!(pages = pages.len(), ?filename, "document loaded");
        Ok(Self { filename, pages })
    }

    /// Parse the ingestion collaborator's JSON response.
    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        let actual = raw.pages.len();
        if let Some(declared) = raw.total_pages {
            if declared != actual {
                return Err(DocumentError::PageCountMismatch { declared, actual });
            }
        }
        Self::from_pages(raw.filename, raw.pages.into_iter().map(|p| (p.page, p.text)))
    }

    /// Read and parse a document JSON file.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Look up a page by its 1-based number.
    pub fn page(&self, number: usize) -> Option<&Page> {
        number.checked_sub(1).and_then(|idx| self.pages.get(idx))
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Returns `true` if `number` is a valid page of this document.
    pub fn contains_page(&self, number: usize) -> bool {
        (1..=self.total_pages()).contains(&number)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
