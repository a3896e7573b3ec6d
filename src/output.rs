//! Result types produced by a run.
//!
//! [`PageResult`] is written verbatim to each page's `result.json`, and
//! [`RunReport`] to `combined_results.json`, so their serde shapes are the
//! on-disk format.

use crate::schema::{ProductExtraction, ProductRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome of extracting one page.
///
/// Externally tagged, so the JSON form is either
/// `{"products": [...]}` or `{"error": "..."}` and never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PageResult {
    #[serde(rename = "products")]
    Success(Vec<ProductRecord>),
    #[serde(rename = "error")]
    Failure(String),
}

impl PageResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PageResult::Success(_))
    }

    /// Products found on the page; empty for a failure.
    pub fn products(&self) -> &[ProductRecord] {
        match self {
            PageResult::Success(products) => products,
            PageResult::Failure(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PageResult::Success(_) => None,
            PageResult::Failure(msg) => Some(msg),
        }
    }
}

impl From<ProductExtraction> for PageResult {
    fn from(extraction: ProductExtraction) -> Self {
        PageResult::Success(extraction.products)
    }
}

/// Aggregate counters for one processed document.
///
/// `successful_pages + failed_pages == total_pages` always holds for a
/// summary returned by [`crate::run::process_pdf_by_pages`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// File name of the source PDF.
    pub source_file: String,
    pub total_pages: usize,
    pub successful_pages: usize,
    pub failed_pages: usize,
    /// Local wall-clock time the run finished, `YYYY-MM-DD HH:MM:SS`.
    pub completed_at: String,
    pub output_directory: PathBuf,
}

/// Everything a run produced: the summary plus one result per page.
///
/// Keyed by page number because pages complete in arbitrary order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub page_results: BTreeMap<usize, PageResult>,
}

impl RunReport {
    /// Total products across all successful pages.
    pub fn product_count(&self) -> usize {
        self.page_results.values().map(|r| r.products().len()).sum()
    }

    /// All products in page order.
    pub fn products(&self) -> impl Iterator<Item = &ProductRecord> {
        self.page_results.values().flat_map(|r| r.products().iter())
    }
}
