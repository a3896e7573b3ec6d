//! Error types for the catalog-ocr library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CatalogError`] — **Fatal**: the run cannot proceed at all (missing
//!   input file, missing credential, the PDF could not be split, nothing to
//!   process). Returned as `Err(CatalogError)` from the top-level `run`
//!   functions.
//!
//! * [`ExtractionError`] — **Page-scoped**: a single extraction request
//!   failed (network error, malformed response) but sibling pages are
//!   unaffected. The page worker turns it into
//!   [`crate::output::PageResult::Failure`] so one bad page never aborts the
//!   document.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the catalog-ocr library.
///
/// Page-level failures use [`ExtractionError`] and are recorded in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum CatalogError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A required setting (credential, source path) was not provided.
    #[error("Missing required setting {key}.\n{hint}")]
    ConfigMissing { key: &'static str, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// A page could not be written out as a standalone document.
    ///
    /// Every page artifact created before the failure has already been
    /// deleted when this is returned.
    #[error("Failed to split '{path}' at page {page}: {detail}")]
    SplitFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// The source document has no pages; there is nothing to dispatch.
    #[error("PDF '{path}' contains no pages")]
    EmptyInput { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Whole-document extraction failed. Page-by-page runs never return
    /// this; they record the failure per page instead.
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed extraction request for one document.
///
/// `page` is the 1-based page hint when the document is a split page, and
/// `None` for whole-document requests.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// The service rejected the credential (HTTP 401/403). Not retried.
    #[error("authentication rejected{} (HTTP {status}): {detail}", page_hint(.page))]
    Auth {
        page: Option<usize>,
        status: u16,
        detail: String,
    },

    /// Network failure or a non-success HTTP status.
    #[error("API request failed{}: {detail}", page_hint(.page))]
    Transport { page: Option<usize>, detail: String },

    /// HTTP 2xx, but the envelope lacks the expected keys.
    #[error("Unexpected API response format{}: {detail}", page_hint(.page))]
    ResponseFormat { page: Option<usize>, detail: String },

    /// The response body is not valid JSON.
    #[error("Invalid JSON response from API{}: {detail}", page_hint(.page))]
    Decode { page: Option<usize>, detail: String },

    /// The document to upload could not be read from disk.
    #[error("Could not read document '{path}': {detail}")]
    DocumentUnreadable { path: PathBuf, detail: String },
}

fn page_hint(page: &Option<usize>) -> String {
    match page {
        Some(p) => format!(" for page {p}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_display_includes_page_hint() {
        let e = ExtractionError::Transport {
            page: Some(2),
            detail: "connection reset".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 2"), "got: {msg}");
        assert!(msg.contains("connection reset"), "got: {msg}");
    }

    #[test]
    fn transport_display_without_page_hint() {
        let e = ExtractionError::Transport {
            page: None,
            detail: "dns failure".into(),
        };
        assert_eq!(e.to_string(), "API request failed: dns failure");
    }

    #[test]
    fn auth_display() {
        let e = ExtractionError::Auth {
            page: Some(1),
            status: 401,
            detail: "invalid key".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("invalid key"));
    }

    #[test]
    fn split_failed_display() {
        let e = CatalogError::SplitFailed {
            path: PathBuf::from("catalog.pdf"),
            page: 3,
            detail: "disk full".into(),
        };
        assert!(e.to_string().contains("page 3"));
    }

    #[test]
    fn extraction_error_converts_into_catalog_error() {
        let e: CatalogError = ExtractionError::Decode {
            page: None,
            detail: "expected value".into(),
        }
        .into();
        assert!(matches!(e, CatalogError::Extraction(_)));
        assert!(e.to_string().contains("Invalid JSON"));
    }
}
