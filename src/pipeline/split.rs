//! Document splitting: one standalone single-page PDF per source page.
//!
//! ## Ownership of page files
//!
//! Each page file is wrapped in a [`PageDocument`], which owns a
//! [`tempfile::TempPath`]. Whoever holds the `PageDocument` owns the file:
//! dropping it (after success, after failure, or because the run future was
//! dropped mid-flight) deletes the file. Nothing has to remember to clean up.
//!
//! ## Partial failure
//!
//! [`materialize_pages`] writes pages in order. If page *k* fails, the
//! `PageDocument`s for pages `1..k` are closed before
//! [`CatalogError::SplitFailed`] is returned, so a failed split leaves no
//! files behind.

use crate::error::CatalogError;
use pdfium_render::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, info, warn};

/// One page of the source, materialised as its own PDF file.
pub struct PageDocument {
    page_num: usize,
    path: TempPath,
}

impl PageDocument {
    /// Take ownership of `path` as the artifact for 1-based `page_num`.
    pub fn new(page_num: usize, path: TempPath) -> Self {
        Self { page_num, path }
    }

    pub fn page_num(&self) -> usize {
        self.page_num
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the page file now, reporting any I/O error.
    ///
    /// Dropping a `PageDocument` also deletes the file, but silently.
    pub fn close(self) -> std::io::Result<()> {
        self.path.close()
    }
}

impl fmt::Debug for PageDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageDocument")
            .field("page_num", &self.page_num)
            .field("path", &self.path.to_path_buf())
            .finish()
    }
}

/// Splits a source document into single-page documents.
///
/// Implementations must return pages numbered `1..=N` in source order, and
/// must not leave page files behind when they return an error.
pub trait DocumentSplitter: Send + Sync {
    /// Split `source`, writing page files into `scratch_dir`.
    fn split(&self, source: &Path, scratch_dir: &Path) -> Result<Vec<PageDocument>, CatalogError>;
}

/// Create one temp file per page in `scratch_dir` and fill it via `write_page`.
///
/// `write_page` receives the 0-based source page index and the destination
/// path. On its first error every page file created so far is removed and
/// [`CatalogError::SplitFailed`] is returned for that page.
pub fn materialize_pages<F>(
    source: &Path,
    page_count: usize,
    scratch_dir: &Path,
    mut write_page: F,
) -> Result<Vec<PageDocument>, CatalogError>
where
    F: FnMut(usize, &Path) -> Result<(), String>,
{
    let mut pages = Vec::with_capacity(page_count);

    for idx in 0..page_count {
        let page_num = idx + 1;

        let temp = match tempfile::Builder::new()
            .prefix(&format!("page-{page_num:03}-"))
            .suffix(".pdf")
            .tempfile_in(scratch_dir)
        {
            Ok(file) => file.into_temp_path(),
            Err(e) => return Err(abort_split(source, page_num, e.to_string(), pages)),
        };

        if let Err(detail) = write_page(idx, &temp) {
            drop(temp);
            return Err(abort_split(source, page_num, detail, pages));
        }

        debug!("Wrote page {} → {}", page_num, temp.display());
        pages.push(PageDocument::new(page_num, temp));
    }

    Ok(pages)
}

/// Remove already-written pages and build the error for the failed one.
fn abort_split(
    source: &Path,
    page_num: usize,
    detail: String,
    created: Vec<PageDocument>,
) -> CatalogError {
    let removed = created.len();
    for page in created {
        let page_num = page.page_num();
        if let Err(e) = page.close() {
            warn!("Could not remove split page {}: {}", page_num, e);
        }
    }
    warn!(
        "Split of '{}' failed at page {}; removed {} page files",
        source.display(),
        page_num,
        removed
    );

    CatalogError::SplitFailed {
        path: source.to_path_buf(),
        page: page_num,
        detail,
    }
}

/// Splits PDFs with pdfium, copying each page into a fresh document.
///
/// The copy is page-for-page: content streams, images and resources are
/// carried over untouched, so the remote service sees exactly what the
/// source page contains.
#[derive(Debug, Clone, Default)]
pub struct PdfiumSplitter {
    library_path: Option<PathBuf>,
}

impl PdfiumSplitter {
    /// Use the pdfium library at `path` instead of the auto-managed copy.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, CatalogError> {
        let bound = match &self.library_path {
            Some(path) => pdfium_auto::bind_pdfium_from_path(path),
            None => pdfium_auto::bind_pdfium_silent(),
        };
        bound.map_err(|e| CatalogError::PdfiumBindingFailed(e.to_string()))
    }
}

impl DocumentSplitter for PdfiumSplitter {
    fn split(&self, source: &Path, scratch_dir: &Path) -> Result<Vec<PageDocument>, CatalogError> {
        if !source.exists() {
            return Err(CatalogError::FileNotFound {
                path: source.to_path_buf(),
            });
        }

        let pdfium = self.bind()?;
        let document =
            pdfium
                .load_pdf_from_file(source, None)
                .map_err(|e| CatalogError::CorruptPdf {
                    path: source.to_path_buf(),
                    detail: format!("{:?}", e),
                })?;

        let page_count = document.pages().len() as usize;
        info!("PDF loaded: {} pages", page_count);

        materialize_pages(source, page_count, scratch_dir, |idx, dest| {
            let mut single = pdfium.create_new_pdf().map_err(|e| format!("{:?}", e))?;
            single
                .pages_mut()
                .copy_page_from_document(&document, idx as PdfPageIndex, 0)
                .map_err(|e| format!("{:?}", e))?;
            single.save_to_file(dest).map_err(|e| format!("{:?}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn pages_are_numbered_from_one_in_order() {
        let scratch = tempfile::tempdir().unwrap();
        let pages = materialize_pages(Path::new("catalog.pdf"), 4, scratch.path(), |idx, dest| {
            std::fs::write(dest, format!("page {idx}")).map_err(|e| e.to_string())
        })
        .unwrap();

        let numbers: Vec<usize> = pages.iter().map(PageDocument::page_num).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        for (i, page) in pages.iter().enumerate() {
            assert!(page.path().starts_with(scratch.path()));
            assert_eq!(std::fs::read_to_string(page.path()).unwrap(), format!("page {i}"));
        }
    }

    #[test]
    fn zero_pages_yields_empty_list() {
        let scratch = tempfile::tempdir().unwrap();
        let pages = materialize_pages(Path::new("empty.pdf"), 0, scratch.path(), |_, _| {
            panic!("no page should be written")
        })
        .unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn failure_midway_removes_created_pages() {
        let scratch = tempfile::tempdir().unwrap();
        let written = RefCell::new(Vec::new());

        let err = materialize_pages(Path::new("catalog.pdf"), 5, scratch.path(), |idx, dest| {
            written.borrow_mut().push(dest.to_path_buf());
            if idx == 2 {
                return Err("xref stream truncated".to_string());
            }
            std::fs::write(dest, b"%PDF-1.7").map_err(|e| e.to_string())
        })
        .unwrap_err();

        match err {
            CatalogError::SplitFailed { page, detail, .. } => {
                assert_eq!(page, 3);
                assert!(detail.contains("truncated"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let written = written.into_inner();
        assert_eq!(written.len(), 3);
        for path in &written {
            assert!(!path.exists(), "leaked {}", path.display());
        }
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn dropping_a_page_deletes_its_file() {
        let scratch = tempfile::tempdir().unwrap();
        let mut pages = materialize_pages(Path::new("catalog.pdf"), 2, scratch.path(), |_, dest| {
            std::fs::write(dest, b"%PDF-1.7").map_err(|e| e.to_string())
        })
        .unwrap();

        let second = pages.pop().unwrap();
        let second_path = second.path().to_path_buf();
        drop(second);
        assert!(!second_path.exists());

        let first = pages.pop().unwrap();
        let first_path = first.path().to_path_buf();
        first.close().unwrap();
        assert!(!first_path.exists());
    }

    #[test]
    fn pdfium_splitter_reports_missing_source() {
        let scratch = tempfile::tempdir().unwrap();
        let err = PdfiumSplitter::default()
            .split(Path::new("/definitely/not/here.pdf"), scratch.path())
            .unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound { .. }));
    }

    #[test]
    fn explicit_library_path_is_used_for_binding() {
        let scratch = tempfile::tempdir().unwrap();
        let source = scratch.path().join("catalog.pdf");
        std::fs::write(&source, b"%PDF-1.7\n").unwrap();

        let splitter = PdfiumSplitter::with_library(scratch.path().join("libpdfium-missing.so"));
        let err = splitter.split(&source, scratch.path()).unwrap_err();
        match err {
            CatalogError::PdfiumBindingFailed(detail) => {
                assert!(detail.contains("libpdfium-missing"), "detail: {detail}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
