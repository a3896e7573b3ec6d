//! Page worker: extract one split page and always clean up after it.
//!
//! [`process_page`] has no error path. Whatever the extractor returns is
//! folded into a [`PageResult`], so a failing page can never take its
//! siblings down with it, and the page file is deleted before returning.

use crate::output::PageResult;
use crate::pipeline::extract::ProductExtractor;
use crate::pipeline::split::PageDocument;
use crate::progress::ProgressCallback;
use std::time::Instant;
use tracing::{debug, warn};

/// Extract products from one page and release its file.
///
/// Consumes the [`PageDocument`]; the file is gone when this returns. If
/// the returned future is dropped before completion, dropping the captured
/// `PageDocument` removes the file instead.
pub async fn process_page(
    extractor: &dyn ProductExtractor,
    page: PageDocument,
    total_pages: usize,
    progress: Option<&ProgressCallback>,
) -> (usize, PageResult) {
    let page_num = page.page_num();
    let start = Instant::now();

    if let Some(cb) = progress {
        cb.on_page_start(page_num, total_pages);
    }

    let result = match extractor.extract(page.path(), Some(page_num)).await {
        Ok(extraction) => {
            debug!(
                "Page {}: {} products in {:?}",
                page_num,
                extraction.products.len(),
                start.elapsed()
            );
            PageResult::from(extraction)
        }
        Err(e) => {
            warn!("Page {}: {}", page_num, e);
            PageResult::Failure(e.to_string())
        }
    };

    if let Err(e) = page.close() {
        warn!("Page {}: could not remove page file: {}", page_num, e);
    }

    (page_num, result)
}
