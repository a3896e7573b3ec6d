//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the dispatcher works through a document.
//!
//! # Example
//!
//! ```rust
//! use catalog_ocr::{ExtractionProgressCallback, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ProductCounter {
//!     products: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for ProductCounter {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, product_count: usize) {
//!         self.products.fetch_add(product_count, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} products", page_num, total_pages, product_count);
//!     }
//! }
//!
//! let counter = Arc::new(ProductCounter { products: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the dispatcher as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// `on_page_start` fires from inside the page futures, which run
/// concurrently. `on_page_complete` and `on_page_error` fire from the single
/// collector loop, in completion order.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after splitting, before any page is extracted.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the extraction request for a page is sent.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page's products have been extracted and saved.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, product_count: usize) {
        let _ = (page_num, total_pages, product_count);
    }

    /// Called when a page's extraction failed. The failure is still saved.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has a result and the run summaries
    /// are written.
    fn on_run_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
