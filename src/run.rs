//! Run-level entry points: page-by-page dispatch and whole-document mode.
//!
//! [`process_pdf_by_pages`] is the main path. It splits the source, keeps up
//! to `max_workers` page extractions in flight, and saves each page the
//! moment it completes. Results are keyed by page number because they
//! arrive in completion order, not page order.
//!
//! [`extract_document`] sends the whole PDF in one request. It is simpler
//! but a single failure loses every page, so it is mostly useful for short
//! documents and for checking credentials.

use crate::config::{ClientConfig, PipelineConfig};
use crate::error::CatalogError;
use crate::output::{PageResult, RunReport, RunSummary};
use crate::pipeline::extract::{ProductExtractor, VisionAgentClient};
use crate::pipeline::input::{self, SourceDocument};
use crate::pipeline::split::{DocumentSplitter, PageDocument, PdfiumSplitter};
use crate::pipeline::{naming, persist, worker};
use crate::schema::ProductExtraction;
use chrono::Local;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract products from every page of a PDF, in parallel.
///
/// # Arguments
/// * `source` — path to the catalog PDF
/// * `config` — worker budget, output root, and extractor/splitter overrides
///
/// # Returns
/// `Ok(RunReport)` once every page has a result, even if some or all pages
/// failed (check `report.summary.failed_pages`).
///
/// # Errors
/// Returns `Err(CatalogError)` only for run-level failures:
/// - source not found / not a PDF
/// - no credential configured
/// - the split failed (no page files are left behind)
/// - the PDF has no pages ([`CatalogError::EmptyInput`]; no output
///   directory is created)
/// - an output file could not be written (pages already in flight still
///   finish; no further page is started)
pub async fn process_pdf_by_pages(
    source: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunReport, CatalogError> {
    let total_start = Instant::now();
    let source = input::resolve_source(source)?;
    info!("Starting page-by-page extraction: {}", source.path().display());

    // ── Step 1: Resolve extractor (pre-flight, before any file is written) ─
    let extractor = resolve_extractor(config)?;

    // ── Step 2: Split into single-page documents ─────────────────────────
    let pages = split_source(&source, config).await?;
    let total_pages = pages.len();
    if total_pages == 0 {
        return Err(CatalogError::EmptyInput {
            path: source.path().to_path_buf(),
        });
    }

    // ── Step 3: Create the run directory ─────────────────────────────────
    let source_file = source.display_name();
    let output_dir =
        naming::create_output_directory(&config.output_root, Some(&source_file)).await?;
    info!(
        "Processing {} pages with {} workers → {}",
        total_pages,
        config.max_workers,
        output_dir.display()
    );

    let progress = config.progress_callback.as_ref();
    if let Some(cb) = progress {
        cb.on_run_start(total_pages);
    }

    // ── Step 4: Dispatch pages, collect in completion order ──────────────
    // Each page is saved inside its own future. After a write failure no new
    // page is started; pages already in flight run to completion.
    let extractor: &dyn ProductExtractor = extractor.as_ref();
    let halted = AtomicBool::new(false);
    let halted = &halted;
    let run_dir = output_dir.as_path();
    let mut completions = stream::iter(pages.into_iter().map(move |page| async move {
        if halted.load(Ordering::SeqCst) {
            debug!("Page {}: not started after output failure", page.page_num());
            return None;
        }
        let (page_num, result) = worker::process_page(extractor, page, total_pages, progress).await;
        let saved = persist::save_page(run_dir, page_num, &result).await;
        Some((page_num, result, saved))
    }))
    .buffer_unordered(config.max_workers);

    let mut page_results: BTreeMap<usize, PageResult> = BTreeMap::new();
    let mut successful_pages = 0;
    let mut failed_pages = 0;
    let mut write_error: Option<CatalogError> = None;

    while let Some(completion) = completions.next().await {
        let Some((page_num, result, saved)) = completion else {
            continue;
        };
        if let Err(e) = saved {
            if write_error.is_none() {
                warn!("Page {}: {}; draining in-flight pages", page_num, e);
                halted.store(true, Ordering::SeqCst);
                write_error = Some(e);
            }
            continue;
        }

        match &result {
            PageResult::Success(products) => {
                successful_pages += 1;
                if let Some(cb) = progress {
                    cb.on_page_complete(page_num, total_pages, products.len());
                }
            }
            PageResult::Failure(error) => {
                failed_pages += 1;
                if let Some(cb) = progress {
                    cb.on_page_error(page_num, total_pages, error);
                }
            }
        }
        page_results.insert(page_num, result);
    }
    drop(completions);

    if let Some(e) = write_error {
        return Err(e);
    }

    // ── Step 5: Run-level summary and combined report ────────────────────
    let summary = RunSummary {
        source_file,
        total_pages,
        successful_pages,
        failed_pages,
        completed_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        output_directory: output_dir.clone(),
    };
    persist::save_summary(&output_dir, &summary, &page_results).await?;

    let report = RunReport {
        summary,
        page_results,
    };
    persist::save_combined(&output_dir, &report).await?;

    info!(
        "Extraction complete: {}/{} pages, {} products, {}ms total",
        successful_pages,
        total_pages,
        report.product_count(),
        total_start.elapsed().as_millis()
    );

    if let Some(cb) = progress {
        cb.on_run_complete(total_pages, successful_pages);
    }

    Ok(report)
}

/// Synchronous wrapper around [`process_pdf_by_pages`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_pdf_by_pages_sync(
    source: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunReport, CatalogError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CatalogError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_pdf_by_pages(source, config))
}

/// Extract products from the whole PDF in a single request.
///
/// Nothing is written to disk. Any extraction failure is returned as
/// [`CatalogError::Extraction`].
pub async fn extract_document(
    source: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ProductExtraction, CatalogError> {
    let source = input::resolve_source(source)?;
    let extractor = resolve_extractor(config)?;

    let start = Instant::now();
    let extraction = extractor.extract(source.path(), None).await?;
    info!(
        "Extracted {} products from {} in {}ms",
        extraction.products.len(),
        source.display_name(),
        start.elapsed().as_millis()
    );
    Ok(extraction)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the extractor, from most-specific to least-specific:
///
/// 1. **Injected extractor** (`config.extractor`) — used as-is.
/// 2. **Client config** (`config.client`) — build the HTTP client from it.
/// 3. **Environment** — `ClientConfig::from_env()`, which fails with
///    [`CatalogError::ConfigMissing`] when `VISION_AGENT_API_KEY` is unset.
fn resolve_extractor(config: &PipelineConfig) -> Result<Arc<dyn ProductExtractor>, CatalogError> {
    if let Some(ref extractor) = config.extractor {
        return Ok(Arc::clone(extractor));
    }

    let client = match config.client {
        Some(ref client) => client.clone(),
        None => ClientConfig::from_env()?,
    };
    debug!("Using extraction endpoint {}", client.endpoint());

    Ok(Arc::new(VisionAgentClient::new(&client)?))
}

/// Split the source on the blocking pool and check the page numbering.
async fn split_source(
    source: &SourceDocument,
    config: &PipelineConfig,
) -> Result<Vec<PageDocument>, CatalogError> {
    let splitter: Arc<dyn DocumentSplitter> = match config.splitter {
        Some(ref splitter) => Arc::clone(splitter),
        None => Arc::new(PdfiumSplitter::default()),
    };
    let path = source.path().to_path_buf();
    let scratch_dir = config
        .scratch_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);

    let start = Instant::now();
    let pages = tokio::task::spawn_blocking(move || splitter.split(&path, &scratch_dir))
        .await
        .map_err(|e| CatalogError::Internal(format!("Split task panicked: {}", e)))??;

    if let Some((expected, page)) = pages
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, p))
        .find(|(expected, p)| p.page_num() != *expected)
    {
        return Err(CatalogError::Internal(format!(
            "splitter returned page {} at position {}",
            page.page_num(),
            expected
        )));
    }

    info!(
        "Split into {} pages in {}ms",
        pages.len(),
        start.elapsed().as_millis()
    );
    Ok(pages)
}
