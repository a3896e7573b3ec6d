//! Result persistence: per-page artifacts plus run-level summaries.
//!
//! ```text
//! <run dir>/
//!   001/result.json          {"products": [...]} or {"error": "..."}
//!   001/summary.txt          human-readable page rollup
//!   processing_summary.txt   run totals + one line per page
//!   combined_results.json    {"summary": {...}, "page_results": {"1": ...}}
//! ```
//!
//! Every write replaces the file, so saving the same page twice leaves the
//! same bytes on disk. Writes are plain (no temp file + rename): a crash
//! mid-run leaves whichever page directories were already written.

use crate::error::CatalogError;
use crate::output::{PageResult, RunReport, RunSummary};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const RESULT_FILE: &str = "result.json";
pub const PAGE_SUMMARY_FILE: &str = "summary.txt";
pub const RUN_SUMMARY_FILE: &str = "processing_summary.txt";
pub const COMBINED_FILE: &str = "combined_results.json";

const RULE: &str = "========================================";

/// Zero-padded page directory name: page 7 → `007`.
pub fn page_dir_name(page_num: usize) -> String {
    format!("{page_num:03}")
}

/// Write `result.json` and `summary.txt` for one page.
pub async fn save_page(
    output_dir: &Path,
    page_num: usize,
    result: &PageResult,
) -> Result<PathBuf, CatalogError> {
    let page_dir = output_dir.join(page_dir_name(page_num));
    tokio::fs::create_dir_all(&page_dir)
        .await
        .map_err(|e| write_failed(&page_dir, e))?;

    write_json(&page_dir.join(RESULT_FILE), result).await?;
    write_text(
        &page_dir.join(PAGE_SUMMARY_FILE),
        &format_page_summary(page_num, result),
    )
    .await?;

    debug!("Saved page {} → {}", page_num, page_dir.display());
    Ok(page_dir)
}

/// Write `processing_summary.txt`.
pub async fn save_summary(
    output_dir: &Path,
    summary: &RunSummary,
    page_results: &BTreeMap<usize, PageResult>,
) -> Result<(), CatalogError> {
    write_text(
        &output_dir.join(RUN_SUMMARY_FILE),
        &format_run_summary(summary, page_results),
    )
    .await
}

/// Write `combined_results.json`.
pub async fn save_combined(output_dir: &Path, report: &RunReport) -> Result<(), CatalogError> {
    write_json(&output_dir.join(COMBINED_FILE), report).await
}

/// Human-readable rollup for one page.
pub fn format_page_summary(page_num: usize, result: &PageResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Page {page_num} Processing Results");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out);

    match result {
        PageResult::Failure(error) => {
            let _ = writeln!(out, "ERROR: {error}");
        }
        PageResult::Success(products) => {
            let _ = writeln!(out, "{} products found", products.len());
            for (i, product) in products.iter().enumerate() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Product {}:", i + 1);
                let _ = writeln!(out, "  ID: {}", product.id);
                let _ = writeln!(out, "  Name: {}", product.name);
                let _ = writeln!(out, "  Size: {}", product.size);
                let _ = writeln!(out, "  Price: ${}", product.price);
                let _ = writeln!(out, "  Flower Data: {}", product.flower_data);
                let _ = writeln!(out, "  Foliage Data: {}", product.foliage_data);
                let _ = writeln!(out, "  Dimensions: {}", product.dimensions);
                let _ = writeln!(out, "  Construction Material: {}", product.construction_material);
            }
        }
    }
    out
}

/// Run totals followed by one line per page, in page order.
pub fn format_run_summary(summary: &RunSummary, page_results: &BTreeMap<usize, PageResult>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "PDF Processing Summary");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Source file: {}", summary.source_file);
    let _ = writeln!(out, "Total pages: {}", summary.total_pages);
    let _ = writeln!(out, "Successful pages: {}", summary.successful_pages);
    let _ = writeln!(out, "Failed pages: {}", summary.failed_pages);
    let _ = writeln!(out, "Completed at: {}", summary.completed_at);
    let _ = writeln!(out, "Output directory: {}", summary.output_directory.display());
    let _ = writeln!(out);
    let _ = writeln!(out, "Page Results:");

    for (page_num, result) in page_results {
        match result {
            PageResult::Success(products) => {
                let _ = writeln!(out, "  Page {page_num}: SUCCESS - {} products", products.len());
            }
            PageResult::Failure(error) => {
                let _ = writeln!(out, "  Page {page_num}: ERROR - {error}");
            }
        }
    }
    out
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CatalogError::Internal(format!("serialise {}: {e}", path.display())))?;
    write_text(path, &json).await
}

async fn write_text(path: &Path, contents: &str) -> Result<(), CatalogError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| write_failed(path, e))
}

fn write_failed(path: &Path, source: std::io::Error) -> CatalogError {
    CatalogError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    }
}
