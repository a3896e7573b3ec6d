//! # catalog-ocr
//!
//! Extract structured product records from scanned PDF catalogs.
//!
//! ## Why page by page?
//!
//! The document-analysis service handles one PDF per request, and a long
//! catalog sent whole takes minutes and fails as a unit. Splitting the PDF
//! into single-page documents lets several pages be in flight at once, and a
//! page that fails costs only that page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate path and %PDF magic
//!  ├─ 2. Split    one temp PDF per page via pdfium (spawn_blocking)
//!  ├─ 3. Extract  up to max_workers concurrent uploads, one per page
//!  ├─ 4. Persist  <run>/<page:03>/{result.json,summary.txt} as each completes
//!  └─ 5. Report   processing_summary.txt + combined_results.json
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog_ocr::{process_pdf_by_pages, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from VISION_AGENT_API_KEY
//!     let config = PipelineConfig::builder().max_workers(4).build()?;
//!     let report = process_pdf_by_pages("catalogs/spring.pdf", &config).await?;
//!     println!(
//!         "{}/{} pages, {} products → {}",
//!         report.summary.successful_pages,
//!         report.summary.total_pages,
//!         report.product_count(),
//!         report.summary.output_directory.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `catalog-ocr` binary (clap + anyhow + tracing-subscriber) |
//! | `bundled` | on      | Embed the pdfium shared library at build time |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, PipelineConfig, PipelineConfigBuilder};
pub use error::{CatalogError, ExtractionError};
pub use output::{PageResult, RunReport, RunSummary};
pub use pipeline::extract::{ProductExtractor, VisionAgentClient};
pub use pipeline::split::{DocumentSplitter, PageDocument, PdfiumSplitter};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use run::{extract_document, process_pdf_by_pages, process_pdf_by_pages_sync};
pub use schema::{ProductExtraction, ProductRecord, PRODUCT_SCHEMA};
