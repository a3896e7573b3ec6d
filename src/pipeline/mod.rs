//! Pipeline stages for page-by-page catalog extraction.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the splitter or extractor can be swapped without touching the
//! rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ split ──▶ worker (extract) ──▶ persist
//! (path)    (pdfium)   (HTTP, N at once)    (per page + run files)
//! ```
//!
//! 1. [`input`]   — validate the source path and PDF magic bytes
//! 2. [`split`]   — one temp PDF per page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`worker`]  — one extraction per page via [`extract`], failures kept
//!    as data, page file always removed
//! 4. [`persist`] — `result.json` + `summary.txt` per page, then the run
//!    summary and combined report, under a directory from [`naming`]

pub mod extract;
pub mod input;
pub mod naming;
pub mod persist;
pub mod split;
pub mod worker;
