//! Run directory naming: `<YYYYMMDD-HHMMSS>[-<sanitized-stem>]`.
//!
//! Names have second granularity: two runs of the same file in the same
//! second share a directory, and the later one overwrites the
//! earlier one's page files.

use crate::error::CatalogError;
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}

/// Directory name for a run finishing at `timestamp`.
///
/// `filename` contributes its stem (`spring catalog.pdf` → `spring_catalog`);
/// `None` or an empty stem yields the bare timestamp.
pub fn run_dir_name(timestamp: DateTime<Local>, filename: Option<&str>) -> String {
    let stamp = timestamp.format("%Y%m%d-%H%M%S").to_string();

    let stem = filename
        .map(Path::new)
        .and_then(Path::file_stem)
        .map(|s| s.to_string_lossy())
        .filter(|s| !s.is_empty());

    match stem {
        Some(stem) => format!("{stamp}-{}", sanitize(&stem)),
        None => stamp,
    }
}

/// Create `<root>/<run_dir_name(now, filename)>`, including parents.
///
/// Succeeds if the directory already exists.
pub async fn create_output_directory(
    root: &Path,
    filename: Option<&str>,
) -> Result<PathBuf, CatalogError> {
    create_output_directory_at(root, Local::now(), filename).await
}

/// Create `<root>/<run_dir_name(timestamp, filename)>`, including parents.
///
/// Succeeds if the directory already exists.
pub async fn create_output_directory_at(
    root: &Path,
    timestamp: DateTime<Local>,
    filename: Option<&str>,
) -> Result<PathBuf, CatalogError> {
    let dir = root.join(run_dir_name(timestamp, filename));
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| CatalogError::OutputWriteFailed {
            path: dir.clone(),
            source: e,
        })?;
    debug!("Output directory: {}", dir.display());
    Ok(dir)
}
