//! Source validation: check the catalog PDF before any work starts.
//!
//! A missing or non-PDF input is reported here with a precise error instead
//! of surfacing later as an opaque pdfium failure halfway through a run.

use crate::error::CatalogError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated source document. Read-only to the pipeline.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
}

impl SourceDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name shown in summaries and used to name the run directory.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_source(path: impl AsRef<Path>) -> Result<SourceDocument, CatalogError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(CatalogError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(CatalogError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(CatalogError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(CatalogError::FileNotFound { path });
        }
    }

    debug!("Resolved source PDF: {}", path.display());
    Ok(SourceDocument { path })
}

/// Join `BASE_PDF_PATH`-style directory and file name settings.
pub fn source_path(base_dir: impl AsRef<Path>, file_name: &str) -> PathBuf {
    base_dir.as_ref().join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_source("/definitely/not/a/real/catalog.pdf").unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_is_rejected() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"PK\x03\x04zip data").unwrap();
        let err = resolve_source(tmp.path()).unwrap_err();
        assert!(matches!(err, CatalogError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"));
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spring catalog.pdf");
        std::fs::write(&path, b"%PDF-1.7\n%%EOF\n").unwrap();
        let source = resolve_source(&path).unwrap();
        assert_eq!(source.path(), path.as_path());
        assert_eq!(source.display_name(), "spring catalog.pdf");
    }

    #[test]
    fn source_path_joins_base_and_name() {
        assert_eq!(
            source_path("/data/catalogs", "fall.pdf"),
            PathBuf::from("/data/catalogs/fall.pdf")
        );
    }
}
