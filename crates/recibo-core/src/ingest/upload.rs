//! Staging of uploaded bytes on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

/// File name used when nothing survives sanitization.
const FALLBACK_FILE_NAME: &str = "upload";

/// Writes uploads into private temporary directories.
#[derive(Debug, Clone, Default)]
pub struct UploadStore {
    /// Parent directory for staging (system temp dir when `None`).
    dir: Option<PathBuf>,
}

impl UploadStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Write `bytes` under a sanitized version of `file_name`.
    pub fn stage(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<StagedUpload> {
        let dir = match &self.dir {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                tempfile::Builder::new().prefix("recibo-").tempdir_in(parent)?
            }
            None => tempfile::Builder::new().prefix("recibo-").tempdir()?,
        };

        let path = dir.path().join(sanitize_file_name(file_name));
        fs::write(&path, bytes)?;
        debug!("Staged {} bytes at {}", bytes.len(), path.display());

        Ok(StagedUpload { path, _dir: dir })
    }
}

/// A staged upload. Dropping it removes the file and its directory.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    _dir: TempDir,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reduce a client-supplied name to a safe single path component.
///
/// ASCII alphanumerics, `.`, `-` and `_` are kept; whitespace and path
/// separators become `_`; everything else is dropped.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() || matches!(c, '/' | '\\') => Some('_'),
            _ => None,
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
