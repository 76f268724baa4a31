//! Document discovery and text extraction for the ingestion directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Document;

pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

#[derive(Debug, Clone)]
pub struct DataProcessor {
    extensions: Vec<String>,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self { extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect() }
    }
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { extensions: extensions.into_iter().map(|e| e.as_ref().to_ascii_lowercase()).collect() }
    }

    /// All supported files under `root`, sorted so ingestion order is stable.
    pub fn list_documents(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.is_supported(p))
            .collect();
        files.sort();
        tracing::debug!(root = %root.display(), count = files.len(), "discovered documents");
        files
    }

    pub fn load(&self, path: &Path, root: &Path) -> Result<Document> {
        let name = document_name(path, root);
        let text = match extension(path).as_deref() {
            Some("pdf") => extract_pdf_text(path)?,
            _ => read_text_lossy(path)?,
        };
        if text.split_whitespace().next().is_none() {
            return Err(Error::Document(format!("{}: no extractable text", name)));
        }
        Ok(Document { name, path: path.to_path_buf(), text })
    }

    fn is_supported(&self, path: &Path) -> bool {
        extension(path).is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }
}

/// Path relative to the ingestion root, with `/` separators.
pub fn document_name(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(|s| s.to_ascii_lowercase())
}

fn read_text_lossy(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => {
            let bytes = fs::read(path).map_err(|e| Error::Document(format!("{}: {}", path.display(), e)))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}

fn extract_pdf_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::Document(format!("{}: {}", path.display(), e)))?;
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes));
    match extracted {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(Error::Document(format!("{}: {}", path.display(), e))),
        Err(_) => Err(Error::Document(format!("{}: malformed PDF", path.display()))),
    }
}
