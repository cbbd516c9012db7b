use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

/// Extensions the file picker offers. Advisory only: other files are still sent.
pub const SUGGESTED_EXTENSIONS: &[&str] = &["pdf", "docx", "html", "htm", "txt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub contents: Vec<u8>,
    pub mime_type: String,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name,
            contents: contents.into(),
            mime_type,
        }
    }

    pub fn has_suggested_extension(&self) -> bool {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                SUGGESTED_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            })
            .unwrap_or(false)
    }
}

/// Files selected together and submitted in one ingest request, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatch {
    files: Vec<UploadFile>,
}

impl UploadBatch {
    pub fn new(files: Vec<UploadFile>) -> Self {
        Self { files }
    }

    pub async fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("path '{}' has no usable file name", path.display()))?
                .to_string();
            let contents = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            files.push(UploadFile::new(name, contents));
        }
        Ok(Self { files })
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
