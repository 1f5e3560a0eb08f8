//! Document loading: directory walking and per-file text extraction.
//!
//! A load produces a set of [`Document`]s, each an ordered sequence of
//! [`Page`]s. Text files are paginated by blank-line-delimited sections; PDF
//! files produce one page per physical page. A single file failing to
//! extract is logged and skipped — only a missing directory fails the load.

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use sift_chunk::FileType;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Errors from loading a document directory.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The requested corpus directory does not exist.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// A file could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was read but its text could not be extracted.
    #[error("could not extract text from {path}: {message}")]
    Extraction { path: PathBuf, message: String },
}

/// One page of extracted text. `word_count` is derived once at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// 1-based, sequence-relevant page number.
    pub page_number: u32,
    pub text: String,
    pub word_count: usize,
}

impl Page {
    fn new(page_number: u32, text: String) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            page_number,
            text,
            word_count,
        }
    }
}

/// A loaded document: immutable after load, replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// File name, unique within a corpus directory.
    pub file_name: String,
    pub file_type: FileType,
    pub pages: Vec<Page>,
}

impl Document {
    /// Total words across all pages.
    pub fn word_count(&self) -> usize {
        self.pages.iter().map(|page| page.word_count).sum()
    }
}

/// Per-document totals reported by [`DocumentSetSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub file_name: String,
    pub file_type: FileType,
    pub total_pages: usize,
    pub total_words: usize,
}

/// Load-time totals for a whole corpus directory. Persisted alongside the
/// embedded chunks so cache-restored corpora keep their document counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSetSummary {
    pub total_documents: usize,
    pub total_pages: usize,
    pub total_words: usize,
    pub documents: Vec<DocumentSummary>,
}

impl DocumentSetSummary {
    pub fn from_documents(documents: &[Document]) -> Self {
        let document_summaries: Vec<DocumentSummary> = documents
            .iter()
            .map(|doc| DocumentSummary {
                file_name: doc.file_name.clone(),
                file_type: doc.file_type,
                total_pages: doc.pages.len(),
                total_words: doc.word_count(),
            })
            .collect();

        Self {
            total_documents: documents.len(),
            total_pages: document_summaries.iter().map(|d| d.total_pages).sum(),
            total_words: document_summaries.iter().map(|d| d.total_words).sum(),
            documents: document_summaries,
        }
    }
}

/// Load all supported documents (`.pdf`, `.txt`, `.md`) under `directory`,
/// recursively.
///
/// Returns an empty vector (not an error) when no supported files exist.
/// Per-file extraction failures are logged and skipped. Files are visited in
/// sorted path order so repeated loads of the same tree are deterministic.
pub async fn load_documents(directory: &Path) -> Result<Vec<Document>, LoadError> {
    if !directory.is_dir() {
        return Err(LoadError::DirectoryNotFound {
            path: directory.to_path_buf(),
        });
    }

    let files = collect_supported_files(directory);
    debug!(
        directory = %directory.display(),
        files = files.len(),
        "Discovered supported documents"
    );

    let mut documents = Vec::new();
    for path in files {
        match load_document(&path).await {
            Ok(document) => {
                info!(
                    file = %document.file_name,
                    file_type = %document.file_type,
                    pages = document.pages.len(),
                    "Loaded document"
                );
                documents.push(document);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable document");
            }
        }
    }

    Ok(documents)
}

/// Map a path to its supported file type, if any.
pub fn classify_file(path: &Path) -> Option<FileType> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => Some(FileType::Pdf),
        Some("txt") | Some("md") => Some(FileType::Text),
        _ => None,
    }
}

fn collect_supported_files(directory: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(directory)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| classify_file(path).is_some())
        .collect();

    files.sort();
    files
}

async fn load_document(path: &Path) -> Result<Document, LoadError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match classify_file(path) {
        Some(FileType::Pdf) => load_pdf(path, file_name).await,
        Some(FileType::Text) => load_text(path, file_name).await,
        None => Err(LoadError::Extraction {
            path: path.to_path_buf(),
            message: "unsupported file extension".to_string(),
        }),
    }
}

/// Extract one page per physical PDF page. The parse runs on a blocking
/// thread because pdf-extract is synchronous and CPU-bound.
async fn load_pdf(path: &Path, file_name: String) -> Result<Document, LoadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extracted =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .await
            .map_err(|e| LoadError::Extraction {
                path: path.to_path_buf(),
                message: format!("extraction task failed: {e}"),
            })?
            .map_err(|e| LoadError::Extraction {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

    let pages = extracted
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page::new(i as u32 + 1, text))
        .collect();

    Ok(Document {
        file_name,
        file_type: FileType::Pdf,
        pages,
    })
}

/// Paginate a text file by blank-line-delimited sections. Each non-empty
/// section becomes one page, numbered sequentially from 1.
async fn load_text(path: &Path, file_name: String) -> Result<Document, LoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let pages = content
        .split("\n\n")
        .map(str::trim)
        .filter(|section| !section.is_empty())
        .enumerate()
        .map(|(i, section)| Page::new(i as u32 + 1, section.to_string()))
        .collect();

    Ok(Document {
        file_name,
        file_type: FileType::Text,
        pages,
    })
}
