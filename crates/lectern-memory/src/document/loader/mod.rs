#[cfg(feature = "pdf")]
mod pdf;
mod text;

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

use std::path::Path;

use super::section::detect_section_title;
use super::{DEFAULT_MAX_FILE_SIZE, DocumentError, PageRecord};

const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_HEADER_WINDOW: usize = 1024;

/// Extracts per-page text from one document format.
pub trait DocumentLoader: Send + Sync {
    /// Return the text of every page in document order, empty pages included.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are corrupt or not in this loader's format.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentError>;

    fn supported_extensions(&self) -> &[&str];

    fn content_type(&self) -> &'static str;
}

/// Format-sniffing front door: raw bytes in, ordered [`PageRecord`]s out.
#[derive(Debug, Clone, Copy)]
pub struct Loader {
    pub max_file_size: u64,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Loader {
    #[must_use]
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Convert document bytes into page records, dropping whitespace-only pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is too large, in an unsupported format,
    /// fails to extract, or contains no text at all. No pages are returned on error.
    pub fn load(&self, bytes: &[u8]) -> Result<Vec<PageRecord>, DocumentError> {
        let size = bytes.len() as u64;
        if size > self.max_file_size {
            return Err(DocumentError::FileTooLarge(size));
        }

        let loader = loader_for(bytes)?;
        let pages = loader.extract_pages(bytes)?;
        let total = pages.len();
        let records = into_page_records(pages);

        tracing::info!(
            content_type = loader.content_type(),
            pages = total,
            non_empty = records.len(),
            "document loaded"
        );

        if records.is_empty() {
            return Err(DocumentError::Empty);
        }
        Ok(records)
    }

    /// Read a document file after checking its extension and size.
    ///
    /// A path without an extension is accepted; the format is decided by content.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension belongs to no loader, the file exceeds
    /// `max_file_size`, or it cannot be read.
    pub async fn read_path(&self, path: &Path) -> Result<Vec<u8>, DocumentError> {
        check_extension(path)?;
        let path = tokio::fs::canonicalize(path).await?;
        let meta = tokio::fs::metadata(&path).await?;
        if meta.len() > self.max_file_size {
            return Err(DocumentError::FileTooLarge(meta.len()));
        }
        Ok(tokio::fs::read(&path).await?)
    }

    /// [`read_path`](Self::read_path) then [`load`](Self::load) on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`load`](Self::load) fails.
    pub async fn load_path(&self, path: &Path) -> Result<Vec<PageRecord>, DocumentError> {
        let bytes = self.read_path(path).await?;
        let loader = *self;
        tokio::task::spawn_blocking(move || loader.load(&bytes))
            .await
            .map_err(|e| DocumentError::Io(std::io::Error::other(e)))?
    }
}

fn loaders() -> Vec<Box<dyn DocumentLoader>> {
    let mut all: Vec<Box<dyn DocumentLoader>> = vec![Box::new(TextLoader)];
    #[cfg(feature = "pdf")]
    all.push(Box::new(PdfLoader));
    all
}

fn check_extension(path: &Path) -> Result<(), DocumentError> {
    let Some(ext) = path.extension() else {
        return Ok(());
    };
    let ext = ext.to_string_lossy().to_lowercase();
    if loaders()
        .iter()
        .any(|l| l.supported_extensions().contains(&ext.as_str()))
    {
        Ok(())
    } else {
        Err(DocumentError::UnsupportedFormat(format!(
            "no loader for .{ext} files"
        )))
    }
}

/// Readers tolerate junk before the header as long as it starts in the first KiB.
fn is_pdf(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(PDF_HEADER_WINDOW)]
        .windows(PDF_MAGIC.len())
        .any(|w| w == PDF_MAGIC)
}

fn loader_for(bytes: &[u8]) -> Result<Box<dyn DocumentLoader>, DocumentError> {
    if is_pdf(bytes) {
        #[cfg(feature = "pdf")]
        return Ok(Box::new(PdfLoader));
        #[cfg(not(feature = "pdf"))]
        return Err(DocumentError::UnsupportedFormat(
            "PDF support is disabled (enable the `pdf` feature)".into(),
        ));
    }
    if looks_binary(bytes) {
        return Err(DocumentError::UnsupportedFormat(
            "binary content that is neither PDF nor text".into(),
        ));
    }
    Ok(Box::new(TextLoader))
}

/// NUL bytes never appear in text documents.
fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(8192).any(|&b| b == 0)
}

fn into_page_records(pages: Vec<String>) -> Vec<PageRecord> {
    pages
        .into_iter()
        .zip(1u32..)
        .filter(|(text, _)| !text.trim().is_empty())
        .map(|(raw_text, page_number)| PageRecord {
            page_number,
            word_count: raw_text.split_whitespace().count(),
            section_title: detect_section_title(&raw_text),
            raw_text,
        })
        .collect()
}
