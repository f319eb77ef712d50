use super::super::DocumentError;
use super::DocumentLoader;

/// Form feed: the page separator emitted by `pdftotext` and most text exporters.
const PAGE_BREAK: char = '\x0c';

/// UTF-8 text, one page per form-feed-separated segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
        let content = String::from_utf8(bytes.to_vec())?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        Ok(content.split(PAGE_BREAK).map(str::to_owned).collect())
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "text", "md", "markdown"]
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }
}
