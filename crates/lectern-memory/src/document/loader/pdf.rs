use super::super::DocumentError;
use super::DocumentLoader;

/// Page-by-page PDF text extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string()))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_pdf_is_error() {
        assert!(matches!(
            PdfLoader.extract_pages(b"%PDF-1.4\n%%EOF"),
            Err(DocumentError::Pdf(_))
        ));
    }

    #[test]
    fn metadata() {
        assert_eq!(PdfLoader.supported_extensions(), &["pdf"]);
        assert_eq!(PdfLoader.content_type(), "application/pdf");
    }
}
