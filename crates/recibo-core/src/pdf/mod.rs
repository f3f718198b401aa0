//! PDF processing module.

mod extractor;

pub use extractor::{LoadedPdf, PdfExtractor};

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Opens PDF documents.
pub trait PdfProcessor {
    /// Parse a PDF from bytes. The document is released when dropped.
    fn open(&self, data: &[u8]) -> Result<Box<dyn PdfDocument>>;
}

/// An opened PDF, addressed by 1-based page numbers.
pub trait PdfDocument {
    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Embedded text of a single page.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Rasterize a page at the given resolution.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}
