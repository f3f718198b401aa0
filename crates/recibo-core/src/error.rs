//! Error types for the recibo-core library.

use thiserror::Error;

/// Main error type for the recibo library.
#[derive(Error, Debug)]
pub enum ReciboError {
    /// Document ingestion failed; the file could not be processed.
    #[error("could not process file: {0}")]
    Ingest(#[from] IngestError),

    /// Field parsing or draft confirmation error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort ingestion of a single file.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The file extension maps to neither PDF nor a raster image format.
    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),

    /// PDF could not be opened.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Text recognition failed on an image upload.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// The image could not be decoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The file could not be read or staged.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// OCR was required but no recognizer is configured.
    #[error("no text recognizer available")]
    RecognizerUnavailable,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to rasterize a page.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised on the user-facing parsing and confirmation paths.
///
/// Extraction misses are not errors: the extractors return empty fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The value is not a locale numeral (e.g. "1.234,56").
    #[error("invalid amount: {value:?}")]
    InvalidAmount { value: String },

    /// The value is not an ISO date (YYYY-MM-DD).
    #[error("invalid date: {value:?}")]
    InvalidDate { value: String },

    /// Required field is missing.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The label names no known category.
    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    /// Installment count must be at least one.
    #[error("invalid installment count: {0}")]
    InvalidInstallments(u32),
}

/// Result type for the recibo library.
pub type Result<T> = std::result::Result<T, ReciboError>;
