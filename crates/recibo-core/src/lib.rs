//! Core library for Brazilian receipt OCR processing.
//!
//! This crate provides:
//! - Document ingestion (PDF embedded text with per-page OCR fallback, images)
//! - Image pre-processing and an OCR seam with a pure Rust backend
//! - Receipt field extraction (amount, date, category, description)
//! - Draft transactions with user overrides and installment splitting

pub mod error;
pub mod ingest;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod receipt;

use std::path::Path;

pub use error::{ExtractionError, IngestError, ReciboError, Result};
pub use ingest::{DocumentIngestor, RawDocumentText};
pub use models::{
    Amount, Category, DraftOverrides, DraftTransaction, Installment, ReciboConfig,
    TransactionKind,
};
pub use ocr::{ImageFilter, ImagePreprocessor, NoopFilter, Recognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{PdfDocument, PdfExtractor, PdfProcessor};
pub use receipt::{ExtractionResult, ReceiptParser};

/// Ingest a file and build a draft from its text.
pub fn process_file(ingestor: &DocumentIngestor, path: &Path) -> Result<ExtractionResult> {
    let document = ingestor.ingest(path)?;
    Ok(ReceiptParser::from_config(&ingestor.config().extraction).parse_document(&document))
}

/// Same as [`process_file`] for uploaded bytes.
pub fn process_upload(
    ingestor: &DocumentIngestor,
    file_name: &str,
    bytes: &[u8],
) -> Result<ExtractionResult> {
    let document = ingestor.ingest_upload(file_name, bytes)?;
    Ok(ReceiptParser::from_config(&ingestor.config().extraction).parse_document(&document))
}
