//! Turns an uploaded image or PDF into raw text.
//!
//! PDFs use their embedded text page by page and fall back to OCR for pages
//! that carry too little of it (scans). Raster images always go through OCR,
//! optionally after an [`ImageFilter`] pass.

mod upload;

pub use upload::{sanitize_file_name, StagedUpload, UploadStore};

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::models::config::ReciboConfig;
use crate::ocr::{ImageFilter, ImagePreprocessor, NoopFilter, Recognizer};
use crate::pdf::{PdfDocument, PdfExtractor, PdfProcessor};

/// Where a document's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Image,
}

/// How the text of one PDF page was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSource {
    /// Embedded text layer.
    Embedded,
    /// Rendered and recognized.
    Ocr,
    /// Extraction failed; the page contributes no text.
    Failed,
}

/// Text of a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    pub source: PageSource,
    pub text: String,
}

/// Unicode text recovered from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocumentText {
    /// All pages joined with `\n`.
    pub text: String,
    /// Per-page breakdown (a single page for images).
    pub pages: Vec<PageText>,
    pub source: SourceKind,
}

impl RawDocumentText {
    fn from_pages(pages: Vec<PageText>, source: SourceKind) -> Self {
        let text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            text,
            pages,
            source,
        }
    }
}

/// Routes files to the PDF or image path and collects their text.
pub struct DocumentIngestor {
    recognizer: Option<Box<dyn Recognizer>>,
    pdf: Box<dyn PdfProcessor>,
    filter: Box<dyn ImageFilter>,
    config: ReciboConfig,
}

impl DocumentIngestor {
    /// Create an ingestor with default settings and no recognizer.
    pub fn new() -> Self {
        Self::from_config(ReciboConfig::default())
    }

    /// Create an ingestor from configuration.
    ///
    /// Image uploads are pre-processed only when `ocr.preprocess` is set.
    pub fn from_config(config: ReciboConfig) -> Self {
        let filter: Box<dyn ImageFilter> = if config.ocr.preprocess {
            Box::new(ImagePreprocessor::new())
        } else {
            Box::new(NoopFilter)
        };

        Self {
            recognizer: None,
            pdf: Box::new(PdfExtractor::new()),
            filter,
            config,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn Recognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_pdf_processor(mut self, pdf: Box<dyn PdfProcessor>) -> Self {
        self.pdf = pdf;
        self
    }

    pub fn with_filter(mut self, filter: Box<dyn ImageFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &ReciboConfig {
        &self.config
    }

    /// Recover the text of a file on disk.
    pub fn ingest(&self, path: &Path) -> Result<RawDocumentText, IngestError> {
        let start = Instant::now();
        let kind = route(path)?;
        debug!("Routing {} as {:?}", path.display(), kind);

        let document = match kind {
            SourceKind::Pdf => {
                let data = fs::read(path)?;
                self.ingest_pdf(&data)?
            }
            SourceKind::Image => {
                let image = image::open(path)?;
                self.ingest_image(&image)?
            }
        };

        info!(
            "Ingested {} ({} page(s), {} chars) in {}ms",
            path.display(),
            document.pages.len(),
            document.text.chars().count(),
            start.elapsed().as_millis()
        );
        Ok(document)
    }

    /// Stage uploaded bytes under a sanitized name, then ingest them.
    ///
    /// The staged copy is removed before this returns, on success or error.
    pub fn ingest_upload(&self, file_name: &str, bytes: &[u8]) -> Result<RawDocumentText, IngestError> {
        route(Path::new(file_name))?;

        let staged = UploadStore::new(self.config.upload.dir.clone()).stage(file_name, bytes)?;
        self.ingest(staged.path())
    }

    /// Recover text from PDF bytes.
    pub fn ingest_pdf(&self, data: &[u8]) -> Result<RawDocumentText, IngestError> {
        let document = self.pdf.open(data)?;

        let total = document.page_count();
        let limit = match self.config.pdf.max_pages {
            0 => total,
            max => total.min(max as u32),
        };
        if limit < total {
            debug!("Processing {} of {} pages", limit, total);
        }

        let mut pages = Vec::with_capacity(limit as usize);
        for number in 1..=limit {
            pages.push(self.pdf_page(document.as_ref(), number)?);
        }

        Ok(RawDocumentText::from_pages(pages, SourceKind::Pdf))
    }

    fn pdf_page(&self, document: &dyn PdfDocument, number: u32) -> Result<PageText, IngestError> {
        let embedded = document.page_text(number).unwrap_or_else(|e| {
            warn!("Page {}: text extraction failed: {}", number, e);
            String::new()
        });

        let text_len = embedded.trim().chars().count();
        if text_len >= self.config.pdf.min_text_length {
            debug!("Page {}: using {} chars of embedded text", number, text_len);
            return Ok(PageText {
                number,
                source: PageSource::Embedded,
                text: embedded,
            });
        }

        let recognizer = self.recognizer()?;
        debug!("Page {}: only {} chars of embedded text, running OCR", number, text_len);

        let recognized = document
            .render_page(number, self.config.pdf.render_dpi)
            .map_err(|e| e.to_string())
            .and_then(|image| recognizer.recognize(&image).map_err(|e| e.to_string()));

        Ok(match recognized {
            Ok(text) => PageText {
                number,
                source: PageSource::Ocr,
                text,
            },
            Err(e) => {
                warn!("Page {}: OCR failed: {}", number, e);
                PageText {
                    number,
                    source: PageSource::Failed,
                    text: String::new(),
                }
            }
        })
    }

    /// Recover text from a decoded raster image.
    pub fn ingest_image(&self, image: &DynamicImage) -> Result<RawDocumentText, IngestError> {
        let recognizer = self.recognizer()?;
        let prepared = self.prepare(image);
        let text = recognizer.recognize(&prepared)?;

        let page = PageText {
            number: 1,
            source: PageSource::Ocr,
            text,
        };
        Ok(RawDocumentText::from_pages(vec![page], SourceKind::Image))
    }

    fn prepare<'a>(&self, image: &'a DynamicImage) -> Cow<'a, DynamicImage> {
        if !self.filter.is_available() {
            return Cow::Borrowed(image);
        }
        match self.filter.apply(image) {
            Ok(filtered) => Cow::Owned(filtered),
            Err(e) => {
                warn!("Image pre-processing failed, using original image: {}", e);
                Cow::Borrowed(image)
            }
        }
    }

    fn recognizer(&self) -> Result<&dyn Recognizer, IngestError> {
        self.recognizer
            .as_deref()
            .ok_or(IngestError::RecognizerUnavailable)
    }
}

impl Default for DocumentIngestor {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the file extension maps to a PDF or a readable image format.
pub fn is_supported(path: &Path) -> bool {
    route(path).is_ok()
}

/// Pick the route from the file extension.
fn route(path: &Path) -> Result<SourceKind, IngestError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if extension == "pdf" {
        return Ok(SourceKind::Pdf);
    }

    match ImageFormat::from_extension(&extension) {
        Some(format) if format.reading_enabled() => Ok(SourceKind::Image),
        _ => Err(IngestError::UnsupportedFormat(extension)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use image::{ColorType, Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<(u32, ColorType)>>>;

    /// Records every image it sees and answers with its width.
    struct FakeRecognizer {
        calls: CallLog,
        fail: bool,
    }

    impl FakeRecognizer {
        fn boxed(calls: &CallLog) -> Box<dyn Recognizer> {
            Box::new(Self {
                calls: Rc::clone(calls),
                fail: false,
            })
        }
    }

    impl Recognizer for FakeRecognizer {
        fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
            self.calls.borrow_mut().push((image.width(), image.color()));
            if self.fail {
                return Err(OcrError::Recognition("model crashed".to_string()));
            }
            Ok(format!("texto reconhecido {}", image.width()))
        }
    }

    /// Page text, or `None` for a page whose extraction fails.
    #[derive(Clone)]
    struct FakePdf {
        pages: Vec<Option<&'static str>>,
        renderable: bool,
    }

    impl PdfProcessor for FakePdf {
        fn open(&self, _data: &[u8]) -> crate::pdf::Result<Box<dyn PdfDocument>> {
            Ok(Box::new(self.clone()))
        }
    }

    impl PdfDocument for FakePdf {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn page_text(&self, page: u32) -> crate::pdf::Result<String> {
            match self.pages.get(page as usize - 1) {
                Some(Some(text)) => Ok(text.to_string()),
                Some(None) => Err(PdfError::TextExtraction("broken font".to_string())),
                None => Err(PdfError::InvalidPage(page)),
            }
        }

        /// Page `n` renders as a `10n` pixel wide image.
        fn render_page(&self, page: u32, _dpi: u32) -> crate::pdf::Result<DynamicImage> {
            if !self.renderable {
                return Err(PdfError::Render("no raster content".to_string()));
            }
            Ok(DynamicImage::new_rgb8(page * 10, 10))
        }
    }

    struct FailingFilter;

    impl ImageFilter for FailingFilter {
        fn apply(&self, _image: &DynamicImage) -> Result<DynamicImage, OcrError> {
            Err(OcrError::Preprocessing("out of memory".to_string()))
        }
    }

    const PAGE_ONE: &str = "Loja XYZ Ltda - CNPJ 12.345.678/0001-90";
    const PAGE_THREE: &str = "Valor total: 120,00 - Pago em 05/10/2025";

    fn pdf_ingestor(pdf: FakePdf, calls: &CallLog) -> DocumentIngestor {
        DocumentIngestor::new()
            .with_pdf_processor(Box::new(pdf))
            .with_recognizer(FakeRecognizer::boxed(calls))
    }

    fn receipt_png(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("recibo.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, Rgb([200, 200, 200])))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_pdf_ocrs_only_short_pages() {
        let calls = CallLog::default();
        let pdf = FakePdf {
            pages: vec![Some(PAGE_ONE), Some("  p. 2  "), Some(PAGE_THREE)],
            renderable: true,
        };

        let doc = pdf_ingestor(pdf, &calls).ingest_pdf(b"%PDF").unwrap();

        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(calls.borrow()[0].0, 20);
        assert_eq!(
            doc.text,
            format!("{}\ntexto reconhecido 20\n{}", PAGE_ONE, PAGE_THREE)
        );
        let sources: Vec<_> = doc.pages.iter().map(|p| p.source).collect();
        assert_eq!(
            sources,
            vec![PageSource::Embedded, PageSource::Ocr, PageSource::Embedded]
        );
        assert_eq!(doc.source, SourceKind::Pdf);
    }

    #[test]
    fn test_failed_page_contributes_empty_text() {
        let calls = CallLog::default();
        let pdf = FakePdf {
            pages: vec![Some(PAGE_ONE), None],
            renderable: false,
        };

        let doc = pdf_ingestor(pdf, &calls).ingest_pdf(b"%PDF").unwrap();

        assert_eq!(doc.text, format!("{}\n", PAGE_ONE));
        assert_eq!(doc.pages[1].source, PageSource::Failed);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_short_page_without_recognizer_fails() {
        let ingestor = DocumentIngestor::new().with_pdf_processor(Box::new(FakePdf {
            pages: vec![Some(PAGE_ONE), Some("")],
            renderable: true,
        }));

        assert!(matches!(
            ingestor.ingest_pdf(b"%PDF"),
            Err(IngestError::RecognizerUnavailable)
        ));
    }

    #[test]
    fn test_text_pdf_needs_no_recognizer() {
        let ingestor = DocumentIngestor::new().with_pdf_processor(Box::new(FakePdf {
            pages: vec![Some(PAGE_ONE), Some(PAGE_THREE)],
            renderable: false,
        }));

        let doc = ingestor.ingest_pdf(b"%PDF").unwrap();
        assert_eq!(doc.text, format!("{}\n{}", PAGE_ONE, PAGE_THREE));
    }

    #[test]
    fn test_max_pages() {
        let mut config = ReciboConfig::default();
        config.pdf.max_pages = 1;
        let ingestor = DocumentIngestor::from_config(config).with_pdf_processor(Box::new(FakePdf {
            pages: vec![Some(PAGE_ONE), Some(PAGE_THREE)],
            renderable: false,
        }));

        let doc = ingestor.ingest_pdf(b"%PDF").unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.text, PAGE_ONE);
    }

    #[test]
    fn test_unreadable_pdf_upload() {
        let result = DocumentIngestor::new().ingest_upload("recibo.pdf", b"not a pdf");
        assert!(matches!(result, Err(IngestError::Pdf(PdfError::Parse(_)))));
    }

    #[test]
    fn test_image_is_preprocessed() {
        let dir = tempfile::tempdir().unwrap();
        let calls = CallLog::default();

        let doc = DocumentIngestor::new()
            .with_recognizer(FakeRecognizer::boxed(&calls))
            .ingest(&receipt_png(dir.path()))
            .unwrap();

        assert_eq!(doc.text, "texto reconhecido 16");
        assert_eq!(doc.source, SourceKind::Image);
        assert_eq!(calls.borrow()[0].1, ColorType::L8);
    }

    #[test]
    fn test_image_without_filter_uses_original() {
        let dir = tempfile::tempdir().unwrap();
        let calls = CallLog::default();

        DocumentIngestor::new()
            .with_filter(Box::new(NoopFilter))
            .with_recognizer(FakeRecognizer::boxed(&calls))
            .ingest(&receipt_png(dir.path()))
            .unwrap();

        assert_eq!(calls.borrow()[0].1, ColorType::Rgb8);
    }

    #[test]
    fn test_filter_failure_falls_back_to_original() {
        let dir = tempfile::tempdir().unwrap();
        let calls = CallLog::default();

        DocumentIngestor::new()
            .with_filter(Box::new(FailingFilter))
            .with_recognizer(FakeRecognizer::boxed(&calls))
            .ingest(&receipt_png(dir.path()))
            .unwrap();

        assert_eq!(calls.borrow()[0].1, ColorType::Rgb8);
    }

    #[test]
    fn test_image_ocr_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = DocumentIngestor::new().with_recognizer(Box::new(FakeRecognizer {
            calls: CallLog::default(),
            fail: true,
        }));

        assert!(matches!(
            ingestor.ingest(&receipt_png(dir.path())),
            Err(IngestError::Ocr(_))
        ));
    }

    #[test]
    fn test_image_without_recognizer_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DocumentIngestor::new().ingest(&receipt_png(dir.path())),
            Err(IngestError::RecognizerUnavailable)
        ));
    }

    #[test]
    fn test_image_upload() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = fs::read(receipt_png(dir.path())).unwrap();
        let calls = CallLog::default();

        let doc = DocumentIngestor::new()
            .with_recognizer(FakeRecognizer::boxed(&calls))
            .ingest_upload("Foto do Recibo.PNG", &bytes)
            .unwrap();
        assert_eq!(doc.pages.len(), 1);
    }

    #[test]
    fn test_unsupported_format() {
        let ingestor = DocumentIngestor::new();
        assert!(matches!(
            ingestor.ingest(Path::new("notas.txt")),
            Err(IngestError::UnsupportedFormat(ext)) if ext == "txt"
        ));
        assert!(matches!(
            ingestor.ingest_upload("planilha", b"data"),
            Err(IngestError::UnsupportedFormat(ext)) if ext.is_empty()
        ));
    }

    #[test]
    fn test_route() {
        assert_eq!(route(Path::new("a.PDF")).unwrap(), SourceKind::Pdf);
        assert_eq!(route(Path::new("a.jpeg")).unwrap(), SourceKind::Image);
        assert_eq!(route(Path::new("a.webp")).unwrap(), SourceKind::Image);
        assert!(is_supported(Path::new("scan.TIFF")));
        assert!(!is_supported(Path::new("summary.csv")));
    }
}
