//! Configuration structures for the ingestion and extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::transaction::Category;

/// Main configuration for the recibo pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReciboConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Draft extraction configuration.
    pub extraction: ExtractionConfig,

    /// Upload staging configuration.
    pub upload: UploadConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens in recognized text instead of replacing them with spaces.
    pub keep_unk: bool,

    /// Run greyscale/denoise/binarize on image uploads before OCR.
    pub preprocess: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            keep_unk: false,
            preprocess: true,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Pages whose trimmed embedded text is shorter than this are OCR'd.
    pub min_text_length: usize,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            min_text_length: 30,
            max_pages: 0,
        }
    }
}

/// Draft extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Characters of raw text kept in `ocr_preview`.
    pub preview_chars: usize,

    /// Category used when no keyword rule matches.
    pub default_category: Category,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            preview_chars: 1200,
            default_category: Category::Unknown,
        }
    }
}

/// Where uploads are staged before processing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Parent directory for staged uploads (system temp dir when unset).
    pub dir: Option<PathBuf>,
}

impl ReciboConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReciboConfig::default();
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.pdf.min_text_length, 30);
        assert_eq!(config.extraction.preview_chars, 1200);
        assert_eq!(config.extraction.default_category, Category::Unknown);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ReciboConfig =
            serde_json::from_str(r#"{"pdf": {"render_dpi": 150}}"#).unwrap();
        assert_eq!(config.pdf.render_dpi, 150);
        assert_eq!(config.pdf.min_text_length, 30);
        assert!(config.ocr.preprocess);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ReciboConfig::default();
        config.extraction.default_category = Category::Food;
        config.save(&path).unwrap();

        let loaded = ReciboConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.default_category, Category::Food);
    }
}
