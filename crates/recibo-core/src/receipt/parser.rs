//! Assembles a draft transaction from recovered document text.

use std::time::Instant;

use tracing::{debug, info};

use crate::ingest::RawDocumentText;
use crate::models::config::ExtractionConfig;
use crate::models::{Category, DraftTransaction, TransactionKind};

use super::rules::{
    amounts::{parse_locale_amount, AmountExtractor},
    category::classify,
    dates::DateExtractor,
    description::summarize,
    FieldExtractor,
};

/// Result of receipt extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Draft awaiting confirmation.
    pub draft: DraftTransaction,
    /// Fields the user has to fill in.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Runs the amount, date, category and description extractors over one text.
pub struct ReceiptParser {
    /// Category when no keyword rule matches.
    default_category: Category,
    /// Characters of raw text kept for review.
    preview_chars: usize,
}

impl ReceiptParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            default_category: config.default_category,
            preview_chars: config.preview_chars,
        }
    }

    /// Set the category used when nothing matches.
    pub fn with_default_category(mut self, category: Category) -> Self {
        self.default_category = category;
        self
    }

    /// Set the preview length.
    pub fn with_preview_chars(mut self, chars: usize) -> Self {
        self.preview_chars = chars;
        self
    }

    /// Build a draft from text. Never fails; missed fields stay empty.
    pub fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();

        let amount_match = AmountExtractor::new().extract(text);
        let amount_text = amount_match
            .as_ref()
            .map(|m| m.value.clone())
            .unwrap_or_default();
        let amount = parse_locale_amount(&amount_text).ok();

        let date = DateExtractor::new().extract(text).map(|m| m.value);
        let category = classify(text, self.default_category);
        let description = summarize(text);

        debug!(
            "extracted amount={:?} (rule {:?}) date={:?} category={:?}",
            amount_text,
            amount_match.as_ref().and_then(|m| m.rule),
            date,
            category
        );

        let draft = DraftTransaction {
            description,
            amount,
            amount_text,
            date,
            category,
            kind: TransactionKind::Expense,
            ocr_preview: text.chars().take(self.preview_chars).collect(),
        };

        let mut warnings = Vec::new();
        if draft.amount.is_none() {
            warnings.push("amount not detected".to_string());
        }
        if draft.date.is_none() {
            warnings.push("date not detected".to_string());
        }
        if draft.category.is_unknown() {
            warnings.push("category not detected".to_string());
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Draft extracted in {}ms with {} warning(s)",
            processing_time_ms,
            warnings.len()
        );

        ExtractionResult {
            draft,
            warnings,
            processing_time_ms,
        }
    }

    /// Build a draft from an ingested document.
    pub fn parse_document(&self, document: &RawDocumentText) -> ExtractionResult {
        self.parse(&document.text)
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const RECEIPT: &str = "COMPROVANTE DE PAGAMENTO\n\
                           Auto Posto Ipiranga Ltda\n\
                           Gasolina comum 40,00 L\n\
                           Valor total: 250,00\n\
                           Pago em 05/10/2025";

    #[test]
    fn test_parse_receipt() {
        let result = ReceiptParser::new().parse(RECEIPT);
        let draft = result.draft;

        assert_eq!(draft.description, "Auto Posto Ipiranga Ltda");
        assert_eq!(draft.amount_text, "250.00");
        assert_eq!(draft.amount.unwrap().value(), Decimal::new(25000, 2));
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2025, 10, 5));
        assert_eq!(draft.category, Category::Fuel);
        assert_eq!(draft.kind, TransactionKind::Expense);
        assert_eq!(draft.ocr_preview, RECEIPT);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_empty_text_degrades() {
        let result = ReceiptParser::new().parse("");
        let draft = result.draft;

        assert_eq!(draft.description, "Detectado via arquivo");
        assert_eq!(draft.amount, None);
        assert_eq!(draft.amount_text, "");
        assert_eq!(draft.date, None);
        assert_eq!(draft.category, Category::Unknown);
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_unparseable_amount_is_a_miss() {
        let draft = ReceiptParser::new().parse("Pix enviado. Obrigado").draft;
        assert_eq!(draft.amount_text, ".");
        assert_eq!(draft.amount, None);
    }

    #[test]
    fn test_preview_is_truncated() {
        let text = "x".repeat(5000);
        let draft = ReceiptParser::new().parse(&text).draft;
        assert_eq!(draft.ocr_preview.chars().count(), 1200);

        let draft = ReceiptParser::new().with_preview_chars(10).parse(&text).draft;
        assert_eq!(draft.ocr_preview.len(), 10);
    }

    #[test]
    fn test_default_category() {
        let draft = ReceiptParser::new()
            .with_default_category(Category::Food)
            .parse("texto aleatório")
            .draft;
        assert_eq!(draft.category, Category::Food);
    }
}
