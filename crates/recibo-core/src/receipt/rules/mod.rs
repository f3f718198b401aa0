//! Rule-based field extractors for Brazilian receipts.

pub mod amounts;
pub mod category;
pub mod dates;
pub mod description;
pub mod patterns;

pub use amounts::{
    extract_amount, format_locale_amount, normalize_locale_numeral, parse_locale_amount,
    AmountExtractor, AmountRule,
};
pub use category::{classify, CategoryRule, CATEGORY_RULES};
pub use dates::{extract_date, month_from_word, DateExtractor};
pub use description::{summarize, FALLBACK_DESCRIPTION};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract every candidate, best first.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
    /// Name of the rule that produced the match.
    pub rule: Option<&'static str>,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
            rule: None,
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn with_rule(mut self, rule: &'static str) -> Self {
        self.rule = Some(rule);
        self
    }
}
