//! Amount extraction and locale numeral parsing for Brazilian receipts.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use super::patterns::{
    AMOUNT_BARE, AMOUNT_CURRENCY, AMOUNT_GROUPED, AMOUNT_LABELED, AMOUNT_PIX, CURRENCY_MARKER,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::ExtractionError;
use crate::models::Amount;

/// One step of the amount cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRule {
    /// "R$ 12,34"
    Currency,
    /// "Valor total: 12,34", "valor a pagar 12,34"
    Labeled,
    /// Any numeral after "pix"
    Pix,
    /// "1.234,56"
    Grouped,
    /// "45,00"
    Bare,
}

/// Cascade order, most specific first.
pub const AMOUNT_RULES: [AmountRule; 5] = [
    AmountRule::Currency,
    AmountRule::Labeled,
    AmountRule::Pix,
    AmountRule::Grouped,
    AmountRule::Bare,
];

impl AmountRule {
    pub fn pattern(&self) -> &'static Regex {
        match self {
            AmountRule::Currency => &AMOUNT_CURRENCY,
            AmountRule::Labeled => &AMOUNT_LABELED,
            AmountRule::Pix => &AMOUNT_PIX,
            AmountRule::Grouped => &AMOUNT_GROUPED,
            AmountRule::Bare => &AMOUNT_BARE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AmountRule::Currency => "currency",
            AmountRule::Labeled => "labeled",
            AmountRule::Pix => "pix",
            AmountRule::Grouped => "grouped",
            AmountRule::Bare => "bare",
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            AmountRule::Currency => 0.95,
            AmountRule::Labeled => 0.9,
            AmountRule::Pix => 0.8,
            AmountRule::Grouped => 0.7,
            AmountRule::Bare => 0.5,
        }
    }

    /// Apply this rule alone. The value is the normalized numeral.
    pub fn apply(&self, text: &str) -> Option<ExtractionMatch<String>> {
        let caps = self.pattern().captures(text)?;
        let numeral = caps.get(1)?;
        Some(
            ExtractionMatch::new(
                normalize_locale_numeral(numeral.as_str()),
                self.confidence(),
                numeral.as_str(),
            )
            .with_position(numeral.start(), numeral.end())
            .with_rule(self.name()),
        )
    }
}

/// Amount field extractor running the rule cascade.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        AMOUNT_RULES.iter().find_map(|rule| {
            let found = rule.apply(text);
            if let Some(m) = &found {
                trace!("amount rule {} matched {:?}", rule.name(), m.source);
            }
            found
        })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT_RULES.iter().filter_map(|rule| rule.apply(text)).collect()
    }
}

/// Find the most likely amount in `text`, normalized to dot-decimal ("1234.56").
///
/// Returns an empty string when no rule matches.
pub fn extract_amount(text: &str) -> String {
    AmountExtractor::new()
        .extract(text)
        .map(|m| m.value)
        .unwrap_or_default()
}

/// Normalize a locale numeral without converting it.
///
/// Drops "R$" and spaces. When a comma is present it is the decimal
/// separator and every dot is a thousands separator.
pub fn normalize_locale_numeral(s: &str) -> String {
    let stripped = CURRENCY_MARKER.replace_all(s.trim(), "");
    let compact: String = stripped
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{00a0}')
        .collect();

    if compact.contains(',') {
        compact.replace('.', "").replace(',', ".")
    } else {
        compact
    }
}

/// Parse a Brazilian-formatted amount (e.g. "R$ 1.234,56" or "45,00").
///
/// Backs both form input and extracted numerals.
pub fn parse_locale_amount(s: &str) -> Result<Amount, ExtractionError> {
    let invalid = || ExtractionError::InvalidAmount {
        value: s.to_string(),
    };

    let normalized = normalize_locale_numeral(s);
    if normalized.is_empty() {
        return Err(invalid());
    }

    let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    Amount::new(value).ok_or_else(invalid)
}

/// Format amount in Brazilian style (1.234,56).
pub fn format_locale_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some(parts) => parts,
        None => return s,
    };

    // Add thousand separators
    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    if amount.is_sign_negative() && !amount.is_zero() {
        formatted.push('-');
    }

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{},{}", formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_locale_amount() {
        assert_eq!(parse_locale_amount("R$ 1.234,56").unwrap().value(), dec("1234.56"));
        assert_eq!(parse_locale_amount("45,00").unwrap().value(), dec("45.00"));
        assert_eq!(parse_locale_amount("r$12.50").unwrap().value(), dec("12.50"));
        assert_eq!(parse_locale_amount("  1 234,5 ").unwrap().value(), dec("1234.50"));
        assert_eq!(parse_locale_amount("12.345.678,90").unwrap().value(), dec("12345678.90"));
    }

    #[test]
    fn test_parse_locale_amount_invalid() {
        for input in ["", "   ", "R$", "abc", "1.234.56", "12,3,4", "-5,00"] {
            assert_eq!(
                parse_locale_amount(input),
                Err(ExtractionError::InvalidAmount { value: input.to_string() }),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_format_locale_amount() {
        assert_eq!(format_locale_amount(dec("1234.56")), "1.234,56");
        assert_eq!(format_locale_amount(dec("12345678.9")), "12.345.678,90");
        assert_eq!(format_locale_amount(dec("45")), "45,00");
        assert_eq!(format_locale_amount(dec("0.5")), "0,50");
    }

    #[test]
    fn test_format_then_parse_recovers_magnitude() {
        let tolerance = dec("0.01");
        for raw in ["0", "0.01", "9.99", "45", "999.994", "1000", "1234.56", "98765432.1"] {
            let value = dec(raw);
            let parsed = parse_locale_amount(&format_locale_amount(value)).unwrap();
            assert!(
                (parsed.value() - value).abs() <= tolerance,
                "{} came back as {}",
                value,
                parsed.value()
            );
        }
    }

    #[test]
    fn test_labeled_amount_beats_bare_decimal() {
        let text = "Taxa de entrega 45,00\nVALOR TOTAL: 120,00\nObrigado";
        let found = AmountExtractor::new().extract(text).unwrap();

        assert_eq!(found.value, "120.00");
        assert_eq!(found.source, "120,00");
        assert_eq!(found.rule, Some("labeled"));
        assert_eq!(extract_amount(text), "120.00");
    }

    #[test]
    fn test_currency_amount_first() {
        let text = "Valor: 10,00\nTotal R$ 1.234,56";
        assert_eq!(extract_amount(text), "1234.56");
    }

    #[test]
    fn test_labeled_variants() {
        assert_eq!(extract_amount("valor pago 89,90"), "89.90");
        assert_eq!(extract_amount("Valor do pagamento: 15,00"), "15.00");
        assert_eq!(extract_amount("valor a pagar\n230,10"), "230.10");
    }

    #[test]
    fn test_pix_amount_spans_lines() {
        let text = "Transferência PIX enviada\npara Maria\n35,90";
        let found = AmountExtractor::new().extract(text).unwrap();
        assert_eq!(found.rule, Some("pix"));
        assert_eq!(found.value, "35.90");
    }

    #[test]
    fn test_grouped_then_bare() {
        assert_eq!(extract_amount("Total 1.234,56 em 2x"), "1234.56");
        assert_eq!(extract_amount("Total 45,00"), "45.00");
    }

    #[test]
    fn test_bare_rule_keeps_false_positives() {
        assert_eq!(extract_amount("Fone 1234,56"), "1234.56");
    }

    #[test]
    fn test_no_amount() {
        assert_eq!(extract_amount("Obrigado pela preferência"), "");
        assert!(AmountExtractor::new().extract_all("nada aqui").is_empty());
    }

    #[test]
    fn test_extract_all_lists_rules_in_order() {
        let text = "R$ 10,00\nvalor 20,00\n1.000,00";
        let rules: Vec<_> = AmountExtractor::new()
            .extract_all(text)
            .into_iter()
            .map(|m| m.rule.unwrap())
            .collect();
        assert_eq!(rules, vec!["currency", "labeled", "grouped", "bare"]);
    }
}
