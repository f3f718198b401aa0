//! Date extraction for Brazilian receipts.

use std::collections::HashMap;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use tracing::trace;

use super::patterns::{DATE_NUMERIC, DATE_TEXTUAL};
use super::{ExtractionMatch, FieldExtractor};

lazy_static! {
    /// Portuguese month names and their three-letter abbreviations.
    static ref MONTHS: HashMap<&'static str, u32> = [
        ("jan", 1), ("janeiro", 1),
        ("fev", 2), ("fevereiro", 2),
        ("mar", 3), ("março", 3), ("marco", 3),
        ("abr", 4), ("abril", 4),
        ("mai", 5), ("maio", 5),
        ("jun", 6), ("junho", 6),
        ("jul", 7), ("julho", 7),
        ("ago", 8), ("agosto", 8),
        ("set", 9), ("setembro", 9),
        ("out", 10), ("outubro", 10),
        ("nov", 11), ("novembro", 11),
        ("dez", 12), ("dezembro", 12),
    ]
    .into_iter()
    .collect();
}

/// Date field extractor.
///
/// Numeric `dd/mm/yyyy` dates take precedence over textual ones
/// ("25 de Outubro de 2025"). Only the first candidate of each form is
/// considered, and an impossible calendar date is dropped rather than
/// adjusted.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    /// First `dd/mm/yy(yy)` occurrence, if it is a real date.
    pub fn extract_numeric(&self, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
        let caps = DATE_NUMERIC.captures(text)?;
        let full_match = caps.get(0)?;

        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = match caps[3].len() {
            4 => caps[3].parse().ok()?,
            2 => expand_year(caps[3].parse().ok()?),
            _ => return None,
        };

        let date = NaiveDate::from_ymd_opt(year, month, day);
        if date.is_none() {
            trace!("rejected numeric date {:?}", full_match.as_str());
        }

        Some(
            ExtractionMatch::new(date?, 0.9, full_match.as_str())
                .with_position(full_match.start(), full_match.end())
                .with_rule("numeric"),
        )
    }

    /// First `<day> [de] <month> [,/-] [de] <year>` occurrence, if valid.
    pub fn extract_textual(&self, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
        let caps = DATE_TEXTUAL.captures(text)?;
        let full_match = caps.get(0)?;

        let day: u32 = caps[1].parse().ok()?;
        let month = month_from_word(&caps[2]).unwrap_or(0);
        let year = expand_year(caps[3].parse().ok()?);

        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            trace!("rejected textual date {:?}", full_match.as_str());
            return None;
        }

        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(
            ExtractionMatch::new(date, 0.85, full_match.as_str())
                .with_position(full_match.start(), full_match.end())
                .with_rule("textual"),
        )
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_numeric(text)
            .or_else(|| self.extract_textual(text))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.extract_numeric(text)
            .into_iter()
            .chain(self.extract_textual(text))
            .collect()
    }
}

/// Find the transaction date in `text` as ISO `YYYY-MM-DD`, or an empty string.
pub fn extract_date(text: &str) -> String {
    DateExtractor::new()
        .extract(text)
        .map(|m| m.value.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Month number for a Portuguese month word.
///
/// The first three letters are looked up before the whole word, so any word
/// starting like a month abbreviation ("Outubro", "OUT.", "setembro") maps
/// to that month.
pub fn month_from_word(word: &str) -> Option<u32> {
    let lower = word.to_lowercase();
    let prefix: String = lower.chars().take(3).collect();
    MONTHS
        .get(prefix.as_str())
        .or_else(|| MONTHS.get(lower.as_str()))
        .copied()
}

fn expand_year(year: i32) -> i32 {
    if year < 100 { 2000 + year } else { year }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_numeric_date() {
        assert_eq!(extract_date("Pago em 05/10/2025"), "2025-10-05");
        assert_eq!(extract_date("Emissão 15/01/24 14:32"), "2024-01-15");
    }

    #[test]
    fn test_extract_textual_date() {
        assert_eq!(extract_date("25 de Outubro de 2025"), "2025-10-25");
        assert_eq!(extract_date("Data: 25 Out, 2025"), "2025-10-25");
        assert_eq!(extract_date("3 MAR 25"), "2025-03-03");
        assert_eq!(extract_date("1 de março/2024"), "2024-03-01");
    }

    #[test]
    fn test_textual_december_without_joiner() {
        assert_eq!(extract_date("25 Dez 2025"), "2025-12-25");
        assert_eq!(extract_date("25 dezembro 2025"), "2025-12-25");
        assert_eq!(extract_date("Data: 3 DEZ, 24"), "2024-12-03");
        assert_eq!(extract_date("25 de dezembro de 2025"), "2025-12-25");
    }

    #[test]
    fn test_invalid_calendar_date_is_empty() {
        assert_eq!(extract_date("31/04/2025"), "");
        assert_eq!(extract_date("31 de abril de 2025"), "");
        assert_eq!(extract_date("10/13/2025"), "");
    }

    #[test]
    fn test_numeric_takes_precedence() {
        let text = "25 de Outubro de 2025\nAutenticação 01/11/2025";
        let found = DateExtractor::new().extract(text).unwrap();

        assert_eq!(found.value, NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(found.rule, Some("numeric"));
        assert_eq!(DateExtractor::new().extract_all(text).len(), 2);
    }

    #[test]
    fn test_invalid_numeric_falls_back_to_textual() {
        let text = "Ref 99/99/2025\n7 de julho de 2025";
        assert_eq!(extract_date(text), "2025-07-07");
    }

    #[test]
    fn test_unknown_month_word_is_empty() {
        assert_eq!(extract_date("12 caixas 2025"), "");
    }

    #[test]
    fn test_month_from_word() {
        assert_eq!(month_from_word("Março"), Some(3));
        assert_eq!(month_from_word("marco"), Some(3));
        assert_eq!(month_from_word("DEZEMBRO"), Some(12));
        assert_eq!(month_from_word("setembro"), Some(9));
        assert_eq!(month_from_word("de"), None);
    }

    #[test]
    fn test_no_date() {
        assert_eq!(extract_date("Obrigado e volte sempre"), "");
    }
}
