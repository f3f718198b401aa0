//! Common regex patterns for Brazilian receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Amount cascade, most specific first
    pub static ref AMOUNT_CURRENCY: Regex = Regex::new(
        r"(?is)R\$\s*([\d.,]+)"
    ).unwrap();

    pub static ref AMOUNT_LABELED: Regex = Regex::new(
        r"(?is)valor(?:\s*(?:total|pago|do\s*pagamento|a\s*pagar))?[:\s]*([\d.,]+)"
    ).unwrap();

    pub static ref AMOUNT_PIX: Regex = Regex::new(
        r"(?is)pix.*?([\d.,]+)"
    ).unwrap();

    pub static ref AMOUNT_GROUPED: Regex = Regex::new(
        r"(?is)\b(\d{1,3}(?:\.\d{3})+,\d{2})\b"
    ).unwrap();

    pub static ref AMOUNT_BARE: Regex = Regex::new(
        r"(?is)\b(\d+,\d{2})\b"
    ).unwrap();

    // dd/mm/yy or dd/mm/yyyy
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{2})/(\d{2})/(\d{2,4})\b"
    ).unwrap();

    // "25 Out, 2025", "25 Out 2025", "25 de Outubro de 2025"
    pub static ref DATE_TEXTUAL: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s*(?:de\s+)?([A-Za-zçÇáÁéÉíÍóÓúÚãõÃÕ]+)[\s,/-]+(?:de\s+)?(\d{2,4})\b"
    ).unwrap();

    // Currency marker stripped by the locale parser
    pub static ref CURRENCY_MARKER: Regex = Regex::new(
        r"(?i)R\$"
    ).unwrap();
}
