//! Receipt field extraction module.

mod parser;
pub mod rules;

pub use parser::{ExtractionResult, ReceiptParser};
pub use rules::{classify, extract_amount, extract_date, parse_locale_amount, summarize};
