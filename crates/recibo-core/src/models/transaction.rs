//! Draft transaction models produced by receipt extraction.

use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::receipt::rules::amounts::{format_locale_amount, parse_locale_amount};

/// A non-negative monetary magnitude with two fraction digits.
///
/// No currency is stored; every amount is in reais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Round `value` to cents. Returns `None` for negative values.
    pub fn new(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return None;
        }
        let mut cents = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        cents.rescale(2);
        Some(Self(cents))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ExtractionError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| ExtractionError::InvalidAmount {
            value: value.to_string(),
        })
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_locale_amount(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {}", format_locale_amount(self.0))
    }
}

/// Spending category suggested for a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Combustível")]
    Fuel,
    #[serde(rename = "Hospedagem")]
    Lodging,
    #[serde(rename = "Alimentação")]
    Food,
    #[serde(rename = "Farmácia")]
    Pharmacy,
    #[serde(rename = "Energia")]
    Energy,
    #[serde(rename = "Água")]
    Water,
    #[serde(rename = "Educação")]
    Education,
    #[serde(rename = "Transporte")]
    Transport,
    /// No rule matched.
    #[default]
    #[serde(rename = "Desconhecida")]
    Unknown,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Fuel,
        Category::Lodging,
        Category::Food,
        Category::Pharmacy,
        Category::Energy,
        Category::Water,
        Category::Education,
        Category::Transport,
        Category::Unknown,
    ];

    /// Label shown to the user (and stored by the form).
    pub fn label(&self) -> &'static str {
        match self {
            Category::Fuel => "Combustível",
            Category::Lodging => "Hospedagem",
            Category::Food => "Alimentação",
            Category::Pharmacy => "Farmácia",
            Category::Energy => "Energia",
            Category::Water => "Água",
            Category::Education => "Educação",
            Category::Transport => "Transporte",
            Category::Unknown => "Desconhecida",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Category::Fuel => "fuel",
            Category::Lodging => "lodging",
            Category::Food => "food",
            Category::Pharmacy => "pharmacy",
            Category::Energy => "energy",
            Category::Water => "water",
            Category::Education => "education",
            Category::Transport => "transport",
            Category::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Category::Unknown)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ExtractionError;

    /// Accepts the Portuguese label or the English name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == wanted || c.name() == wanted)
            .ok_or_else(|| ExtractionError::UnknownCategory(s.to_string()))
    }
}

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionKind {
    #[default]
    #[serde(rename = "Despesa")]
    Expense,
    #[serde(rename = "Receita")]
    Income,
}

impl TransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "Despesa",
            TransactionKind::Income => "Receita",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unsaved record assembled from a document, awaiting user confirmation.
///
/// Fields the extractors missed stay empty; the caller prompts for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftTransaction {
    /// Short human-readable description.
    pub description: String,

    /// Detected amount.
    pub amount: Option<Amount>,

    /// Normalized numeral the amount extractor matched ("" when missed).
    #[serde(default)]
    pub amount_text: String,

    /// Detected transaction date.
    pub date: Option<NaiveDate>,

    /// Suggested category.
    pub category: Category,

    /// Always `Expense` for receipts.
    pub kind: TransactionKind,

    /// Leading slice of the raw text, for review only.
    pub ocr_preview: String,
}

/// Values typed by the user on the confirmation form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftOverrides {
    pub description: Option<String>,
    /// Locale numeral, e.g. "1.234,56".
    pub amount: Option<String>,
    /// ISO date, e.g. "2025-10-05".
    pub date: Option<String>,
    pub category: Option<Category>,
}

impl DraftOverrides {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.category.is_none()
    }
}

/// One monthly slice of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position in the plan.
    pub number: u32,
    pub description: String,
    pub amount: Amount,
    pub date: NaiveDate,
    pub category: Category,
    pub kind: TransactionKind,
}

impl DraftTransaction {
    /// Apply user-supplied values. Given values replace extracted ones;
    /// blank strings are ignored.
    pub fn apply_overrides(mut self, overrides: DraftOverrides) -> Result<Self, ExtractionError> {
        if let Some(description) = overrides.description {
            let description = description.trim();
            if !description.is_empty() {
                self.description = description.to_string();
            }
        }

        if let Some(amount) = overrides.amount.filter(|a| !a.trim().is_empty()) {
            let parsed = parse_locale_amount(&amount)?;
            self.amount_text = parsed.value().to_string();
            self.amount = Some(parsed);
        }

        if let Some(date) = overrides.date.filter(|d| !d.trim().is_empty()) {
            let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
                .map_err(|_| ExtractionError::InvalidDate { value: date.clone() })?;
            self.date = Some(parsed);
        }

        if let Some(category) = overrides.category {
            self.category = category;
        }

        Ok(self)
    }

    /// Fields still empty after extraction and overrides.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        missing
    }

    /// Split into `count` monthly installments starting at the draft date.
    pub fn installments(&self, count: u32) -> Result<Vec<Installment>, ExtractionError> {
        if count == 0 {
            return Err(ExtractionError::InvalidInstallments(count));
        }
        let total = self
            .amount
            .ok_or_else(|| ExtractionError::MissingField("amount".to_string()))?;
        let start = self
            .date
            .ok_or_else(|| ExtractionError::MissingField("date".to_string()))?;

        let share = total.value() / Decimal::from(count);
        let amount = Amount::new(share).ok_or_else(|| ExtractionError::InvalidAmount {
            value: share.to_string(),
        })?;

        (0..count)
            .map(|i| {
                let date = start.checked_add_months(Months::new(i)).ok_or_else(|| {
                    ExtractionError::InvalidDate {
                        value: format!("{} + {} months", start, i),
                    }
                })?;
                let description = if count > 1 {
                    format!("{} ({}/{})", self.description, i + 1, count)
                } else {
                    self.description.clone()
                };
                Ok(Installment {
                    number: i + 1,
                    description,
                    amount,
                    date,
                    category: self.category,
                    kind: self.kind,
                })
            })
            .collect()
    }
}
