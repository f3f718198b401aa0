//! Renderings of an extracted draft (JSON, CSV, text).

use serde::Serialize;

use recibo_core::{
    DraftOverrides, DraftTransaction, ExtractionError, ExtractionResult, Installment,
};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// A draft plus everything the user needs to confirm it.
#[derive(Debug, Serialize)]
pub struct DraftReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub draft: DraftTransaction,
    pub warnings: Vec<String>,
    pub missing_fields: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub installments: Vec<Installment>,
    pub processing_time_ms: u64,
}

impl DraftReport {
    pub fn new(file: Option<String>, result: ExtractionResult) -> Self {
        let missing_fields = result.draft.missing_fields();
        Self {
            file,
            draft: result.draft,
            warnings: result.warnings,
            missing_fields,
            installments: Vec::new(),
            processing_time_ms: result.processing_time_ms,
        }
    }

    /// Apply user values and refresh the missing field list.
    pub fn with_overrides(mut self, overrides: DraftOverrides) -> Result<Self, ExtractionError> {
        if overrides.is_empty() {
            return Ok(self);
        }
        self.draft = self.draft.apply_overrides(overrides)?;
        self.missing_fields = self.draft.missing_fields();
        Ok(self)
    }

    pub fn with_installments(mut self, count: Option<u32>) -> Result<Self, ExtractionError> {
        if let Some(count) = count {
            self.installments = self.draft.installments(count)?;
        }
        Ok(self)
    }
}

pub fn format_report(report: &DraftReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_csv(report: &DraftReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "file",
        "installment",
        "description",
        "amount",
        "date",
        "category",
        "kind",
    ])?;

    let file = report.file.as_deref().unwrap_or("");
    let draft = &report.draft;

    if report.installments.is_empty() {
        wtr.write_record([
            file,
            "",
            &draft.description,
            &draft.amount.map(|a| a.value().to_string()).unwrap_or_default(),
            &draft.date.map(|d| d.to_string()).unwrap_or_default(),
            draft.category.label(),
            draft.kind.label(),
        ])?;
    } else {
        let count = report.installments.len();
        for installment in &report.installments {
            wtr.write_record([
                file,
                &format!("{}/{}", installment.number, count),
                &installment.description,
                &installment.amount.value().to_string(),
                &installment.date.to_string(),
                installment.category.label(),
                installment.kind.label(),
            ])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &DraftReport) -> String {
    let draft = &report.draft;
    let mut output = String::new();

    if let Some(file) = &report.file {
        output.push_str(&format!("File: {}\n", file));
    }
    output.push_str(&format!("Description: {}\n", draft.description));
    output.push_str(&format!(
        "Amount:      {}\n",
        draft.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
    ));
    output.push_str(&format!(
        "Date:        {}\n",
        draft.date.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_else(|| "-".to_string())
    ));
    output.push_str(&format!("Category:    {}\n", draft.category));
    output.push_str(&format!("Kind:        {}\n", draft.kind));

    if !report.installments.is_empty() {
        output.push_str("\nInstallments:\n");
        for installment in &report.installments {
            output.push_str(&format!(
                "  {}  {}  {}\n",
                installment.date.format("%d/%m/%Y"),
                installment.amount,
                installment.description
            ));
        }
    }

    if !report.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &report.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use recibo_core::ReceiptParser;

    const RECEIPT: &str = "Colégio Santa Maria\nMensalidade escolar\nValor: 900,00\n31/01/2025";

    fn report() -> DraftReport {
        DraftReport::new(
            Some("boleto.pdf".to_string()),
            ReceiptParser::new().parse(RECEIPT),
        )
    }

    #[test]
    fn test_csv_installment_rows() {
        let report = report().with_installments(Some(3)).unwrap();
        let csv = format_report(&report, OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[2],
            "boleto.pdf,2/3,Colégio Santa Maria (2/3),300.00,2025-02-28,Educação,Despesa"
        );
    }

    #[test]
    fn test_text_rendering() {
        let text = format_report(&report(), OutputFormat::Text).unwrap();
        assert!(text.contains("Amount:      R$ 900,00"));
        assert!(text.contains("Date:        31/01/2025"));
        assert!(text.contains("Category:    Educação"));
    }

    #[test]
    fn test_overrides_refresh_missing_fields() {
        let report = DraftReport::new(None, ReceiptParser::new().parse("Loja XYZ Ltda"));
        assert_eq!(report.missing_fields, vec!["amount", "date"]);

        let report = report
            .with_overrides(DraftOverrides {
                amount: Some("45,00".to_string()),
                date: Some("2025-10-05".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(report.missing_fields.is_empty());
    }
}
