/// Export surfaces for a finished prediction report.
///
/// Each surface turns the same [`ReportInput`] into one kind of artifact:
/// - `cards` - JSON array of display cards
/// - `text` - bulleted clipboard text
/// - `pdf` - paginated A4 document
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::ReportError;
use crate::pdf::render_pdf;
use crate::plain_text::to_plain_text;
use crate::report::{build_report, ReportInput};
use crate::view::render_cards;

const FILE_PREFIX: &str = "EcoOyster_Report";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Cards,
    Text,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Cards => "json",
            ExportFormat::Text => "txt",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Cards => "application/json",
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// The surface that produces this format.
    pub fn surface(self) -> Box<dyn ExportSurface> {
        match self {
            ExportFormat::Cards => Box::new(CardsSurface),
            ExportFormat::Text => Box::new(PlainTextSurface),
            ExportFormat::Pdf => Box::new(PdfSurface),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cards" | "json" => Ok(ExportFormat::Cards),
            "text" | "txt" | "clipboard" => Ok(ExportFormat::Text),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!(
                "unknown export format '{other}'. Valid formats: cards, text, pdf"
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Cards => "cards",
            ExportFormat::Text => "text",
            ExportFormat::Pdf => "pdf",
        };
        f.write_str(name)
    }
}

/// A rendered artifact, ready to hand to the clipboard or the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
    /// Number of pages for paginated formats; `None` otherwise.
    pub page_count: Option<usize>,
}

pub trait ExportSurface {
    fn format(&self) -> ExportFormat;

    fn export(&self, input: &ReportInput<'_>) -> Result<Export, ReportError>;
}

/// `EcoOyster_Report_<YYYY-MM-DD>.<ext>`
pub fn report_file_name(date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "{FILE_PREFIX}_{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

fn artifact(input: &ReportInput<'_>, format: ExportFormat, bytes: Vec<u8>, page_count: Option<usize>) -> Export {
    debug!(%format, bytes = bytes.len(), "export rendered");
    Export {
        file_name: report_file_name(input.generated_at.date(), format),
        media_type: format.media_type(),
        bytes,
        page_count,
    }
}

pub struct CardsSurface;

impl ExportSurface for CardsSurface {
    fn format(&self) -> ExportFormat {
        ExportFormat::Cards
    }

    fn export(&self, input: &ReportInput<'_>) -> Result<Export, ReportError> {
        let cards = render_cards(input.advice);
        let bytes = serde_json::to_vec_pretty(&cards)?;
        Ok(artifact(input, self.format(), bytes, None))
    }
}

pub struct PlainTextSurface;

impl ExportSurface for PlainTextSurface {
    fn format(&self) -> ExportFormat {
        ExportFormat::Text
    }

    fn export(&self, input: &ReportInput<'_>) -> Result<Export, ReportError> {
        let text = to_plain_text(input.advice);
        Ok(artifact(input, self.format(), text.into_bytes(), None))
    }
}

pub struct PdfSurface;

impl ExportSurface for PdfSurface {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn export(&self, input: &ReportInput<'_>) -> Result<Export, ReportError> {
        let document = build_report(input)?;
        let bytes = render_pdf(&document);
        Ok(artifact(input, self.format(), bytes, Some(document.page_count())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::prediction::{predict, FarmInputs};
    use crate::view::AdviceCard;
    use chrono::NaiveDateTime;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .and_then(|d| d.and_hms_opt(14, 5, 0))
            .unwrap()
    }

    const ADVICE: &str = "**Salinity Management**\n- Monitor **salinity** levels\n### Weather Preparedness\n- Secure rafts before typhoons";

    #[test]
    fn format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("clipboard".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Cards);
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn file_name_convention() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(report_file_name(date, ExportFormat::Pdf), "EcoOyster_Report_2026-10-17.pdf");
    }

    #[test]
    fn every_format_exports_from_the_same_input() {
        let advice = classify(ADVICE);
        let result = predict(FarmInputs::new(22.5, 3, 1, 0).unwrap());
        let input = ReportInput {
            result: &result,
            advice: &advice,
            generated_at: generated_at(),
        };

        let text = ExportFormat::Text.surface().export(&input).unwrap();
        assert_eq!(
            String::from_utf8(text.bytes).unwrap(),
            "• Monitor <em>salinity</em> levels\n• Secure rafts before typhoons"
        );
        assert_eq!(text.file_name, "EcoOyster_Report_2026-10-17.txt");

        let cards = ExportFormat::Cards.surface().export(&input).unwrap();
        let parsed: Vec<AdviceCard> = serde_json::from_slice(&cards.bytes).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].title, "Salinity Management");

        let pdf = ExportFormat::Pdf.surface().export(&input).unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF-"));
        assert_eq!(pdf.page_count, Some(1));
        assert_eq!(pdf.media_type, "application/pdf");
    }

    #[test]
    fn pdf_export_surfaces_layout_errors() {
        let raw = format!("- {}", "w".repeat(20_000));
        let advice = classify(&raw);
        let result = predict(FarmInputs::new(22.5, 3, 1, 0).unwrap());
        let input = ReportInput {
            result: &result,
            advice: &advice,
            generated_at: generated_at(),
        };
        let err = PdfSurface.export(&input).unwrap_err();
        assert!(matches!(err, ReportError::LayoutOverflow { .. }));
        // Text export of the same advice still works.
        assert!(PlainTextSurface.export(&input).is_ok());
    }
}
