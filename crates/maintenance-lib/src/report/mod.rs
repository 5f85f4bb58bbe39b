//! Maintenance report layout and rendering
//!
//! Lays out a paginated, sectioned report (header, material
//! identification, prediction summary, explanation, recommendation and
//! disclaimer) and writes it as a PDF.

mod font;
mod layout;
mod pdf;
mod wrap;

pub use font::Font;
pub use layout::{DrawnLine, Page, PageGeometry, ReportDocument, A4_HEIGHT, A4_WIDTH, MARGIN};
pub use wrap::split_lines;

use crate::error::RenderError;
use crate::models::PredictionResult;
use crate::observability::{MaintenanceMetrics, StructuredLogger};
use chrono::{Local, NaiveDateTime};
use layout::PageWriter;
use std::path::Path;
use tempfile::NamedTempFile;

pub const TITLE_SIZE: f32 = 16.0;
pub const TITLE_ADVANCE: f32 = 30.0;
pub const HEADING_SIZE: f32 = 12.0;
pub const HEADING_ADVANCE: f32 = 22.0;
pub const BODY_SIZE: f32 = 10.0;
pub const BODY_ADVANCE: f32 = 14.0;
pub const RULE_ADVANCE: f32 = 18.0;
/// Extra space between explanation paragraphs
pub const PARAGRAPH_GAP: f32 = 7.0;

pub const REPORT_TITLE: &str = "Predictive Maintenance Report";
pub const DISCLAIMER_TEXT: &str = "This report is generated using machine learning and AI-based analysis \
    from user-provided data. It is intended to support maintenance decisions \
    and should be reviewed by a qualified engineer before implementation.";

pub const HEADING_MATERIAL: &str = "1. Material Identification";
pub const HEADING_PREDICTION: &str = "2. Machine Learning Prediction Summary";
pub const HEADING_EXPLANATION: &str = "3. AI-Based Explanation";
pub const HEADING_RECOMMENDATION: &str = "4. Maintenance Recommendation";
pub const HEADING_DISCLAIMER: &str = "Disclaimer";

const RULE_WIDTH: usize = 90;

/// Everything one report shows
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    /// (label, value) pairs in display order
    pub fields: &'a [(String, String)],
    pub prediction: &'a PredictionResult,
    pub explanation: &'a str,
    pub generated_at: NaiveDateTime,
}

impl<'a> ReportInput<'a> {
    pub fn new(
        fields: &'a [(String, String)],
        prediction: &'a PredictionResult,
        explanation: &'a str,
    ) -> Self {
        Self {
            fields,
            prediction,
            explanation,
            generated_at: Local::now().naive_local(),
        }
    }

    pub fn with_generated_at(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = generated_at;
        self
    }
}

/// Lays out maintenance reports
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    geometry: PageGeometry,
    disclaimer: String,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self {
            geometry: PageGeometry::A4,
            disclaimer: DISCLAIMER_TEXT.to_string(),
        }
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_disclaimer(mut self, disclaimer: impl Into<String>) -> Self {
        self.disclaimer = disclaimer.into();
        self
    }

    /// Lay out the report. Pure: nothing is written anywhere.
    pub fn render(&self, input: &ReportInput<'_>) -> ReportDocument {
        let mut w = PageWriter::new(self.geometry);
        let rule = "-".repeat(RULE_WIDTH);
        let body = |w: &mut PageWriter, text: &str| {
            w.draw_wrapped(text, Font::Helvetica, BODY_SIZE, BODY_ADVANCE)
        };
        let heading = |w: &mut PageWriter, text: &str| {
            w.draw(text, Font::HelveticaBold, HEADING_SIZE, HEADING_ADVANCE)
        };
        let separator = |w: &mut PageWriter| {
            w.draw(&rule, Font::Helvetica, BODY_SIZE, RULE_ADVANCE)
        };

        w.draw(REPORT_TITLE, Font::HelveticaBold, TITLE_SIZE, TITLE_ADVANCE);
        body(
            &mut w,
            &format!("Generated on: {}", input.generated_at.format("%Y-%m-%d %H:%M:%S")),
        );
        separator(&mut w);

        heading(&mut w, HEADING_MATERIAL);
        for (label, value) in input.fields {
            body(&mut w, &format!("{}: {}", label, value));
        }
        separator(&mut w);

        let prediction = input.prediction;
        heading(&mut w, HEADING_PREDICTION);
        body(&mut w, &format!("Predicted Condition: {}", prediction.label));
        body(&mut w, &format!("Risk Confidence: {:.2}%", prediction.confidence));
        body(&mut w, &format!("Risk Level: {}", prediction.risk_tier));
        separator(&mut w);

        heading(&mut w, HEADING_EXPLANATION);
        let paragraphs = input.explanation.lines().filter(|p| !p.trim().is_empty());
        for (i, paragraph) in paragraphs.enumerate() {
            if i > 0 {
                w.skip(PARAGRAPH_GAP);
            }
            body(&mut w, paragraph);
        }
        separator(&mut w);

        heading(&mut w, HEADING_RECOMMENDATION);
        body(&mut w, &prediction.recommendation);
        separator(&mut w);

        heading(&mut w, HEADING_DISCLAIMER);
        body(&mut w, &self.disclaimer);

        w.finish()
    }

    /// Lay out the report and write it as a PDF to `path`.
    ///
    /// The file is written next to the destination and renamed into place
    /// once complete. A failed write leaves no partial file behind.
    pub fn render_to(
        &self,
        path: impl AsRef<Path>,
        input: &ReportInput<'_>,
    ) -> Result<ReportDocument, RenderError> {
        let path = path.as_ref();
        let document = self.render(input);
        let io_err = |source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        // Removed on drop unless persisted
        let mut temp = NamedTempFile::new_in(parent).map_err(io_err)?;
        document.write_pdf(temp.as_file_mut()).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(path).map_err(|e| io_err(e.error))?;

        MaintenanceMetrics::new().record_report(document.page_count());
        StructuredLogger::new("report")
            .log_report_rendered(&path.display().to_string(), document.page_count());
        Ok(document)
    }

    /// Lay out the report and encode it as PDF bytes
    pub fn render_pdf(
        &self,
        input: &ReportInput<'_>,
    ) -> Result<(ReportDocument, Vec<u8>), RenderError> {
        let document = self.render(input);
        let bytes = document.to_pdf_bytes()?;
        MaintenanceMetrics::new().record_report(document.page_count());
        Ok((document, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskTier;
    use chrono::NaiveDate;

    fn prediction() -> PredictionResult {
        PredictionResult {
            label: "Good".to_string(),
            label_code: 1,
            confidence: 92.3,
            risk_tier: RiskTier::High,
            recommendation: "No maintenance required.".to_string(),
            probabilities: Vec::new(),
            model_version: "v1".to_string(),
        }
    }

    fn fields() -> Vec<(String, String)> {
        vec![
            ("Material Type".to_string(), "Steel".to_string()),
            ("Material Age (days)".to_string(), "60".to_string()),
            ("Usage Frequency".to_string(), "Medium".to_string()),
            ("Humidity Exposure".to_string(), "Medium".to_string()),
            ("Load Stress Level".to_string(), "Medium".to_string()),
            ("Cracks Visible".to_string(), "No".to_string()),
            ("Days Since Last Maintenance".to_string(), "45".to_string()),
        ]
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn render(renderer: &ReportRenderer, explanation: &str) -> ReportDocument {
        let fields = fields();
        let prediction = prediction();
        let input = ReportInput::new(&fields, &prediction, explanation).with_generated_at(timestamp());
        renderer.render(&input)
    }

    fn line_index(doc: &ReportDocument, text: &str) -> usize {
        doc.lines()
            .position(|(_, l)| l.text == text)
            .unwrap_or_else(|| panic!("missing line {text:?}"))
    }

    #[test]
    fn test_sections_in_order() {
        let doc = render(&ReportRenderer::new(), "Steel is in good shape.");
        assert_eq!(doc.page_count(), 1);
        let order = [
            REPORT_TITLE,
            "Generated on: 2024-03-01 09:30:00",
            HEADING_MATERIAL,
            "Material Type: Steel",
            "Days Since Last Maintenance: 45",
            HEADING_PREDICTION,
            "Predicted Condition: Good",
            "Risk Confidence: 92.30%",
            "Risk Level: HIGH",
            HEADING_EXPLANATION,
            "Steel is in good shape.",
            HEADING_RECOMMENDATION,
            "No maintenance required.",
            HEADING_DISCLAIMER,
        ];
        let positions: Vec<_> = order.iter().map(|t| line_index(&doc, t)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn test_headings_use_bold_font() {
        let doc = render(&ReportRenderer::new(), "text");
        for (_, line) in doc.lines() {
            let is_heading = [
                HEADING_MATERIAL,
                HEADING_PREDICTION,
                HEADING_EXPLANATION,
                HEADING_RECOMMENDATION,
                HEADING_DISCLAIMER,
            ]
            .contains(&line.text.as_str());
            if is_heading {
                assert_eq!(line.font, Font::HelveticaBold);
                assert_eq!(line.size, HEADING_SIZE);
            } else if line.text == REPORT_TITLE {
                assert_eq!(line.size, TITLE_SIZE);
            } else {
                assert_eq!(line.font, Font::Helvetica);
                assert_eq!(line.size, BODY_SIZE);
            }
        }
    }

    #[test]
    fn test_explanation_paragraphs_are_separated() {
        let doc = render(&ReportRenderer::new(), "First paragraph.\nSecond paragraph.");
        let lines: Vec<_> = doc.lines().map(|(_, l)| l).collect();
        let first = lines.iter().find(|l| l.text == "First paragraph.").unwrap();
        let second = lines.iter().find(|l| l.text == "Second paragraph.").unwrap();
        assert!((first.y - second.y - (BODY_ADVANCE + PARAGRAPH_GAP)).abs() < 1e-3);
    }

    #[test]
    fn test_long_paragraphs_wrap_independently() {
        let para = "corrosion ".repeat(60);
        let explanation = format!("{}\n{}", para.trim(), para.trim());
        let doc = render(&ReportRenderer::new(), &explanation);
        let usable = PageGeometry::A4.usable_width();
        let body_lines: Vec<_> = doc
            .lines()
            .map(|(_, l)| l)
            .filter(|l| l.text.starts_with("corrosion"))
            .collect();
        assert_eq!(body_lines.len() % 2, 0);
        let half = body_lines.len() / 2;
        for i in 0..half {
            assert_eq!(body_lines[i].text, body_lines[i + half].text);
        }
        for line in body_lines {
            assert!(line.font.string_width(&line.text, line.size) <= usable);
        }
    }

    #[test]
    fn test_blank_explanation_lines_are_dropped() {
        let doc = render(&ReportRenderer::new(), "One.\n\n\nTwo.");
        let one = line_index(&doc, "One.");
        assert_eq!(line_index(&doc, "Two."), one + 1);
    }

    #[test]
    fn test_long_disclaimer_breaks_exactly_once() {
        // 480 words at 8 words per line: 60 lines, more than one page holds
        let disclaimer = "maintenance ".repeat(480);
        let renderer = ReportRenderer::new().with_disclaimer(disclaimer.trim());
        let doc = render(&renderer, "Short explanation.");

        assert_eq!(doc.page_count(), 2);
        let heading_page = doc
            .lines()
            .find(|(_, l)| l.text == HEADING_DISCLAIMER)
            .map(|(p, _)| p)
            .unwrap();
        assert_eq!(heading_page, 0);

        let disclaimer_lines: Vec<_> = doc
            .lines()
            .filter(|(_, l)| l.text.starts_with("maintenance"))
            .collect();
        assert_eq!(disclaimer_lines.len(), 60);
        assert!(disclaimer_lines.iter().any(|(p, _)| *p == 0));
        assert!(disclaimer_lines.iter().any(|(p, _)| *p == 1));
        assert!(doc.pages[1].lines.iter().all(|l| l.text.starts_with("maintenance")));

        let geometry = PageGeometry::A4;
        for (_, line) in doc.lines() {
            assert!(line.y >= geometry.margin_bottom, "line below margin at {}", line.y);
            assert!(line.y <= geometry.top() + 1e-3);
        }
        assert!((doc.pages[1].lines[0].y - geometry.top()).abs() < 1e-3);
    }

    #[test]
    fn test_no_blank_pages() {
        let explanation = "decay ".repeat(3000);
        let doc = render(&ReportRenderer::new(), &explanation);
        assert!(doc.page_count() > 1);
        assert!(doc.pages.iter().all(|p| !p.lines.is_empty()));
    }

    #[test]
    fn test_render_to_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Maintenance_Report.pdf");
        let fields = fields();
        let prediction = prediction();
        let input = ReportInput::new(&fields, &prediction, "ok");
        let doc = ReportRenderer::new().render_to(&path, &input).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert_eq!(doc.page_count(), 1);
        assert!(!dir.path().join("Maintenance_Report.pdf.tmp").exists());
    }

    #[test]
    fn test_failed_rename_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Maintenance_Report.pdf");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), b"occupied").unwrap();
        let fields = fields();
        let prediction = prediction();
        let input = ReportInput::new(&fields, &prediction, "ok");
        assert!(matches!(
            ReportRenderer::new().render_to(&path, &input),
            Err(RenderError::Io { .. })
        ));
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("Maintenance_Report.pdf")]);
    }

    #[test]
    fn test_render_to_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("report.pdf");
        let fields = fields();
        let prediction = prediction();
        let input = ReportInput::new(&fields, &prediction, "ok");
        assert!(matches!(
            ReportRenderer::new().render_to(&path, &input),
            Err(RenderError::Io { .. })
        ));
    }
}
