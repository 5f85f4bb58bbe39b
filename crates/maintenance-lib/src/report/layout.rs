//! Page geometry and the top-down page writer
//!
//! The cursor starts at the top margin and moves down after every drawn
//! line. A new page is started lazily, right before a line would be drawn
//! with the cursor already below the bottom margin, so no line lands past
//! the margin and no page is left empty.

use super::font::Font;
use super::wrap::split_lines;
use serde::{Deserialize, Serialize};

/// ISO A4 in PDF points
pub const A4_WIDTH: f32 = 595.275_6;
pub const A4_HEIGHT: f32 = 841.889_8;

pub const MARGIN: f32 = 40.0;

/// Physical page and its margins, in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: A4_WIDTH,
        height: A4_HEIGHT,
        margin_left: MARGIN,
        margin_right: MARGIN,
        margin_top: MARGIN,
        margin_bottom: MARGIN,
    };

    /// Width available to text between the side margins
    pub fn usable_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Baseline of the first line on a page
    pub fn top(&self) -> f32 {
        self.height - self.margin_top
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// One line of text placed at an explicit baseline position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnLine {
    pub x: f32,
    pub y: f32,
    pub font: Font,
    pub size: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub lines: Vec<DrawnLine>,
}

/// A laid-out report: pages of positioned lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every drawn line with its zero-based page number
    pub fn lines(&self) -> impl Iterator<Item = (usize, &DrawnLine)> {
        self.pages
            .iter()
            .enumerate()
            .flat_map(|(i, page)| page.lines.iter().map(move |line| (i, line)))
    }

    /// Plain text of the document, one drawn line per text line
    pub fn to_text(&self) -> String {
        self.lines()
            .map(|(_, line)| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Cursor-driven writer that paginates as it draws
pub(crate) struct PageWriter {
    geometry: PageGeometry,
    pages: Vec<Page>,
    y: f32,
}

impl PageWriter {
    pub(crate) fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            y: geometry.top(),
        }
    }

    /// Draw one line at the cursor, then move the cursor down by `advance`
    pub(crate) fn draw(&mut self, text: &str, font: Font, size: f32, advance: f32) {
        if self.y < self.geometry.margin_bottom {
            self.pages.push(Page::default());
            self.y = self.geometry.top();
        }
        let line = DrawnLine {
            x: self.geometry.margin_left,
            y: self.y,
            font,
            size,
            text: text.to_string(),
        };
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(line);
        }
        self.y -= advance;
    }

    /// Wrap `text` to the usable width and draw each resulting line
    pub(crate) fn draw_wrapped(&mut self, text: &str, font: Font, size: f32, advance: f32) {
        for line in split_lines(text, font, size, self.geometry.usable_width()) {
            self.draw(&line, font, size, advance);
        }
    }

    /// Move the cursor down without drawing
    pub(crate) fn skip(&mut self, gap: f32) {
        self.y -= gap;
    }

    pub(crate) fn finish(self) -> ReportDocument {
        ReportDocument {
            geometry: self.geometry,
            pages: self.pages,
        }
    }
}
