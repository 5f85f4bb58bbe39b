//! Minimal PDF 1.4 writer for laid-out reports
//!
//! Text only, in the two standard Helvetica faces with WinAnsi encoding.
//! Fonts are referenced, not embedded.

use super::font::Font;
use super::layout::{Page, ReportDocument};
use std::io::{self, Write};

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const REGULAR_FONT_ID: usize = 3;
const BOLD_FONT_ID: usize = 4;
const FIRST_PAGE_ID: usize = 5;

impl ReportDocument {
    /// Encode the document as a PDF file
    pub fn write_pdf<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut pdf = PdfBuffer::default();
        pdf.buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let page_ids: Vec<usize> = (0..self.pages.len())
            .map(|i| FIRST_PAGE_ID + 2 * i)
            .collect();

        pdf.object(CATALOG_ID, |b| {
            write!(b, "<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID)
        })?;
        pdf.object(PAGES_ID, |b| {
            let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
            write!(
                b,
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                page_ids.len()
            )
        })?;
        for (id, font) in [(REGULAR_FONT_ID, Font::Helvetica), (BOLD_FONT_ID, Font::HelveticaBold)] {
            pdf.object(id, |b| {
                write!(
                    b,
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.base_name()
                )
            })?;
        }

        let (width, height) = (self.geometry.width, self.geometry.height);
        for (page, &page_id) in self.pages.iter().zip(&page_ids) {
            let content_id = page_id + 1;
            pdf.object(page_id, |b| {
                write!(
                    b,
                    "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.4} {:.4}] \
                     /Resources << /Font << /F1 {} 0 R /F2 {} 0 R >> >> /Contents {} 0 R >>",
                    PAGES_ID, width, height, REGULAR_FONT_ID, BOLD_FONT_ID, content_id
                )
            })?;

            let stream = content_stream(page)?;
            pdf.object(content_id, |b| {
                write!(b, "<< /Length {} >>\nstream\n", stream.len())?;
                b.write_all(&stream)?;
                b.write_all(b"\nendstream")
            })?;
        }

        pdf.finish(CATALOG_ID)?;
        out.write_all(&pdf.buf)
    }

    /// Encode the document as PDF bytes
    pub fn to_pdf_bytes(&self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_pdf(&mut bytes)?;
        Ok(bytes)
    }
}

/// Output buffer that records object offsets for the xref table
#[derive(Default)]
struct PdfBuffer {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfBuffer {
    fn object<F>(&mut self, id: usize, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        self.offsets.push((id, self.buf.len()));
        write!(self.buf, "{} 0 obj\n", id)?;
        body(&mut self.buf)?;
        self.buf.extend_from_slice(b"\nendobj\n");
        Ok(())
    }

    fn finish(&mut self, root: usize) -> io::Result<()> {
        self.offsets.sort_unstable();
        let size = self.offsets.len() + 1;
        let xref_offset = self.buf.len();

        write!(self.buf, "xref\n0 {}\n", size)?;
        self.buf.extend_from_slice(b"0000000000 65535 f \n");
        for (_, offset) in &self.offsets {
            write!(self.buf, "{:010} 00000 n \n", offset)?;
        }
        write!(
            self.buf,
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, root, xref_offset
        )
    }
}

fn content_stream(page: &Page) -> io::Result<Vec<u8>> {
    let mut stream = Vec::new();
    for line in &page.lines {
        let resource = match line.font {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
        };
        write!(
            stream,
            "BT /{} {} Tf {:.2} {:.2} Td (",
            resource, line.size, line.x, line.y
        )?;
        stream.extend(escape_text(&line.text));
        stream.extend_from_slice(b") Tj ET\n");
    }
    Ok(stream)
}

/// WinAnsi-encode `text` as the body of a PDF literal string
fn escape_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match winansi(c) {
            byte @ (b'(' | b')' | b'\\') => {
                out.push(b'\\');
                out.push(byte);
            }
            byte @ 0x20..=0x7E => out.push(byte),
            byte => out.extend(format!("\\{:03o}", byte).bytes()),
        }
    }
    out
}

/// Map a character to its WinAnsi code, `?` when it has none
fn winansi(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{00A0}'..='\u{00FF}' => c as u32 as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2030}' => 0x89,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{2122}' => 0x99,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::super::layout::{DrawnLine, PageGeometry};
    use super::*;

    fn document(texts: &[&[&str]]) -> ReportDocument {
        let pages = texts
            .iter()
            .map(|lines| Page {
                lines: lines
                    .iter()
                    .enumerate()
                    .map(|(i, text)| DrawnLine {
                        x: 40.0,
                        y: 801.89 - 14.0 * i as f32,
                        font: Font::Helvetica,
                        size: 10.0,
                        text: text.to_string(),
                    })
                    .collect(),
            })
            .collect();
        ReportDocument {
            geometry: PageGeometry::A4,
            pages,
        }
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_header_and_trailer() {
        let bytes = document(&[&["hello"]]).to_pdf_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        let text = as_text(&bytes);
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/BaseFont /Helvetica-Bold "));
        assert!(text.contains("(hello) Tj"));
    }

    #[test]
    fn test_page_count_matches_document() {
        let bytes = document(&[&["one"], &["two"], &["three"]])
            .to_pdf_bytes()
            .unwrap();
        let text = as_text(&bytes);
        assert!(text.contains("/Count 3"));
        assert_eq!(text.matches("/Type /Page ").count(), 3);
        assert!(text.contains("/Kids [5 0 R 7 0 R 9 0 R]"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let bytes = document(&[&["a"], &["b"]]).to_pdf_bytes().unwrap();
        let xref_start = bytes.windows(5).position(|w| w == b"xref\n").unwrap();
        let tail = std::str::from_utf8(&bytes[xref_start..]).unwrap();
        let entries: Vec<usize> = tail
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert_eq!(entries.len(), 8);
        for (i, offset) in entries.iter().enumerate() {
            let expected = format!("{} 0 obj", i + 1);
            assert!(bytes[*offset..].starts_with(expected.as_bytes()), "object {}", i + 1);
        }
    }

    #[test]
    fn test_parentheses_and_backslashes_escaped() {
        assert_eq!(escape_text("f(x) \\ y"), b"f\\(x\\) \\\\ y".to_vec());
    }

    #[test]
    fn test_non_ascii_encoded_as_octal() {
        assert_eq!(escape_text("20\u{00B0}C"), b"20\\260C".to_vec());
        assert_eq!(escape_text("it\u{2019}s"), b"it\\222s".to_vec());
        assert_eq!(escape_text("\u{4E2D}"), b"?".to_vec());
    }
}
