//! Minimal PDF 1.4 writer for laid-out pages.
//!
//! Output uses only the standard Type 1 fonts Courier (body) and
//! Courier-Bold (title and speaker labels), so nothing is embedded:
//!
//! ```text
//!   1  Catalog
//!   2  Pages  ── Kids ──► 5, 7, 9 …
//!   3  Font /F1 Courier
//!   4  Font /F2 Courier-Bold
//!   5  Page ── Contents ──► 6  (content stream)
//!   7  Page ── Contents ──► 8
//!   …
//!   xref / trailer / startxref / %%EOF
//! ```
//!
//! Text is encoded as WinAnsi with bytes above 0x7F written as octal
//! escapes, so the whole file is ASCII.  Characters outside WinAnsi are
//! written as `?`.

use std::fmt::Write as _;

use crate::config::ExportConfig;

use super::paginate::{LineStyle, Page};

const FIRST_PAGE_OBJECT: usize = 5;

/// Serialise `pages` into a complete PDF document.
pub fn to_pdf(pages: &[Page], layout: &ExportConfig) -> Vec<u8> {
    let mut writer = PdfWriter::default();
    writer.raw(b"%PDF-1.4\n");

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * i))
        .collect();

    writer.object(1, b"<< /Type /Catalog /Pages 2 0 R >>");
    writer.object(
        2,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );
    writer.object(
        3,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>",
    );
    writer.object(
        4,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Courier-Bold /Encoding /WinAnsiEncoding >>",
    );

    for (i, page) in pages.iter().enumerate() {
        let page_id = FIRST_PAGE_OBJECT + 2 * i;
        let content_id = page_id + 1;

        writer.object(
            page_id,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                number(layout.page_width),
                number(layout.page_height),
                content_id
            )
            .as_bytes(),
        );

        let stream = content_stream(page, layout);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        writer.object(content_id, &body);
    }

    writer.finish()
}

// ---------------------------------------------------------------------------
// Object and xref bookkeeping
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PdfWriter {
    out: Vec<u8>,
    /// Byte offset of each object, indexed by object number - 1.
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    /// Objects must be written in ascending id order starting at 1.
    fn object(&mut self, id: usize, body: &[u8]) {
        debug_assert_eq!(id, self.offsets.len() + 1);
        self.offsets.push(self.out.len());
        self.raw(format!("{id} 0 obj\n").as_bytes());
        self.raw(body);
        self.raw(b"\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_at = self.out.len();
        let count = self.offsets.len() + 1;

        // Each xref entry is exactly 20 bytes including the EOL.
        let mut xref = format!("xref\n0 {count}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            let _ = write!(xref, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {count} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n"
        );
        self.raw(xref.as_bytes());
        self.out
    }
}

// ---------------------------------------------------------------------------
// Content streams
// ---------------------------------------------------------------------------

fn content_stream(page: &Page, layout: &ExportConfig) -> Vec<u8> {
    let mut stream = Vec::new();
    for line in &page.lines {
        if line.text.is_empty() {
            continue;
        }
        let (font, size) = match line.style {
            LineStyle::Title => ("F2", layout.title_font_size),
            LineStyle::Label => ("F2", layout.font_size),
            LineStyle::Body => ("F1", layout.font_size),
        };
        // PDF user space has its origin at the bottom-left corner.
        let y = layout.page_height - line.baseline;

        stream.extend_from_slice(
            format!(
                "BT /{font} {} Tf {} {} Td (",
                number(size),
                number(layout.margin_x),
                number(y)
            )
            .as_bytes(),
        );
        stream.extend_from_slice(&encode_text(&line.text));
        stream.extend_from_slice(b") Tj ET\n");
    }
    stream
}

/// Format a coordinate with at most two decimals and no trailing zeros.
fn number(value: f32) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Encode `text` as the body of a PDF literal string in WinAnsi.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match winansi(ch) {
            Some(b'(') => out.extend_from_slice(b"\\("),
            Some(b')') => out.extend_from_slice(b"\\)"),
            Some(b'\\') => out.extend_from_slice(b"\\\\"),
            Some(b) if b >= 0x80 => out.extend_from_slice(format!("\\{b:03o}").as_bytes()),
            Some(b) => out.push(b),
            None => out.push(b'?'),
        }
    }
    out
}

/// Map a character to its WinAnsiEncoding byte.
fn winansi(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x09 => Some(b' '),
        0x20..=0x7E => Some(code as u8),
        0xA0..=0xFF => Some(code as u8),
        _ => match ch {
            '€' => Some(0x80),
            '‚' => Some(0x82),
            'ƒ' => Some(0x83),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '†' => Some(0x86),
            '‡' => Some(0x87),
            'ˆ' => Some(0x88),
            '‰' => Some(0x89),
            'Š' => Some(0x8A),
            '‹' => Some(0x8B),
            'Œ' => Some(0x8C),
            'Ž' => Some(0x8E),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '˜' => Some(0x98),
            '™' => Some(0x99),
            'š' => Some(0x9A),
            '›' => Some(0x9B),
            'œ' => Some(0x9C),
            'ž' => Some(0x9E),
            'Ÿ' => Some(0x9F),
            _ => None,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::paginate::PageLine;

    fn page(lines: &[(&str, LineStyle)]) -> Page {
        Page {
            lines: lines
                .iter()
                .enumerate()
                .map(|(i, (text, style))| PageLine {
                    text: text.to_string(),
                    style: *style,
                    baseline: 60.0 + 14.0 * i as f32,
                })
                .collect(),
        }
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn document_has_header_trailer_and_page_count() {
        let pages = vec![
            page(&[("Chat transcript: doc", LineStyle::Title)]),
            page(&[("AI", LineStyle::Label), ("more", LineStyle::Body)]),
        ];
        let pdf = to_pdf(&pages, &ExportConfig::default());
        let text = as_text(&pdf);

        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/Count 2"));
        assert!(text.contains("/Kids [5 0 R 7 0 R]"));
        assert!(text.contains("/BaseFont /Courier "));
        assert!(text.contains("/BaseFont /Courier-Bold "));
        assert!(text.contains("(Chat transcript: doc) Tj"));
        assert!(text.contains("(more) Tj"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let pages = vec![page(&[("You", LineStyle::Label), ("hi", LineStyle::Body)])];
        let pdf = to_pdf(&pages, &ExportConfig::default());
        let text = as_text(&pdf);

        let startxref = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let xref_at: usize = text[startxref..].lines().next().unwrap().parse().unwrap();
        assert!(text[xref_at..].starts_with("xref\n0 7\n"));

        let entries: Vec<&str> = text[xref_at..].lines().skip(3).take(6).collect();
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(
                text[offset..].starts_with(&format!("{} 0 obj", i + 1)),
                "object {} not at {offset}",
                i + 1
            );
        }
    }

    #[test]
    fn labels_are_bold_and_body_is_regular() {
        let pages = vec![page(&[("You", LineStyle::Label), ("hi", LineStyle::Body)])];
        let text = as_text(&to_pdf(&pages, &ExportConfig::default()));

        assert!(text.contains("BT /F2 11 Tf 40 "));
        assert!(text.contains("BT /F1 11 Tf 40 "));
    }

    #[test]
    fn baseline_is_flipped_to_pdf_space() {
        let layout = ExportConfig::default();
        let pages = vec![page(&[("x", LineStyle::Body)])];
        let text = as_text(&to_pdf(&pages, &layout));

        let expected_y = number(layout.page_height - 60.0);
        assert!(text.contains("Td (x) Tj"));
        assert!(text.contains(&format!("40 {expected_y} Td")));
    }

    #[test]
    fn literal_strings_are_escaped() {
        assert_eq!(encode_text(r"f(x) \ y"), br"f\(x\) \\ y".to_vec());
    }

    #[test]
    fn non_ascii_uses_winansi_octal_or_question_mark() {
        assert_eq!(encode_text("é"), b"\\351".to_vec());
        assert_eq!(encode_text("“hi”"), b"\\223hi\\224".to_vec());
        assert_eq!(encode_text("日"), b"?".to_vec());
    }

    #[test]
    fn number_trims_trailing_zeros() {
        assert_eq!(number(40.0), "40");
        assert_eq!(number(595.28), "595.28");
        assert_eq!(number(11.5), "11.5");
        assert_eq!(number(0.0), "0");
    }

    #[test]
    fn empty_lines_emit_no_text_operator() {
        let pages = vec![page(&[("", LineStyle::Body)])];
        let text = as_text(&to_pdf(&pages, &ExportConfig::default()));
        assert!(!text.contains("Tj"));
    }
}
