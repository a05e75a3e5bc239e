//! Transcript export to a paginated PDF.
//!
//! ```text
//! [Turn] ──render──▶ [Page] ──to_pdf──▶ bytes ──▶ <dir>/<document>_chat.pdf
//!          │
//!          └─ wrap_text (TextMeasure) per line
//! ```
//!
//! Export is read-only with respect to the session: callers hand over a
//! snapshot of the transcript.

pub mod measure;
pub mod paginate;
pub mod pdf;
pub mod wrap;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ExportConfig;
use crate::transcript::Turn;

pub use measure::{MonospaceMeasure, TextMeasure};
pub use paginate::{render, LineStyle, Page, PageLine};
pub use pdf::to_pdf;
pub use wrap::wrap_text;

const FALLBACK_FILENAME: &str = "chat_transcript.pdf";

#[derive(Debug, Error)]
pub enum ExportError {
    /// The transcript has no turn worth writing.
    #[error("nothing to export")]
    NothingToExport,

    #[error("cannot write export: {0}")]
    Io(#[from] std::io::Error),
}

/// File name for an export of the document labelled `label`.
///
/// The label's extension is dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`: `"report.pdf"` → `"report_chat.pdf"`.
pub fn export_filename(label: Option<&str>) -> String {
    let stem = label
        .map(|l| Path::new(l.trim()))
        .and_then(Path::file_stem)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches(|c| c == '.' || c == '_');

    if sanitized.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        format!("{sanitized}_chat.pdf")
    }
}

/// Render `turns` and write the PDF into `dir`, creating it if needed.
///
/// Returns the path of the written file.  An existing export of the same
/// document is overwritten.
///
/// # Errors
///
/// * [`ExportError::NothingToExport`] when `turns` has no exportable turn;
///   nothing is created on disk in that case.
/// * [`ExportError::Io`] when the directory or file cannot be written.
pub fn export_to_dir(
    turns: &[Turn],
    document_label: Option<&str>,
    layout: &ExportConfig,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let pages = render(turns, document_label, layout, &MonospaceMeasure::COURIER)?;
    let bytes = to_pdf(&pages, layout);

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(document_label));
    std::fs::write(&path, bytes)?;

    log::debug!("export: {} page(s) → {}", pages.len(), path.display());
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_derived_from_document_label() {
        assert_eq!(export_filename(Some("report.pdf")), "report_chat.pdf");
        assert_eq!(export_filename(Some("Q3 results.docx")), "Q3_results_chat.pdf");
        assert_eq!(export_filename(Some("archive.tar.gz")), "archive.tar_chat.pdf");
    }

    #[test]
    fn filename_falls_back_without_usable_label() {
        assert_eq!(export_filename(None), "chat_transcript.pdf");
        assert_eq!(export_filename(Some("")), "chat_transcript.pdf");
        assert_eq!(export_filename(Some("  ")), "chat_transcript.pdf");
        assert_eq!(export_filename(Some("日本.pdf")), "chat_transcript.pdf");
    }

    #[test]
    fn export_writes_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("exports");
        let turns = [Turn::user("What is X?"), Turn::assistant("X is Y.")];

        let path = export_to_dir(&turns, Some("report.pdf"), &ExportConfig::default(), &out)
            .unwrap();

        assert_eq!(path, out.join("report_chat.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("(What is X?) Tj"));
        assert!(text.contains("(X is Y.) Tj"));
    }

    #[test]
    fn empty_export_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");

        let err = export_to_dir(&[], Some("doc"), &ExportConfig::default(), &out).unwrap_err();

        assert!(matches!(err, ExportError::NothingToExport));
        assert!(!out.exists());
    }

    #[test]
    fn unwritable_target_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let err = export_to_dir(
            &[Turn::user("q")],
            None,
            &ExportConfig::default(),
            &blocker.join("sub"),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }

    fn body_lines(pages: &[Page]) -> Vec<&str> {
        pages
            .iter()
            .flat_map(|p| &p.lines)
            .filter(|l| l.style == LineStyle::Body)
            .map(|l| l.text.as_str())
            .collect()
    }

    #[test]
    fn combining_marks_wrap_by_emitted_glyphs() {
        let layout = ExportConfig::default();
        let max_cols = ((layout.page_width - 2.0 * layout.margin_x)
            / (MonospaceMeasure::COURIER.advance_em * layout.font_size))
            .floor() as usize;
        let text = "e\u{301}".repeat(60);

        let pages = render(
            &[Turn::assistant(text.clone())],
            None,
            &layout,
            &MonospaceMeasure::COURIER,
        )
        .unwrap();

        let lines = body_lines(&pages);
        assert!(lines.len() > 1);
        for line in &lines {
            // One Courier glyph per char in the written PDF.
            assert!(line.chars().count() <= max_cols, "{} glyphs", line.chars().count());
        }
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn glyphs_outside_winansi_fill_the_line() {
        let layout = ExportConfig::default();
        let max_cols = ((layout.page_width - 2.0 * layout.margin_x)
            / (MonospaceMeasure::COURIER.advance_em * layout.font_size))
            .floor() as usize;

        let pages = render(
            &[Turn::assistant("日".repeat(100))],
            None,
            &layout,
            &MonospaceMeasure::COURIER,
        )
        .unwrap();

        let lines = body_lines(&pages);
        assert_eq!(lines[0].chars().count(), max_cols);
        assert_eq!(lines[1].chars().count(), 100 - max_cols);
    }
}
