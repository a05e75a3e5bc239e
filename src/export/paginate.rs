//! Lay a transcript out onto fixed-size pages.
//!
//! Every turn becomes a bold speaker label ("You" / "AI") followed by its
//! wrapped content, then a fixed gap.  A vertical cursor runs down the page;
//! when the next line would cross the bottom margin a new page starts and
//! the cursor returns to the top margin.  The first page opens with a title
//! built from the document label.

use crate::config::ExportConfig;
use crate::transcript::Turn;

use super::measure::TextMeasure;
use super::wrap::wrap_text;
use super::ExportError;

/// Title used when no document is active.
pub const UNTITLED_DOCUMENT: &str = "Untitled document";

// ---------------------------------------------------------------------------
// Page model
// ---------------------------------------------------------------------------

/// How a line is typeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Bold, title size.
    Title,
    /// Bold, body size.
    Label,
    /// Regular, body size.
    Body,
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLine {
    pub text: String,
    pub style: LineStyle,
    /// Distance of the baseline from the top edge of the page, in points.
    pub baseline: f32,
}

/// A fixed-height canvas of positioned lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PageLine>,
}

impl Page {
    /// Line texts in top-to-bottom order.
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Paginator
// ---------------------------------------------------------------------------

struct Paginator<'a> {
    layout: &'a ExportConfig,
    measure: &'a dyn TextMeasure,
    pages: Vec<Page>,
    current: Page,
    cursor: f32,
}

impl<'a> Paginator<'a> {
    fn new(layout: &'a ExportConfig, measure: &'a dyn TextMeasure) -> Self {
        Self {
            layout,
            measure,
            pages: Vec::new(),
            current: Page::default(),
            cursor: layout.margin_y,
        }
    }

    fn max_width(&self) -> f32 {
        self.layout.page_width - 2.0 * self.layout.margin_x
    }

    fn bottom(&self) -> f32 {
        self.layout.page_height - self.layout.margin_y
    }

    /// Place one line at the cursor, breaking the page first if it would
    /// not fit.  A line taller than an empty page is still placed.
    fn emit(&mut self, text: String, style: LineStyle) {
        let (font_size, advance) = match style {
            LineStyle::Title => (self.layout.title_font_size, self.layout.title_font_size * 1.25),
            LineStyle::Label | LineStyle::Body => (self.layout.font_size, self.layout.line_height),
        };

        let page_has_lines = !self.current.lines.is_empty();
        if page_has_lines && self.cursor + advance > self.bottom() {
            self.pages.push(std::mem::take(&mut self.current));
            self.cursor = self.layout.margin_y;
        }

        self.current.lines.push(PageLine {
            text,
            style,
            baseline: self.cursor + font_size,
        });
        self.cursor += advance;
    }

    fn emit_wrapped(&mut self, text: &str, style: LineStyle) {
        let font_size = match style {
            LineStyle::Title => self.layout.title_font_size,
            LineStyle::Label | LineStyle::Body => self.layout.font_size,
        };
        for line in wrap_text(text, self.max_width(), font_size, self.measure) {
            self.emit(line, style);
        }
    }

    fn gap(&mut self, amount: f32) {
        self.cursor += amount;
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.lines.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

/// Lay `turns` out onto pages.
///
/// Placeholder turns are skipped: an in-flight indicator never appears in
/// an export.
///
/// # Errors
///
/// [`ExportError::NothingToExport`] when no turn is left to render.
pub fn render(
    turns: &[Turn],
    document_label: Option<&str>,
    layout: &ExportConfig,
    measure: &dyn TextMeasure,
) -> Result<Vec<Page>, ExportError> {
    let exportable: Vec<&Turn> = turns.iter().filter(|t| !t.is_placeholder).collect();
    if exportable.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut paginator = Paginator::new(layout, measure);

    let label = document_label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(UNTITLED_DOCUMENT);
    paginator.emit_wrapped(&format!("Chat transcript: {label}"), LineStyle::Title);
    paginator.gap(layout.turn_gap);

    for turn in exportable {
        paginator.emit(turn.speaker.label().to_string(), LineStyle::Label);
        paginator.emit_wrapped(&turn.content, LineStyle::Body);
        paginator.gap(layout.turn_gap);
    }

    Ok(paginator.finish())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
