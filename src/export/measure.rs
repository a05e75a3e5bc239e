//! Text measurement in rendering units (PDF points).

/// Measures how wide a run of text renders at a given font size.
///
/// Wrapping goes through this trait so a proportional-font metric can be
/// dropped in without touching the paginator.
pub trait TextMeasure {
    fn width(&self, text: &str, font_size: f32) -> f32;
}

/// Fixed-advance metric for monospace fonts.
///
/// The PDF writer emits exactly one glyph per `char`: combining marks and
/// zero-width characters included, and anything outside WinAnsi as a
/// single `?`.  Width is therefore the `char` count times the per-glyph
/// advance.  Courier's advance is 600/1000 em, so
/// [`MonospaceMeasure::COURIER`] matches the exported page exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    /// Glyph advance as a fraction of the font size.
    pub advance_em: f32,
}

impl MonospaceMeasure {
    pub const COURIER: Self = Self { advance_em: 0.6 };
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self::COURIER
    }
}

impl TextMeasure for MonospaceMeasure {
    fn width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * self.advance_em * font_size
    }
}
